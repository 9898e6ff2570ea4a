use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            pub fn to_uuid(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$name> for Uuid {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|_| DomainError::invalid_id(format!("{}: '{}'", stringify!($name), s)))
            }
        }
    };
}

// Persisted entity IDs
define_id!(SessionId);
define_id!(CampaignId);
define_id!(ActionId);
define_id!(CharacterId);

// Runtime IDs
define_id!(ConnectionId);

/// Placeholder identity for unauthenticated presentation / player joins.
pub const ANONYMOUS_USER: &str = "anonymous";

/// Maximum length accepted for an external user identifier.
const MAX_USER_ID_LENGTH: usize = 128;

/// Identity of a user as asserted by the upstream authentication layer.
///
/// User ids are opaque strings (the auth provider's subject claim), so this is
/// a validated string rather than a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Validate and wrap a user id.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidId` if the id is blank, longer than 128
    /// chars, or the anonymous placeholder (which would dodge same-user
    /// deduplication).
    pub fn new(id: impl AsRef<str>) -> Result<Self, DomainError> {
        let trimmed = id.as_ref().trim();
        if trimmed.is_empty() {
            return Err(DomainError::invalid_id("User id cannot be empty"));
        }
        if trimmed == ANONYMOUS_USER {
            return Err(DomainError::invalid_id(format!(
                "'{}' is reserved and cannot be used as a user id",
                ANONYMOUS_USER
            )));
        }
        if trimmed.len() > MAX_USER_ID_LENGTH {
            return Err(DomainError::invalid_id(format!(
                "User id cannot exceed {} characters",
                MAX_USER_ID_LENGTH
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Wrap an id read back from storage without re-validating it.
    pub fn from_trusted(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The shared anonymous placeholder identity.
    pub fn anonymous() -> Self {
        Self(ANONYMOUS_USER.to_string())
    }

    pub fn is_anonymous(&self) -> bool {
        self.0 == ANONYMOUS_USER
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for UserId {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> String {
        id.0
    }
}

/// Identifier of a mediated dice-roll request.
///
/// Only unique within one process: requests are never persisted, so the id is
/// `dice-<unix millis>-<random suffix>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiceRollRequestId(String);

impl DiceRollRequestId {
    /// Build an id from a creation time and a random suffix supplied by the caller.
    pub fn generate(created_at_millis: i64, suffix: &str) -> Self {
        Self(format!("dice-{}-{}", created_at_millis, suffix))
    }

    /// Wrap an id received from a client.
    pub fn from_client(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DiceRollRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
