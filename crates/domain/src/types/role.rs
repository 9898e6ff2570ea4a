//! Participant roles and the role resolution rule
//!
//! A connecting client *requests* a role; the server decides the *effective*
//! role. Resolution is split in two steps so the authority lookup (which needs
//! I/O) stays outside the domain:
//!
//! 1. [`RoleRequest::plan`] decides whether the request can be answered
//!    immediately, must be rejected, or needs an authority check.
//! 2. [`RolePlan::settle`] turns the authority check outcome into the final role.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::error::DomainError;
use crate::ids::UserId;

/// Role a connection holds inside a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParticipantRole {
    /// Runs the session: requests rolls, sees master controls
    Master,
    /// Submits actions and completes rolls addressed to them
    #[default]
    Player,
    /// Read-only projection/spectator display
    Presentation,
}

impl ParticipantRole {
    pub fn is_master(&self) -> bool {
        matches!(self, ParticipantRole::Master)
    }

    pub fn is_presentation(&self) -> bool {
        matches!(self, ParticipantRole::Presentation)
    }

    /// Presentation connections never submit actions or touch dice requests.
    pub fn can_act(&self) -> bool {
        !self.is_presentation()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantRole::Master => "master",
            ParticipantRole::Player => "player",
            ParticipantRole::Presentation => "presentation",
        }
    }
}

impl fmt::Display for ParticipantRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParticipantRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "master" => Ok(ParticipantRole::Master),
            "player" => Ok(ParticipantRole::Player),
            "presentation" => Ok(ParticipantRole::Presentation),
            other => Err(DomainError::parse(format!("Unknown participant role: '{}'", other))),
        }
    }
}

/// Why a join request cannot be honoured at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoleRejection {
    #[error("User ID required for master mode")]
    MasterRequiresUserId,
}

/// Outcome of asking the authority store whether a user is a master.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorityCheck {
    IsMaster,
    NotMaster,
    /// The lookup itself failed (store unreachable etc.)
    Unavailable,
}

/// A role requested by a connecting client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRequest {
    pub requested: ParticipantRole,
    pub user_id: Option<UserId>,
}

/// First resolution step: what still has to happen before a role is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RolePlan {
    /// Role is known without consulting authority records.
    Granted(ParticipantRole),
    /// Authority records must be consulted for this user.
    CheckAuthority {
        user_id: UserId,
        requested: ParticipantRole,
    },
}

impl RoleRequest {
    pub fn new(requested: ParticipantRole, user_id: Option<UserId>) -> Self {
        Self { requested, user_id }
    }

    /// Decide whether an authority lookup is needed.
    ///
    /// # Errors
    ///
    /// A master request without a user id is rejected.
    pub fn plan(&self) -> Result<RolePlan, RoleRejection> {
        match (self.requested, &self.user_id) {
            (ParticipantRole::Presentation, _) => {
                Ok(RolePlan::Granted(ParticipantRole::Presentation))
            }
            (ParticipantRole::Player, None) => Ok(RolePlan::Granted(ParticipantRole::Player)),
            (ParticipantRole::Master, None) => Err(RoleRejection::MasterRequiresUserId),
            (requested, Some(user_id)) => Ok(RolePlan::CheckAuthority {
                user_id: user_id.clone(),
                requested,
            }),
        }
    }
}

impl RolePlan {
    /// Second resolution step.
    ///
    /// Authority wins over the requested role in both directions: a master
    /// grant upgrades a player request and the absence of one downgrades a
    /// master request. When the lookup fails the requested role is kept.
    pub fn settle(self, check: AuthorityCheck) -> ParticipantRole {
        match self {
            RolePlan::Granted(role) => role,
            RolePlan::CheckAuthority { requested, .. } => match check {
                AuthorityCheck::IsMaster => ParticipantRole::Master,
                AuthorityCheck::NotMaster => ParticipantRole::Player,
                AuthorityCheck::Unavailable => requested,
            },
        }
    }
}
