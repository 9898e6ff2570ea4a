//! Validated text newtypes
//!
//! Valid by construction: trimmed, non-empty where required, length bounded.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Maximum length for a session name
const MAX_SESSION_NAME_LENGTH: usize = 255;

/// Maximum length for a participant display name
const MAX_DISPLAY_NAME_LENGTH: usize = 100;

// ============================================================================
// SessionName
// ============================================================================

/// A validated session name (non-empty, <=255 chars, trimmed)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionName(String);

impl SessionName {
    /// Create a new validated session name.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the name is empty after trimming
    /// or longer than 255 characters.
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("Session name cannot be empty"));
        }
        if trimmed.chars().count() > MAX_SESSION_NAME_LENGTH {
            return Err(DomainError::validation(format!(
                "Session name cannot exceed {} characters",
                MAX_SESSION_NAME_LENGTH
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for SessionName {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<SessionName> for String {
    fn from(name: SessionName) -> String {
        name.0
    }
}

// ============================================================================
// DisplayName
// ============================================================================

/// Display name chosen by a connected participant.
///
/// Blank input means "no name": use [`DisplayName::optional`] for client input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("Display name cannot be empty"));
        }
        // Long names are cut rather than rejected; they only label a seat.
        let truncated: String = trimmed.chars().take(MAX_DISPLAY_NAME_LENGTH).collect();
        Ok(Self(truncated))
    }

    /// Blank or missing input yields `None`.
    pub fn optional(name: Option<&str>) -> Option<Self> {
        name.and_then(|n| Self::new(n).ok())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisplayName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for DisplayName {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<DisplayName> for String {
    fn from(name: DisplayName) -> String {
        name.0
    }
}
