//! Session aggregate - one play session with a shareable room code
//!
//! Private fields, validated newtypes, explicit mutators. Status changes are
//! explicit: any listed status can be set by the owner, there is no implicit
//! lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;
use crate::ids::{CampaignId, SessionId, UserId};
use crate::value_objects::{RoomCode, SessionName};

/// Maximum length for a session description
const MAX_DESCRIPTION_LENGTH: usize = 5000;

/// Lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Draft,
    Active,
    Paused,
    Completed,
    Archived,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Draft => "draft",
            SessionStatus::Active => "active",
            SessionStatus::Paused => "paused",
            SessionStatus::Completed => "completed",
            SessionStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(SessionStatus::Draft),
            "active" => Ok(SessionStatus::Active),
            "paused" => Ok(SessionStatus::Paused),
            "completed" => Ok(SessionStatus::Completed),
            "archived" => Ok(SessionStatus::Archived),
            other => Err(DomainError::parse(format!("Unknown session status: '{}'", other))),
        }
    }
}

/// A play session.
///
/// # Invariants
///
/// - `name` is non-empty and <= 255 characters (enforced by `SessionName`)
/// - `room_code` is six characters from the unambiguous alphabet (enforced by `RoomCode`)
/// - `description`, when present, is non-blank and <= 5000 characters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    id: SessionId,
    owner_id: UserId,
    campaign_id: Option<CampaignId>,
    name: SessionName,
    description: Option<String>,
    status: SessionStatus,
    room_code: RoomCode,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Session {
    /// Create a draft session owned by `owner_id`.
    pub fn new(
        owner_id: UserId,
        name: SessionName,
        room_code: RoomCode,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SessionId::new(),
            owner_id,
            campaign_id: None,
            name,
            description: None,
            status: SessionStatus::Draft,
            room_code,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild a session loaded from storage.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: SessionId,
        owner_id: UserId,
        campaign_id: Option<CampaignId>,
        name: SessionName,
        description: Option<String>,
        status: SessionStatus,
        room_code: RoomCode,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner_id,
            campaign_id,
            name,
            description,
            status,
            room_code,
            created_at,
            updated_at,
        }
    }

    // =========================================================================
    // Builder
    // =========================================================================

    pub fn with_campaign(mut self, campaign_id: Option<CampaignId>) -> Self {
        self.campaign_id = campaign_id;
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Result<Self, DomainError> {
        self.description = normalize_description(description)?;
        Ok(self)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[inline]
    pub fn owner_id(&self) -> &UserId {
        &self.owner_id
    }

    #[inline]
    pub fn campaign_id(&self) -> Option<CampaignId> {
        self.campaign_id
    }

    #[inline]
    pub fn name(&self) -> &SessionName {
        &self.name
    }

    #[inline]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[inline]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[inline]
    pub fn room_code(&self) -> &RoomCode {
        &self.room_code
    }

    #[inline]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[inline]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.owner_id == user_id
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    pub fn rename(&mut self, name: SessionName, now: DateTime<Utc>) {
        self.name = name;
        self.updated_at = now;
    }

    /// Blank input clears the description.
    pub fn set_description(
        &mut self,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.description = normalize_description(description)?;
        self.updated_at = now;
        Ok(())
    }

    pub fn set_status(&mut self, status: SessionStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated_at = now;
    }
}

fn normalize_description(description: Option<String>) -> Result<Option<String>, DomainError> {
    match description.map(|d| d.trim().to_string()) {
        None => Ok(None),
        Some(d) if d.is_empty() => Ok(None),
        Some(d) if d.chars().count() > MAX_DESCRIPTION_LENGTH => Err(DomainError::validation(
            format!("Description cannot exceed {} characters", MAX_DESCRIPTION_LENGTH),
        )),
        Some(d) => Ok(Some(d)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()
    }

    fn session() -> Session {
        Session::new(
            UserId::new("owner").unwrap(),
            SessionName::new("The Sunken Keep").unwrap(),
            RoomCode::parse("ABC234").unwrap(),
            fixed_time(),
        )
    }

    #[test]
    fn new_session_is_draft() {
        let s = session();
        assert_eq!(s.status(), SessionStatus::Draft);
        assert!(s.is_owned_by(&UserId::new("owner").unwrap()));
        assert_eq!(s.created_at(), s.updated_at());
    }

    #[test]
    fn any_status_can_be_set() {
        let mut s = session();
        let later = fixed_time() + chrono::Duration::minutes(5);
        s.set_status(SessionStatus::Archived, later);
        assert_eq!(s.status(), SessionStatus::Archived);
        s.set_status(SessionStatus::Active, later);
        assert_eq!(s.status(), SessionStatus::Active);
        assert_eq!(s.updated_at(), later);
    }

    #[test]
    fn blank_description_is_cleared() {
        let s = session().with_description(Some("   ".into())).unwrap();
        assert_eq!(s.description(), None);
        assert!(session()
            .with_description(Some("x".repeat(5001)))
            .is_err());
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            SessionStatus::Draft,
            SessionStatus::Active,
            SessionStatus::Paused,
            SessionStatus::Completed,
            SessionStatus::Archived,
        ] {
            assert_eq!(status.as_str().parse::<SessionStatus>().unwrap(), status);
        }
        assert!("finished".parse::<SessionStatus>().is_err());
    }
}
