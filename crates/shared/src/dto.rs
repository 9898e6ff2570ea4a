//! HTTP request/response bodies.

use chrono::{DateTime, Utc};
use rollcall_domain::{Session, SessionMaster, SessionStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Blank strings are treated as absent
    #[serde(default)]
    pub campaign_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSessionRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<SessionStatus>,
}

/// Body of promote-master / demote-master.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterTargetRequest {
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub id: Uuid,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<Uuid>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: SessionStatus,
    pub room_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Session> for SessionResponse {
    fn from(s: &Session) -> Self {
        Self {
            id: s.id().to_uuid(),
            user_id: s.owner_id().to_string(),
            campaign_id: s.campaign_id().map(|c| c.to_uuid()),
            name: s.name().to_string(),
            description: s.description().map(str::to_string),
            status: s.status(),
            room_code: s.room_code().to_string(),
            created_at: s.created_at(),
            updated_at: s.updated_at(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMasterResponse {
    pub session_id: Uuid,
    pub user_id: String,
    pub is_original_creator: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&SessionMaster> for SessionMasterResponse {
    fn from(m: &SessionMaster) -> Self {
        Self {
            session_id: m.session_id.to_uuid(),
            user_id: m.user_id.to_string(),
            is_original_creator: m.is_original_creator,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}
