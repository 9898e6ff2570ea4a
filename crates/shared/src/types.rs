//! Payload types shared by several messages.

use chrono::{DateTime, SecondsFormat, Utc};
use rollcall_domain::{DiceRollRequest, DiceRollResult, DiceRollStatus, ParticipantRole};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Timestamps on the wire: RFC 3339, UTC, millisecond precision.
pub fn wire_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// One entry in `connected_users_list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedUserData {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_name: Option<String>,
    pub mode: ParticipantRole,
    /// RFC 3339
    pub connected_at: String,
}

/// A mediated roll request as broadcast in `dice_roll_requested` and
/// `dice_roll_completed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiceRollRequestData {
    pub id: String,
    pub session_id: String,
    pub requested_by: String,
    pub requested_for: String,
    pub formula: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub status: DiceRollStatus,
    /// RFC 3339
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<DiceRollResult>,
}

impl From<&DiceRollRequest> for DiceRollRequestData {
    fn from(r: &DiceRollRequest) -> Self {
        Self {
            id: r.id.as_str().to_string(),
            session_id: r.session_id.to_string(),
            requested_by: r.requested_by.to_string(),
            requested_for: r.requested_for.to_string(),
            formula: r.formula_text.clone(),
            target: r.target,
            context: r.context.clone(),
            status: r.status,
            created_at: wire_timestamp(r.created_at),
            result: r.result.clone(),
        }
    }
}

/// Failure decoding a client frame.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Invalid message format: {0}")]
    InvalidFormat(#[from] serde_json::Error),
    #[error("Binary frames are not supported")]
    BinaryFrame,
}
