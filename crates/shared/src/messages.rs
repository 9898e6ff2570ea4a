//! Real-time messages
//!
//! Every frame is a JSON object `{"event": "<name>", "data": {...}}`. Event
//! names are snake_case, payload fields camelCase.

use rollcall_domain::{ActionRecord, DiceRollResult, NarratorOutcome, ParticipantRole};
use serde::{Deserialize, Serialize};

use crate::types::{ConnectedUserData, DiceRollRequestData, ProtocolError};

// =============================================================================
// Client Messages (client -> engine)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    /// Join a session; the engine decides the effective role
    JoinSession {
        session_id: String,
        #[serde(default)]
        user_id: Option<String>,
        #[serde(default)]
        player_name: Option<String>,
        #[serde(default)]
        mode: ParticipantRole,
    },
    UpdatePlayerName {
        session_id: String,
        player_name: String,
    },
    LeaveSession {
        session_id: String,
    },
    /// Unicast snapshot of who is connected
    RequestUsersList {
        session_id: String,
    },
    SubmitAction {
        session_id: String,
        /// Ignored in favour of the connection's bound identity
        #[serde(default)]
        user_id: Option<String>,
        #[serde(default)]
        character_id: Option<String>,
        action: String,
        dice: DiceRollResult,
        #[serde(default)]
        context: Option<serde_json::Value>,
    },
    /// Master asks one player to roll
    RequestDiceRoll {
        session_id: String,
        #[serde(default)]
        requested_for: Option<String>,
        formula: String,
        #[serde(default)]
        target: Option<i32>,
        #[serde(default)]
        context: Option<String>,
    },
    /// Addressed player reports the result
    DiceRollCompleted {
        request_id: String,
        session_id: String,
        result: DiceRollResult,
    },
    /// Generic "please refresh" signal relayed to the whole session
    RequestUpdate {
        session_id: String,
        #[serde(rename = "type")]
        update_type: String,
    },
    Heartbeat,
}

impl ClientMessage {
    /// Decode a text frame.
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Event name, for logging.
    pub fn event_name(&self) -> &'static str {
        match self {
            ClientMessage::JoinSession { .. } => "join_session",
            ClientMessage::UpdatePlayerName { .. } => "update_player_name",
            ClientMessage::LeaveSession { .. } => "leave_session",
            ClientMessage::RequestUsersList { .. } => "request_users_list",
            ClientMessage::SubmitAction { .. } => "submit_action",
            ClientMessage::RequestDiceRoll { .. } => "request_dice_roll",
            ClientMessage::DiceRollCompleted { .. } => "dice_roll_completed",
            ClientMessage::RequestUpdate { .. } => "request_update",
            ClientMessage::Heartbeat => "heartbeat",
        }
    }
}

// =============================================================================
// Server Messages (engine -> client)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    /// Sent to the joining connection with its effective role
    JoinedSession {
        session_id: String,
        mode: ParticipantRole,
    },
    ConnectedUsersList {
        users: Vec<ConnectedUserData>,
    },
    /// Also sent after a display-name change
    UserJoined {
        user_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        player_name: Option<String>,
        mode: ParticipantRole,
        connected_at: String,
    },
    UserLeft {
        user_id: String,
    },
    ActionResult {
        action: Box<ActionRecord>,
        narrator_response: Box<NarratorOutcome>,
        submitted_by: String,
    },
    ActionSubmitted {
        success: bool,
    },
    Error {
        message: String,
    },
    DiceRollRequested(DiceRollRequestData),
    DiceRollCompleted(DiceRollRequestData),
    UpdateRequested {
        #[serde(rename = "type")]
        update_type: String,
        requested_by: String,
    },
    /// Broadcast when a user's master authority changes
    UserModeUpdated {
        user_id: String,
        mode: ParticipantRole,
    },
    /// Sent to each affected connection of that user
    ModeChanged {
        mode: ParticipantRole,
    },
    Pong,
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }

    pub fn event_name(&self) -> &'static str {
        match self {
            ServerMessage::JoinedSession { .. } => "joined_session",
            ServerMessage::ConnectedUsersList { .. } => "connected_users_list",
            ServerMessage::UserJoined { .. } => "user_joined",
            ServerMessage::UserLeft { .. } => "user_left",
            ServerMessage::ActionResult { .. } => "action_result",
            ServerMessage::ActionSubmitted { .. } => "action_submitted",
            ServerMessage::Error { .. } => "error",
            ServerMessage::DiceRollRequested(_) => "dice_roll_requested",
            ServerMessage::DiceRollCompleted(_) => "dice_roll_completed",
            ServerMessage::UpdateRequested { .. } => "update_requested",
            ServerMessage::UserModeUpdated { .. } => "user_mode_updated",
            ServerMessage::ModeChanged { .. } => "mode_changed",
            ServerMessage::Pong => "pong",
        }
    }
}
