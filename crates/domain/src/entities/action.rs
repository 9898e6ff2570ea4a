//! Submitted actions and their narrated outcome

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ActionId, CharacterId, SessionId, UserId};
use crate::value_objects::{DiceRollResult, NarratorOutcome, OutcomeKind};

/// One action as it was submitted and resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRecord {
    pub id: ActionId,
    pub session_id: SessionId,
    pub submitted_by: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_id: Option<CharacterId>,
    pub action: String,
    /// Roll the client made before submitting
    pub dice: DiceRollResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
    pub outcome: OutcomeKind,
    pub narrative: NarratorOutcome,
    pub created_at: DateTime<Utc>,
}

impl ActionRecord {
    pub fn new(
        session_id: SessionId,
        submitted_by: UserId,
        action: impl Into<String>,
        dice: DiceRollResult,
        narrative: NarratorOutcome,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ActionId::new(),
            session_id,
            submitted_by,
            character_id: None,
            action: action.into(),
            dice,
            context: None,
            outcome: narrative.outcome,
            narrative,
            created_at: now,
        }
    }

    pub fn with_character(mut self, character_id: Option<CharacterId>) -> Self {
        self.character_id = character_id;
        self
    }

    pub fn with_context(mut self, context: Option<serde_json::Value>) -> Self {
        self.context = context.filter(|c| !c.is_null());
        self
    }
}
