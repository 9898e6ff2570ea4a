//! Mediated dice-roll requests
//!
//! A master asks one specific player to roll. The request starts `pending`
//! and moves to `submitted` exactly once, when the addressed player reports a
//! result. Requests are never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::{DiceRollRequestId, SessionId, UserId};
use crate::value_objects::{DiceFormula, DiceRollResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiceRollStatus {
    Pending,
    Submitted,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceCompletionError {
    #[error("Dice roll request is for a different session")]
    WrongSession,
    #[error("Dice roll request is addressed to another player")]
    NotAddressee,
    #[error("Dice roll request already completed")]
    AlreadySubmitted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiceRollRequest {
    pub id: DiceRollRequestId,
    pub session_id: SessionId,
    pub requested_by: UserId,
    pub requested_for: UserId,
    pub formula: DiceFormula,
    /// Formula text as the master typed it
    pub formula_text: String,
    pub target: Option<i32>,
    pub context: Option<String>,
    pub status: DiceRollStatus,
    pub created_at: DateTime<Utc>,
    pub result: Option<DiceRollResult>,
}

impl DiceRollRequest {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: DiceRollRequestId,
        session_id: SessionId,
        requested_by: UserId,
        requested_for: UserId,
        formula_text: impl Into<String>,
        formula: DiceFormula,
        target: Option<i32>,
        context: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            session_id,
            requested_by,
            requested_for,
            formula,
            formula_text: formula_text.into(),
            target,
            context: context.filter(|c| !c.trim().is_empty()),
            status: DiceRollStatus::Pending,
            created_at: now,
            result: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == DiceRollStatus::Pending
    }

    /// Record the addressed player's result.
    ///
    /// The completer's bound identity is checked against `requested_for`; a
    /// completion claiming to be someone else never reaches this point.
    pub fn complete(
        mut self,
        session_id: SessionId,
        completer: &UserId,
        result: DiceRollResult,
    ) -> Result<Self, DiceCompletionError> {
        if self.session_id != session_id {
            return Err(DiceCompletionError::WrongSession);
        }
        if &self.requested_for != completer {
            return Err(DiceCompletionError::NotAddressee);
        }
        if self.status == DiceRollStatus::Submitted {
            return Err(DiceCompletionError::AlreadySubmitted);
        }
        self.status = DiceRollStatus::Submitted;
        self.result = Some(result);
        Ok(self)
    }
}
