//! Master-mediated dice rolls.
//!
//! A master asks one player to roll; the player's client rolls and reports
//! back. The engine never rolls itself, it only tracks who asked whom and
//! makes sure each request completes once, by its addressee.

use std::sync::Arc;

use rollcall_domain::{
    DiceCompletionError, DiceFormula, DiceParseError, DiceRollRequest, DiceRollRequestId,
    DiceRollResult, DomainError, UserId,
};

use crate::infrastructure::ports::{ClockPort, RandomPort};
use crate::stores::{Membership, PendingDiceRequests};

/// Length of the random part of a request id.
const REQUEST_ID_SUFFIX_LEN: usize = 9;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiceRollInput {
    pub requested_for: Option<String>,
    pub formula: String,
    pub target: Option<i32>,
    pub context: Option<String>,
}

pub struct DiceMediation {
    pending: Arc<PendingDiceRequests>,
    clock: Arc<dyn ClockPort>,
    random: Arc<dyn RandomPort>,
}

impl DiceMediation {
    pub fn new(
        pending: Arc<PendingDiceRequests>,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
    ) -> Self {
        Self {
            pending,
            clock,
            random,
        }
    }

    /// Open a pending request from the master behind `membership`.
    pub async fn request(
        &self,
        membership: &Membership,
        input: DiceRollInput,
    ) -> Result<DiceRollRequest, DiceRollError> {
        if !membership.participant.role.is_master() {
            return Err(DiceRollError::NotMaster);
        }
        let requested_for = match input.requested_for.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => UserId::new(id)?,
            _ => return Err(DiceRollError::MissingTarget),
        };
        let formula_text = input.formula.trim().to_string();
        let formula = DiceFormula::parse(&formula_text)?;

        let now = self.clock.now();
        let id = DiceRollRequestId::generate(
            now.timestamp_millis(),
            &self.random.gen_suffix(REQUEST_ID_SUFFIX_LEN),
        );
        let request = DiceRollRequest::new(
            id,
            membership.session_id,
            membership.participant.user_id.clone(),
            requested_for,
            formula_text,
            formula,
            input.target,
            input.context,
            now,
        );
        self.pending.insert(request.clone()).await;

        tracing::info!(
            session_id = %request.session_id,
            request_id = %request.id,
            requested_by = %request.requested_by,
            requested_for = %request.requested_for,
            formula = %request.formula_text,
            "Dice roll requested"
        );
        Ok(request)
    }

    /// Complete a pending request. The completer is the connection's bound
    /// user, never an identity taken from the payload.
    pub async fn complete(
        &self,
        membership: &Membership,
        request_id: &str,
        result: DiceRollResult,
    ) -> Result<DiceRollRequest, DiceRollError> {
        if membership.participant.role.is_presentation() {
            return Err(DiceRollError::PresentationCannotRoll);
        }
        let id = DiceRollRequestId::from_client(request_id.trim());
        let pending = self
            .pending
            .get(&id)
            .await
            .ok_or(DiceRollError::UnknownRequest)?;

        let completed = pending.complete(
            membership.session_id,
            &membership.participant.user_id,
            result,
        )?;

        // a concurrent completion may have claimed it since the lookup
        if self.pending.take(&id).await.is_none() {
            return Err(DiceCompletionError::AlreadySubmitted.into());
        }

        tracing::info!(
            session_id = %completed.session_id,
            request_id = %completed.id,
            requested_for = %completed.requested_for,
            "Dice roll completed"
        );
        Ok(completed)
    }

    /// Drop requests nobody answered in time.
    pub async fn purge_expired(&self) -> usize {
        self.pending.purge_expired().await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DiceRollError {
    #[error("Only masters can request dice rolls")]
    NotMaster,
    #[error("requestedFor is required")]
    MissingTarget,
    #[error("Presentation mode cannot complete dice rolls")]
    PresentationCannotRoll,
    #[error("Dice roll request not found or expired")]
    UnknownRequest,
    #[error("{0}")]
    InvalidFormula(#[from] DiceParseError),
    #[error("{0}")]
    Invalid(#[from] DomainError),
    #[error("{0}")]
    Completion(#[from] DiceCompletionError),
}
