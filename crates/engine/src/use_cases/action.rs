//! Submit an action for narration.
//!
//! The narrator is never allowed to swallow an action: when it fails, the
//! deterministic fallback outcome is persisted and returned instead.

use std::collections::BTreeMap;
use std::sync::Arc;

use rollcall_domain::{
    memory_snapshot, ActionKind, ActionRecord, CharacterId, ChronicleEntry, DiceRollResult,
    DomainError, NarratorOutcome, SessionId, SessionImage,
};
use serde_json::{Map, Value};

use crate::infrastructure::ports::{
    ActionRepo, ChronicleRepo, ClockPort, ImageGenPort, ImageRequest, NarrationRequest,
    NarratorPort, RepoError, SessionRepo,
};
use crate::stores::Membership;

/// Memory keys used to fill in a missing location or NPC.
const MEMORY_LOCATION_KEY: &str = "current_location";
const MEMORY_NPC_KEY: &str = "current_npc";

#[derive(Debug, Clone, PartialEq)]
pub struct ActionSubmission {
    pub character_id: Option<String>,
    pub action: String,
    /// Rolled by the client before submitting
    pub dice: DiceRollResult,
    pub context: Option<Value>,
}

pub struct SubmitAction {
    sessions: Arc<dyn SessionRepo>,
    actions: Arc<dyn ActionRepo>,
    chronicle: Arc<dyn ChronicleRepo>,
    narrator: Arc<dyn NarratorPort>,
    image_gen: Option<Arc<dyn ImageGenPort>>,
    clock: Arc<dyn ClockPort>,
}

impl SubmitAction {
    pub fn new(
        sessions: Arc<dyn SessionRepo>,
        actions: Arc<dyn ActionRepo>,
        chronicle: Arc<dyn ChronicleRepo>,
        narrator: Arc<dyn NarratorPort>,
        image_gen: Option<Arc<dyn ImageGenPort>>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            sessions,
            actions,
            chronicle,
            narrator,
            image_gen,
            clock,
        }
    }

    /// Narrate and persist one action on behalf of the connection's bound user.
    pub async fn execute(
        &self,
        membership: &Membership,
        submission: ActionSubmission,
    ) -> Result<ActionRecord, SubmitActionError> {
        if !membership.participant.role.can_act() {
            return Err(SubmitActionError::PresentationCannotAct);
        }
        let action = submission.action.trim().to_string();
        if action.is_empty() {
            return Err(DomainError::validation("Action cannot be empty").into());
        }
        let character_id = match submission
            .character_id
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
        {
            Some(raw) => Some(raw.parse::<CharacterId>()?),
            None => None,
        };

        let session_id = membership.session_id;
        let player_id = membership.participant.user_id.clone();
        if self.sessions.get(session_id).await?.is_none() {
            return Err(SubmitActionError::SessionNotFound);
        }

        let memory = match self.chronicle.load_memory(session_id).await {
            Ok(facts) => memory_snapshot(&facts),
            Err(e) => {
                tracing::warn!(session_id = %session_id, error = %e, "Failed to load session memory");
                BTreeMap::new()
            }
        };
        let context = enhance_context(submission.context, &memory);
        let kind = ActionKind::classify(&action);

        let request = NarrationRequest {
            session_id,
            player_id: player_id.clone(),
            action: action.clone(),
            kind,
            dice: submission.dice.clone(),
            context: context.clone(),
            session_memory: memory,
        };
        let narrative = match self.narrator.narrate(request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(
                    session_id = %session_id,
                    user_id = %player_id,
                    error = %e,
                    "Narrator unavailable, using fallback outcome"
                );
                NarratorOutcome::fallback(&action, &submission.dice)
            }
        };

        let now = self.clock.now();
        let record = ActionRecord::new(
            session_id,
            player_id,
            action,
            submission.dice,
            narrative,
            now,
        )
        .with_character(character_id)
        .with_context(context);
        self.actions.save(&record).await?;

        self.record_chronicle(session_id, &record.narrative).await;

        tracing::info!(
            session_id = %session_id,
            action_id = %record.id,
            kind = kind.as_str(),
            outcome = %record.outcome,
            "Action resolved"
        );
        Ok(record)
    }

    /// Memory, history and images. Failures here are logged; the action
    /// itself is already stored.
    async fn record_chronicle(&self, session_id: SessionId, narrative: &NarratorOutcome) {
        if !narrative.memory_updates.is_empty() {
            if let Err(e) = self
                .chronicle
                .apply_memory_updates(session_id, &narrative.memory_updates)
                .await
            {
                tracing::warn!(session_id = %session_id, error = %e, "Failed to apply memory updates");
            }
        }

        if let Some(history) = &narrative.history_entry {
            let entry = ChronicleEntry::from_history(session_id, history, self.clock.now());
            if let Err(e) = self.chronicle.append_history(&entry).await {
                tracing::warn!(session_id = %session_id, error = %e, "Failed to append history");
            }
        }

        let Some(image_gen) = &self.image_gen else {
            return;
        };
        for prompt in &narrative.image_prompts {
            let request = ImageRequest {
                prompt: prompt.prompt.clone(),
                style: prompt.style.clone(),
                aspect_ratio: prompt.aspect_ratio.clone(),
                negative_tags: prompt.negative_tags.clone(),
            };
            let image = match image_gen.generate(request).await {
                Ok(image) => image,
                Err(e) => {
                    tracing::warn!(
                        session_id = %session_id,
                        prompt_id = %prompt.id,
                        error = %e,
                        "Image generation failed"
                    );
                    continue;
                }
            };
            let stored = SessionImage {
                session_id,
                prompt_id: prompt.id.clone(),
                image_url: image.image_url,
                metadata: image.metadata,
                created_at: self.clock.now(),
            };
            if let Err(e) = self.chronicle.save_image(&stored).await {
                tracing::warn!(session_id = %session_id, prompt_id = %prompt.id, error = %e, "Failed to save image");
            }
        }
    }
}

/// Fill `location` and `npc` from session memory when the client left them out.
///
/// Non-object contexts are passed through untouched.
fn enhance_context(context: Option<Value>, memory: &BTreeMap<String, String>) -> Option<Value> {
    let mut fields = match context {
        Some(Value::Object(fields)) => fields,
        Some(other) => return Some(other),
        None => Map::new(),
    };

    for (field, memory_key) in [("location", MEMORY_LOCATION_KEY), ("npc", MEMORY_NPC_KEY)] {
        let present = fields
            .get(field)
            .and_then(Value::as_str)
            .is_some_and(|v| !v.trim().is_empty());
        if present {
            continue;
        }
        match memory.get(memory_key).filter(|v| !v.trim().is_empty()) {
            Some(remembered) => {
                fields.insert(field.to_string(), Value::String(remembered.clone()));
            }
            None => {
                fields.remove(field);
            }
        }
    }

    (!fields.is_empty()).then_some(Value::Object(fields))
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitActionError {
    #[error("Presentation mode cannot submit actions")]
    PresentationCannotAct,
    #[error("Session not found")]
    SessionNotFound,
    #[error("{0}")]
    Invalid(#[from] DomainError),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}
