//! HTTP client for the AI narration service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use rollcall_domain::{ActionKind, NarratorOutcome};
use serde::Serialize;
use serde_json::Value;

use crate::infrastructure::ports::{NarrationError, NarrationRequest, NarratorPort};

/// Default AI service base URL.
pub const DEFAULT_AI_SERVICE_URL: &str = "http://localhost:4002";

const SYSTEM_PROMPT: &str = "You are the narrator assistant of a live tabletop RPG session. \
Turn each player action and its dice result into a short cinematic narration, suggest \
variations per success level, propose image prompts, character sheet updates and UI \
animation cues, and keep the session memory coherent. Always answer with a single JSON \
object with the fields: outcome (critical_success|success|partial|failure|critical_failure), \
dice, narratives [{level, text}], narrative_variants, mechanics {hp_change, xp_gain, \
resources, status_effects_added, status_effects_removed}, image_prompts [{id, prompt, style, \
aspect_ratio, negative_tags}], ui_actions [{type, name, duration_ms, target, priority, \
message}], updated_character_sheet, history_entry {summary, timestamp}, memory_updates \
[{key, value, replace}], gm_tips, next_scene_hooks and locationContext {city, terrain, \
environment, description} when the location changes.";

/// Client for the narration endpoint of the AI service.
#[derive(Clone)]
pub struct NarratorClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    system_prompt: &'a str,
    user_prompt: String,
    response_format: &'static str,
    temperature: f32,
    max_tokens: u32,
}

impl NarratorClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl NarratorPort for NarratorClient {
    async fn narrate(&self, request: NarrationRequest) -> Result<NarratorOutcome, NarrationError> {
        let body = GenerateRequest {
            system_prompt: SYSTEM_PROMPT,
            user_prompt: build_user_prompt(&request),
            response_format: "json",
            temperature: 0.8,
            max_tokens: 2000,
        };

        let response = self
            .client
            .post(format!("{}/v1/ai/generate", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| NarrationError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(NarrationError::RequestFailed(format!(
                "{}: {}",
                status, error_text
            )));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| NarrationError::InvalidResponse(e.to_string()))?;

        parse_outcome(data)
    }
}

fn instruction_for(kind: ActionKind) -> &'static str {
    match kind {
        ActionKind::Combat => {
            "This is a COMBAT action. Describe damage and consequences; \
             report any hit point change in mechanics.hp_change."
        }
        ActionKind::Dialogue => {
            "This is a DIALOGUE action. Include the NPC's reply and the result of the \
             social interaction; remember important facts in memory_updates."
        }
        ActionKind::Exploration => {
            "This is an EXPLORATION action. Describe what the player sees, hears and \
             discovers; include locationContext if the location changes."
        }
        ActionKind::Item => {
            "This is an ITEM action. Describe the item, its properties and how the \
             player interacts with it."
        }
        ActionKind::Other => "Narrate the action according to the dice result.",
    }
}

fn context_str(context: &Value, key: &str) -> Option<String> {
    match context.get(key)? {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

pub(crate) fn build_user_prompt(request: &NarrationRequest) -> String {
    let dice = &request.dice;
    let mut dice_info = format!("Dice: {}, Result: {}", dice.formula, dice.roll);
    if let Some(natural) = dice.natural {
        dice_info.push_str(&format!(", Natural: {}", natural));
    }
    if let Some(target) = dice.target {
        dice_info.push_str(&format!(", Target: {}", target));
    }

    let mut context_parts = Vec::new();
    if let Some(context) = &request.context {
        for (key, label) in [
            ("location", "Location"),
            ("npc", "NPC"),
            ("target_dc", "Target DC"),
            ("eventType", "Event type"),
        ] {
            if let Some(value) = context_str(context, key) {
                context_parts.push(format!("{}: {}", label, value));
            }
        }
        if context.get("masterEvent").and_then(Value::as_bool) == Some(true) {
            context_parts.push("Event created by the master".to_string());
        }
    }

    let mut prompt = format!(
        "Action type: {}\n{}\n\nPlayer action: {}\n{}",
        request.kind.as_str().to_uppercase(),
        instruction_for(request.kind),
        request.action,
        dice_info
    );
    if !context_parts.is_empty() {
        prompt.push_str(&format!("\nContext: {}", context_parts.join(", ")));
    }
    if !request.session_memory.is_empty() {
        let memory = request
            .session_memory
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect::<Vec<_>>()
            .join("; ");
        prompt.push_str(&format!("\nSession memory: {}", memory));
    }
    prompt.push_str("\n\nAnswer with the complete JSON object described above.");
    prompt
}

/// Decode the service reply.
///
/// Accepts the outcome object itself, a JSON string holding it, or an
/// envelope whose `content` is such a string.
pub(crate) fn parse_outcome(data: Value) -> Result<NarratorOutcome, NarrationError> {
    let data = match data {
        Value::String(text) => serde_json::from_str(&text)
            .map_err(|e| NarrationError::InvalidResponse(e.to_string()))?,
        other => other,
    };

    let data = match data.get("content") {
        Some(Value::String(content)) => serde_json::from_str(content)
            .map_err(|e| NarrationError::InvalidResponse(e.to_string()))?,
        Some(content @ Value::Object(_)) => content.clone(),
        _ => data,
    };

    if !data.is_object() {
        return Err(NarrationError::InvalidResponse(
            "narration is not a JSON object".to_string(),
        ));
    }

    serde_json::from_value(data).map_err(|e| NarrationError::InvalidResponse(e.to_string()))
}
