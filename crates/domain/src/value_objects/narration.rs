//! Structured narrator outcomes
//!
//! The narrator collaborator answers in snake_case JSON; these types mirror
//! that schema and are forwarded to clients unchanged. Every collection
//! defaults to empty so partial answers still deserialize.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::DiceRollResult;

/// Classification of how an action resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    CriticalSuccess,
    #[default]
    Success,
    Partial,
    Failure,
    CriticalFailure,
}

impl OutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::CriticalSuccess => "critical_success",
            OutcomeKind::Success => "success",
            OutcomeKind::Partial => "partial",
            OutcomeKind::Failure => "failure",
            OutcomeKind::CriticalFailure => "critical_failure",
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rough category of a free-text action, used to steer narration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Combat,
    Dialogue,
    Exploration,
    Item,
    Other,
}

const COMBAT_KEYWORDS: &[&str] = &[
    "attack", "strike", "sword", "weapon", "damage", "fight", "battle", "defend", "dodge",
    "block", "shoot", "stab",
];
const DIALOGUE_KEYWORDS: &[&str] = &[
    "talk", "say", "ask", "speak", "negotiate", "persuade", "intimidate", "convince", "tell",
];
const EXPLORATION_KEYWORDS: &[&str] = &[
    "search", "investigate", "examine", "explore", "walk", "climb", "descend", "open", "close",
    "enter", "leave", "look",
];
const ITEM_KEYWORDS: &[&str] = &[
    "pick up", "take", "collect", "use", "equip", "item", "object", "find", "found",
];

impl ActionKind {
    /// Keyword classification; first matching category wins, in the order
    /// combat, dialogue, exploration, item.
    pub fn classify(action: &str) -> Self {
        let lower = action.to_lowercase();
        let hit = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));
        if hit(COMBAT_KEYWORDS) {
            ActionKind::Combat
        } else if hit(DIALOGUE_KEYWORDS) {
            ActionKind::Dialogue
        } else if hit(EXPLORATION_KEYWORDS) {
            ActionKind::Exploration
        } else if hit(ITEM_KEYWORDS) {
            ActionKind::Item
        } else {
            ActionKind::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Combat => "combat",
            ActionKind::Dialogue => "dialogue",
            ActionKind::Exploration => "exploration",
            ActionKind::Item => "item",
            ActionKind::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeLine {
    pub level: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeVariants {
    pub level: String,
    #[serde(default)]
    pub variants: Vec<String>,
}

/// Mechanical consequences of an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Mechanics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hp_change: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xp_gain: Option<i64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub resources: BTreeMap<String, i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub status_effects_added: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub status_effects_removed: Vec<String>,
}

/// Request for an illustration of the scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePrompt {
    pub id: String,
    pub prompt: String,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub aspect_ratio: Option<String>,
    #[serde(default)]
    pub negative_tags: Vec<String>,
}

/// Presentation hint for the play surface (toast, shake, flash...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiAction {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// One line in the session's running history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub summary: String,
    /// RFC 3339 time reported by the narrator; may be absent or malformed
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// A key/value fact the narrator wants remembered for later actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryUpdate {
    pub key: String,
    pub value: String,
    /// Drop existing values for `key` before storing this one
    #[serde(default)]
    pub replace: bool,
}

/// Everything the narrator produced for one action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct NarratorOutcome {
    #[serde(default)]
    pub outcome: OutcomeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dice: Option<DiceRollResult>,
    #[serde(default)]
    pub narratives: Vec<NarrativeLine>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub narrative_variants: Vec<NarrativeVariants>,
    #[serde(default)]
    pub mechanics: Mechanics,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_prompts: Vec<ImagePrompt>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ui_actions: Vec<UiAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_character_sheet: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_entry: Option<HistoryEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub memory_updates: Vec<MemoryUpdate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gm_tips: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub next_scene_hooks: Vec<String>,
    #[serde(
        default,
        rename = "locationContext",
        skip_serializing_if = "Option::is_none"
    )]
    pub location_context: Option<serde_json::Value>,
}

const FALLBACK_NARRATIVE: &str = "Action resolved.";

impl NarratorOutcome {
    /// Deterministic outcome used when the narrator cannot answer.
    ///
    /// Classification looks only at the natural die: 20 is a critical
    /// success, 1 a critical failure, anything else (or no natural) a success.
    pub fn fallback(action: &str, dice: &DiceRollResult) -> Self {
        let outcome = if dice.is_natural_twenty() {
            OutcomeKind::CriticalSuccess
        } else if dice.is_natural_one() {
            OutcomeKind::CriticalFailure
        } else {
            OutcomeKind::Success
        };

        let text = match action.trim() {
            "" => FALLBACK_NARRATIVE.to_string(),
            trimmed => trimmed.to_string(),
        };

        Self {
            outcome,
            dice: Some(dice.clone()),
            narratives: vec![NarrativeLine {
                level: outcome.as_str().to_string(),
                text,
            }],
            ui_actions: vec![UiAction {
                kind: "toast".to_string(),
                name: "action_result".to_string(),
                duration_ms: 3000,
                target: None,
                priority: Some("medium".to_string()),
                message: Some("Action processed".to_string()),
            }],
            ..Self::default()
        }
    }

    /// First narrative line, if any.
    pub fn headline(&self) -> Option<&str> {
        self.narratives.first().map(|n| n.text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dice(natural: Option<i32>) -> DiceRollResult {
        DiceRollResult {
            roll: natural.unwrap_or(10) + 2,
            formula: "1d20+2".to_string(),
            natural,
            target: None,
        }
    }

    #[test]
    fn fallback_classifies_from_natural_only() {
        assert_eq!(
            NarratorOutcome::fallback("swing", &dice(Some(20))).outcome,
            OutcomeKind::CriticalSuccess
        );
        assert_eq!(
            NarratorOutcome::fallback("swing", &dice(Some(1))).outcome,
            OutcomeKind::CriticalFailure
        );
        assert_eq!(
            NarratorOutcome::fallback("swing", &dice(Some(19))).outcome,
            OutcomeKind::Success
        );
        assert_eq!(
            NarratorOutcome::fallback("swing", &dice(None)).outcome,
            OutcomeKind::Success
        );
    }

    #[test]
    fn fallback_total_of_twenty_is_not_critical() {
        let d = DiceRollResult {
            roll: 20,
            formula: "1d20+5".to_string(),
            natural: Some(15),
            target: None,
        };
        assert_eq!(NarratorOutcome::fallback("x", &d).outcome, OutcomeKind::Success);
    }

    #[test]
    fn fallback_has_single_line_narrative() {
        let out = NarratorOutcome::fallback("  I open the door ", &dice(Some(5)));
        assert_eq!(out.narratives.len(), 1);
        assert_eq!(out.headline(), Some("I open the door"));

        let empty = NarratorOutcome::fallback("", &dice(Some(5)));
        assert_eq!(empty.headline(), Some("Action resolved."));
    }

    #[test]
    fn partial_outcome_deserializes_with_defaults() {
        let out: NarratorOutcome = serde_json::from_value(serde_json::json!({
            "narratives": [{"level": "success", "text": "The door creaks open."}],
            "memory_updates": [{"key": "current_location", "value": "crypt", "replace": true}],
            "locationContext": {"city": "Vael"}
        }))
        .unwrap();
        assert_eq!(out.outcome, OutcomeKind::Success);
        assert_eq!(out.memory_updates.len(), 1);
        assert!(out.location_context.is_some());
        assert!(out.image_prompts.is_empty());
    }

    #[test]
    fn classifies_actions_by_keyword() {
        assert_eq!(ActionKind::classify("I attack the goblin"), ActionKind::Combat);
        assert_eq!(ActionKind::classify("Ask the innkeeper"), ActionKind::Dialogue);
        assert_eq!(ActionKind::classify("search the room"), ActionKind::Exploration);
        assert_eq!(ActionKind::classify("equip the amulet"), ActionKind::Item);
        assert_eq!(ActionKind::classify("hum a tune"), ActionKind::Other);
    }
}
