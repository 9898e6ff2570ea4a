//! Session memory, history and generated images.
//!
//! Memory is a multimap: the same key may hold several values unless an
//! update asked to replace them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ids::SessionId;
use crate::value_objects::HistoryEntry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryFact {
    pub key: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
}

/// Collapse facts into key -> value, later facts winning.
pub fn memory_snapshot(facts: &[MemoryFact]) -> BTreeMap<String, String> {
    let mut ordered: Vec<&MemoryFact> = facts.iter().collect();
    ordered.sort_by_key(|f| f.created_at);
    ordered
        .into_iter()
        .map(|f| (f.key.clone(), f.value.clone()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChronicleEntry {
    pub session_id: SessionId,
    pub summary: String,
    pub timestamp: DateTime<Utc>,
}

impl ChronicleEntry {
    /// Use the narrator's timestamp when it parses, `now` otherwise.
    pub fn from_history(session_id: SessionId, entry: &HistoryEntry, now: DateTime<Utc>) -> Self {
        let timestamp = entry
            .timestamp
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or(now);
        Self {
            session_id,
            summary: entry.summary.clone(),
            timestamp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionImage {
    pub session_id: SessionId,
    pub prompt_id: String,
    pub image_url: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
