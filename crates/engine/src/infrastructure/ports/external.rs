//! External service port traits (narrator, image generation).

use std::collections::BTreeMap;

use async_trait::async_trait;
use rollcall_domain::{
    ActionKind, DiceRollResult, NarratorOutcome, ParticipantRole, SessionId, UserId,
};

use super::error::{ImageGenError, NarrationError};

// =============================================================================
// Narration
// =============================================================================

/// Everything the narrator gets to see about one action.
#[derive(Debug, Clone, PartialEq)]
pub struct NarrationRequest {
    pub session_id: SessionId,
    pub player_id: UserId,
    pub action: String,
    pub kind: ActionKind,
    pub dice: DiceRollResult,
    /// Free-form client context, enriched with remembered location/NPC
    pub context: Option<serde_json::Value>,
    pub session_memory: BTreeMap<String, String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NarratorPort: Send + Sync {
    async fn narrate(&self, request: NarrationRequest) -> Result<NarratorOutcome, NarrationError>;
}

// =============================================================================
// Image Generation
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub prompt: String,
    pub style: Option<String>,
    /// "W:H", e.g. "16:9"
    pub aspect_ratio: Option<String>,
    pub negative_tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    /// `data:` URL or remote URL
    pub image_url: String,
    pub metadata: serde_json::Value,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageGenPort: Send + Sync {
    async fn generate(&self, request: ImageRequest) -> Result<GeneratedImage, ImageGenError>;
}

// =============================================================================
// Live role notifications
// =============================================================================

/// Pushes a role change to a user's live connections in a session.
///
/// Best effort: users without a live connection are simply skipped.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoleNotifier: Send + Sync {
    async fn role_changed(&self, session_id: SessionId, user_id: &UserId, role: ParticipantRole);
}
