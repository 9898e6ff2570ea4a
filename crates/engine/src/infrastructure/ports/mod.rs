//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Database access (SQLite today)
//! - Narration calls (AI text service)
//! - Image generation
//! - Live role notifications (implemented by the WebSocket layer)
//! - Clock/Random (for testing)

mod error;
mod external;
mod repos;
mod testing;

// =============================================================================
// Repository Ports
// =============================================================================
pub use repos::{ActionRepo, ChronicleRepo, MasterGrantRepo, SessionRepo};

// =============================================================================
// External Service Ports
// =============================================================================
pub use external::{
    GeneratedImage, ImageGenPort, ImageRequest, NarrationRequest, NarratorPort, RoleNotifier,
};

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use repos::{MockActionRepo, MockChronicleRepo, MockMasterGrantRepo, MockSessionRepo};

#[cfg(test)]
pub use external::{MockImageGenPort, MockNarratorPort, MockRoleNotifier};

#[cfg(test)]
pub use testing::{MockClockPort, MockRandomPort};

// =============================================================================
// Testing Ports
// =============================================================================
pub use testing::{ClockPort, RandomPort};

// =============================================================================
// Error Types
// =============================================================================
pub use error::{ImageGenError, NarrationError, RepoError};
