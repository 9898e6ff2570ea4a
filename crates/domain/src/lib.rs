//! Rollcall domain: sessions, master authority, roles, dice and narration.
//!
//! Pure types and rules. No I/O, no async; clocks and randomness are passed in.

pub mod aggregates;
pub mod entities;
pub mod error;
pub mod ids;
pub mod types;
pub mod value_objects;

pub use aggregates::{Session, SessionStatus};
pub use entities::{
    memory_snapshot, plan_demotion, plan_promotion, plan_renunciation, ActionRecord,
    AuthorityViolation, ChronicleEntry, DiceCompletionError, DiceRollRequest, DiceRollStatus,
    MemoryFact, PromotionPlan, RevocationPlan, SessionImage, SessionMaster,
};
pub use error::DomainError;
pub use ids::{
    ActionId, CampaignId, CharacterId, ConnectionId, DiceRollRequestId, SessionId, UserId,
    ANONYMOUS_USER,
};
pub use types::{AuthorityCheck, ParticipantRole, RolePlan, RoleRejection, RoleRequest};
pub use value_objects::{
    ActionKind, DiceFormula, DiceParseError, DiceRollResult, DisplayName, HistoryEntry,
    ImagePrompt, Mechanics, MemoryUpdate, NarrativeLine, NarratorOutcome, OutcomeKind, RoomCode,
    SessionName, UiAction, ROOM_CODE_ALPHABET, ROOM_CODE_LENGTH,
};
