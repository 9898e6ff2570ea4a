//! Domain entities

mod action;
mod chronicle;
mod dice_roll_request;
mod session_master;

pub use action::ActionRecord;
pub use chronicle::{memory_snapshot, ChronicleEntry, MemoryFact, SessionImage};
pub use dice_roll_request::{DiceCompletionError, DiceRollRequest, DiceRollStatus};
pub use session_master::{
    plan_demotion, plan_promotion, plan_renunciation, AuthorityViolation, PromotionPlan,
    RevocationPlan, SessionMaster,
};
