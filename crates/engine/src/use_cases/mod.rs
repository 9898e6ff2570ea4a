//! Use cases - User story orchestration.
//!
//! Each module contains use cases for a specific area of play.
//! Use cases orchestrate across ports and stores to fulfill user stories.

pub mod action;
pub mod dice;
pub mod session;

pub use action::{ActionSubmission, SubmitAction, SubmitActionError};
pub use dice::{DiceMediation, DiceRollError, DiceRollInput};
pub use session::SessionUseCases;
