use super::test_support::*;
use super::*;

// Common imports used across submodules.
use rollcall_domain::{DiceRollResult, DiceRollStatus, ParticipantRole, Session};

mod actions;
mod dice;
mod presence;
mod roles;
