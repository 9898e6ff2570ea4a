//! In-memory state storage modules.
//!
//! Stores manage runtime state that doesn't belong in the database:
//! - `PresenceRegistry` - who is connected to which session
//! - `PendingDiceRequests` - mediated rolls waiting for a player

pub mod dice;
pub mod presence;

pub use dice::PendingDiceRequests;
pub use presence::{Arrival, Departure, Membership, Participant, PresenceRegistry, RoleChange};
