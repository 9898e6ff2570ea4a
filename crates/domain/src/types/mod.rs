//! Shared vocabulary types used by both the domain and the wire protocol.
//!
//! Pure data: no I/O, no async.

mod role;
pub use role::{AuthorityCheck, ParticipantRole, RolePlan, RoleRejection, RoleRequest};
