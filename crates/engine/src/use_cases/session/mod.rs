//! Session use cases.
//!
//! Creation, management, master authority and joining a live session.

use std::sync::Arc;

mod create;
mod join;
mod manage;
mod masters;

pub use create::{CreateSession, CreateSessionError, CreateSessionInput, MAX_ROOM_CODE_ATTEMPTS};
pub use join::{JoinRequest, JoinSession, JoinSessionError, Joined};
pub use manage::{ManageSessionError, SessionManagement, SessionUpdate};
pub use masters::{MasterAuthority, MasterAuthorityError};

/// Container for session use cases.
pub struct SessionUseCases {
    pub create: Arc<CreateSession>,
    pub manage: Arc<SessionManagement>,
    pub masters: Arc<MasterAuthority>,
    pub join: Arc<JoinSession>,
}

impl SessionUseCases {
    pub fn new(
        create: Arc<CreateSession>,
        manage: Arc<SessionManagement>,
        masters: Arc<MasterAuthority>,
        join: Arc<JoinSession>,
    ) -> Self {
        Self {
            create,
            manage,
            masters,
            join,
        }
    }
}
