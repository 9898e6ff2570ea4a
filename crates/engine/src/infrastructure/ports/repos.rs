//! Repository port traits for database access.

use async_trait::async_trait;
use rollcall_domain::{
    ActionRecord, ChronicleEntry, MemoryFact, MemoryUpdate, RoomCode, Session, SessionId,
    SessionImage, SessionMaster, UserId,
};

use super::error::RepoError;

// =============================================================================
// Sessions
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionRepo: Send + Sync {
    /// Insert the session and its original-creator grant in one transaction.
    async fn create_with_creator(
        &self,
        session: &Session,
        creator: &SessionMaster,
    ) -> Result<(), RepoError>;
    async fn get(&self, id: SessionId) -> Result<Option<Session>, RepoError>;
    async fn get_by_room_code(&self, code: &RoomCode) -> Result<Option<Session>, RepoError>;
    async fn room_code_exists(&self, code: &RoomCode) -> Result<bool, RepoError>;
    async fn list_for_owner(&self, owner: &UserId) -> Result<Vec<Session>, RepoError>;
    async fn update(&self, session: &Session) -> Result<(), RepoError>;
    /// Deletes the session and everything hanging off it.
    async fn delete(&self, id: SessionId) -> Result<(), RepoError>;
}

// =============================================================================
// Master authority
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MasterGrantRepo: Send + Sync {
    async fn list(&self, session_id: SessionId) -> Result<Vec<SessionMaster>, RepoError>;
    async fn get(
        &self,
        session_id: SessionId,
        user_id: &UserId,
    ) -> Result<Option<SessionMaster>, RepoError>;
    async fn insert(&self, grant: &SessionMaster) -> Result<(), RepoError>;
    /// Remove a promoted grant. Original-creator rows are never deleted.
    /// Returns whether a row was removed.
    async fn delete_promoted(
        &self,
        session_id: SessionId,
        user_id: &UserId,
    ) -> Result<bool, RepoError>;
    /// Replace every promoted grant of the session with `grant`, atomically.
    /// Returns the users whose grants were removed.
    async fn hand_off(
        &self,
        session_id: SessionId,
        grant: &SessionMaster,
    ) -> Result<Vec<UserId>, RepoError>;
}

// =============================================================================
// Actions
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActionRepo: Send + Sync {
    async fn save(&self, record: &ActionRecord) -> Result<(), RepoError>;
    /// Oldest first.
    async fn list_for_session(&self, session_id: SessionId)
        -> Result<Vec<ActionRecord>, RepoError>;
}

// =============================================================================
// Chronicle (memory, history, images)
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChronicleRepo: Send + Sync {
    async fn load_memory(&self, session_id: SessionId) -> Result<Vec<MemoryFact>, RepoError>;
    /// Apply in order; a `replace` update drops earlier values of its key first.
    async fn apply_memory_updates(
        &self,
        session_id: SessionId,
        updates: &[MemoryUpdate],
    ) -> Result<(), RepoError>;
    async fn append_history(&self, entry: &ChronicleEntry) -> Result<(), RepoError>;
    async fn save_image(&self, image: &SessionImage) -> Result<(), RepoError>;
    /// Ordered by timestamp.
    async fn list_history(&self, session_id: SessionId)
        -> Result<Vec<ChronicleEntry>, RepoError>;
}
