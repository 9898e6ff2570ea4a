//! Session lookups, owner-only edits and read-only logs.

use std::sync::Arc;

use rollcall_domain::{
    ActionRecord, ChronicleEntry, DomainError, MemoryFact, RoomCode, Session, SessionId,
    SessionName, SessionStatus, UserId,
};

use crate::infrastructure::ports::{ActionRepo, ChronicleRepo, ClockPort, RepoError, SessionRepo};

/// Fields of an update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionUpdate {
    pub name: Option<String>,
    /// `Some("")` clears the description
    pub description: Option<String>,
    pub status: Option<SessionStatus>,
}

pub struct SessionManagement {
    sessions: Arc<dyn SessionRepo>,
    actions: Arc<dyn ActionRepo>,
    chronicle: Arc<dyn ChronicleRepo>,
    clock: Arc<dyn ClockPort>,
}

impl SessionManagement {
    pub fn new(
        sessions: Arc<dyn SessionRepo>,
        actions: Arc<dyn ActionRepo>,
        chronicle: Arc<dyn ChronicleRepo>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            sessions,
            actions,
            chronicle,
            clock,
        }
    }

    pub async fn get(&self, id: SessionId) -> Result<Session, ManageSessionError> {
        self.sessions
            .get(id)
            .await?
            .ok_or(ManageSessionError::NotFound)
    }

    /// Codes are matched case-insensitively. A malformed code can never match.
    pub async fn get_by_code(&self, code: &str) -> Result<Session, ManageSessionError> {
        let Ok(code) = RoomCode::parse(code) else {
            return Err(ManageSessionError::CodeNotFound);
        };
        self.sessions
            .get_by_room_code(&code)
            .await?
            .ok_or(ManageSessionError::CodeNotFound)
    }

    pub async fn list_for_owner(&self, owner: &UserId) -> Result<Vec<Session>, ManageSessionError> {
        Ok(self.sessions.list_for_owner(owner).await?)
    }

    pub async fn update(
        &self,
        requester: &UserId,
        id: SessionId,
        update: SessionUpdate,
    ) -> Result<Session, ManageSessionError> {
        let mut session = self.owned(requester, id).await?;
        let now = self.clock.now();

        if let Some(name) = update.name.filter(|n| !n.trim().is_empty()) {
            session.rename(SessionName::new(name)?, now);
        }
        if let Some(description) = update.description {
            session.set_description(Some(description), now)?;
        }
        if let Some(status) = update.status {
            session.set_status(status, now);
        }

        self.sessions.update(&session).await?;
        tracing::info!(session_id = %id, status = %session.status(), "Session updated");
        Ok(session)
    }

    pub async fn delete(&self, requester: &UserId, id: SessionId) -> Result<(), ManageSessionError> {
        self.owned(requester, id).await?;
        self.sessions.delete(id).await?;
        tracing::info!(session_id = %id, "Session deleted");
        Ok(())
    }

    pub async fn action_log(&self, id: SessionId) -> Result<Vec<ActionRecord>, ManageSessionError> {
        self.get(id).await?;
        Ok(self.actions.list_for_session(id).await?)
    }

    pub async fn history(&self, id: SessionId) -> Result<Vec<ChronicleEntry>, ManageSessionError> {
        self.get(id).await?;
        Ok(self.chronicle.list_history(id).await?)
    }

    pub async fn memory(&self, id: SessionId) -> Result<Vec<MemoryFact>, ManageSessionError> {
        self.get(id).await?;
        Ok(self.chronicle.load_memory(id).await?)
    }

    async fn owned(&self, requester: &UserId, id: SessionId) -> Result<Session, ManageSessionError> {
        let session = self.get(id).await?;
        if !session.is_owned_by(requester) {
            return Err(ManageSessionError::NotOwner);
        }
        Ok(session)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ManageSessionError {
    #[error("Session not found")]
    NotFound,
    #[error("Session not found with this code")]
    CodeNotFound,
    #[error("Only the session owner can modify this session")]
    NotOwner,
    #[error("{0}")]
    Invalid(#[from] DomainError),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}
