//! Create a session together with its original-creator grant.

use std::sync::Arc;

use rollcall_domain::{CampaignId, DomainError, RoomCode, Session, SessionMaster, SessionName, UserId};

use crate::infrastructure::ports::{ClockPort, RandomPort, RepoError, SessionRepo};

/// Room code collisions tolerated before giving up.
pub const MAX_ROOM_CODE_ATTEMPTS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateSessionInput {
    pub owner: UserId,
    pub name: String,
    pub description: Option<String>,
    pub campaign_id: Option<String>,
}

pub struct CreateSession {
    sessions: Arc<dyn SessionRepo>,
    clock: Arc<dyn ClockPort>,
    random: Arc<dyn RandomPort>,
}

impl CreateSession {
    pub fn new(
        sessions: Arc<dyn SessionRepo>,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
    ) -> Self {
        Self {
            sessions,
            clock,
            random,
        }
    }

    pub async fn execute(&self, input: CreateSessionInput) -> Result<Session, CreateSessionError> {
        let name = SessionName::new(input.name)?;
        let campaign_id = match input
            .campaign_id
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
        {
            Some(raw) => Some(raw.parse::<CampaignId>()?),
            None => None,
        };

        for attempt in 1..=MAX_ROOM_CODE_ATTEMPTS {
            let code = RoomCode::generate(|upper| self.random.gen_index(upper));
            if self.sessions.room_code_exists(&code).await? {
                tracing::debug!(attempt, room_code = %code.as_str(), "Room code collision");
                continue;
            }

            let now = self.clock.now();
            let session = Session::new(input.owner.clone(), name.clone(), code, now)
                .with_campaign(campaign_id)
                .with_description(input.description.clone())?;
            let creator = SessionMaster::original_creator(session.id(), input.owner.clone(), now);

            match self.sessions.create_with_creator(&session, &creator).await {
                Ok(()) => {
                    tracing::info!(
                        session_id = %session.id(),
                        owner = %input.owner.as_str(),
                        room_code = %session.room_code().as_str(),
                        "Session created"
                    );
                    return Ok(session);
                }
                // lost a race for the code between the check and the insert
                Err(RepoError::ConstraintViolation(reason)) => {
                    tracing::debug!(attempt, reason = %reason, "Room code taken on insert");
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::error!(
            attempts = MAX_ROOM_CODE_ATTEMPTS,
            "Could not find a free room code"
        );
        Err(CreateSessionError::RoomCodeExhausted)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CreateSessionError {
    #[error("{0}")]
    Invalid(#[from] DomainError),
    #[error("Failed to generate unique room code")]
    RoomCodeExhausted,
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}
