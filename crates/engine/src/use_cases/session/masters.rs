//! Session master authority: who may act as master, and hand-offs between masters.
//!
//! Grants are always read from the repository, never cached, so promotions made
//! while a user is offline take effect on their next join.

use std::sync::Arc;

use rollcall_domain::{
    plan_demotion, plan_promotion, plan_renunciation, AuthorityCheck, AuthorityViolation,
    ParticipantRole, PromotionPlan, RevocationPlan, SessionId, SessionMaster, UserId,
};

use crate::infrastructure::ports::{
    ClockPort, MasterGrantRepo, RepoError, RoleNotifier, SessionRepo,
};

pub struct MasterAuthority {
    sessions: Arc<dyn SessionRepo>,
    masters: Arc<dyn MasterGrantRepo>,
    clock: Arc<dyn ClockPort>,
    notifier: Arc<dyn RoleNotifier>,
}

impl MasterAuthority {
    pub fn new(
        sessions: Arc<dyn SessionRepo>,
        masters: Arc<dyn MasterGrantRepo>,
        clock: Arc<dyn ClockPort>,
        notifier: Arc<dyn RoleNotifier>,
    ) -> Self {
        Self {
            sessions,
            masters,
            clock,
            notifier,
        }
    }

    pub async fn is_master(
        &self,
        session_id: SessionId,
        user_id: &UserId,
    ) -> Result<bool, RepoError> {
        Ok(self.masters.get(session_id, user_id).await?.is_some())
    }

    pub async fn is_original_creator(
        &self,
        session_id: SessionId,
        user_id: &UserId,
    ) -> Result<bool, RepoError> {
        Ok(self
            .masters
            .get(session_id, user_id)
            .await?
            .is_some_and(|g| g.is_original_creator))
    }

    /// Authority lookup for role resolution. Lookup failures are logged and
    /// reported as `Unavailable` instead of failing the caller.
    pub async fn check(&self, session_id: SessionId, user_id: &UserId) -> AuthorityCheck {
        match self.is_master(session_id, user_id).await {
            Ok(true) => AuthorityCheck::IsMaster,
            Ok(false) => AuthorityCheck::NotMaster,
            Err(e) => {
                tracing::warn!(
                    session_id = %session_id,
                    user_id = %user_id,
                    error = %e,
                    "Master authority lookup failed"
                );
                AuthorityCheck::Unavailable
            }
        }
    }

    pub async fn list(&self, session_id: SessionId) -> Result<Vec<SessionMaster>, MasterAuthorityError> {
        self.ensure_session(session_id).await?;
        Ok(self.masters.list(session_id).await?)
    }

    /// Promote `target` to master. Any previously promoted master is demoted in
    /// the same transaction.
    pub async fn promote(
        &self,
        session_id: SessionId,
        requester: &UserId,
        target: &UserId,
    ) -> Result<SessionMaster, MasterAuthorityError> {
        self.ensure_session(session_id).await?;
        let grants = self.masters.list(session_id).await?;

        match plan_promotion(&grants, session_id, requester, target, self.clock.now())? {
            PromotionPlan::AlreadyCreator(grant) => Ok(grant),
            PromotionPlan::AlreadyPromoted(grant) => {
                // refresh live connections that may have missed the first notice
                self.notifier
                    .role_changed(session_id, target, ParticipantRole::Master)
                    .await;
                Ok(grant)
            }
            PromotionPlan::HandOff { grant, .. } => {
                let demoted = self.masters.hand_off(session_id, &grant).await?;
                tracing::info!(
                    session_id = %session_id,
                    promoted = %target,
                    demoted = demoted.len(),
                    "Master authority handed off"
                );
                for user_id in &demoted {
                    self.notifier
                        .role_changed(session_id, user_id, ParticipantRole::Player)
                        .await;
                }
                self.notifier
                    .role_changed(session_id, target, ParticipantRole::Master)
                    .await;
                Ok(grant)
            }
        }
    }

    pub async fn demote(
        &self,
        session_id: SessionId,
        requester: &UserId,
        target: &UserId,
    ) -> Result<(), MasterAuthorityError> {
        self.ensure_session(session_id).await?;
        let grants = self.masters.list(session_id).await?;
        let plan = plan_demotion(&grants, requester, target)?;
        self.revoke(session_id, plan).await
    }

    pub async fn renounce(
        &self,
        session_id: SessionId,
        user_id: &UserId,
    ) -> Result<(), MasterAuthorityError> {
        self.ensure_session(session_id).await?;
        let grants = self.masters.list(session_id).await?;
        let plan = plan_renunciation(&grants, user_id)?;
        self.revoke(session_id, plan).await
    }

    async fn revoke(
        &self,
        session_id: SessionId,
        plan: RevocationPlan,
    ) -> Result<(), MasterAuthorityError> {
        let user_id = match plan {
            RevocationPlan::Revoke(user_id) => user_id,
            RevocationPlan::NoGrant(user_id) => {
                tracing::debug!(session_id = %session_id, user_id = %user_id, "No master grant to revoke");
                return Ok(());
            }
        };

        if self.masters.delete_promoted(session_id, &user_id).await? {
            tracing::info!(session_id = %session_id, user_id = %user_id, "Master grant revoked");
            self.notifier
                .role_changed(session_id, &user_id, ParticipantRole::Player)
                .await;
        }
        Ok(())
    }

    async fn ensure_session(&self, session_id: SessionId) -> Result<(), MasterAuthorityError> {
        match self.sessions.get(session_id).await? {
            Some(_) => Ok(()),
            None => Err(MasterAuthorityError::SessionNotFound),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MasterAuthorityError {
    #[error("Session not found")]
    SessionNotFound,
    #[error("{0}")]
    Forbidden(#[from] AuthorityViolation),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}
