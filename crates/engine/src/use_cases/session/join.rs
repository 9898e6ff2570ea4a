//! Join a session: resolve the effective role, then register presence.

use std::sync::Arc;

use rollcall_domain::{
    AuthorityCheck, ConnectionId, DisplayName, ParticipantRole, RolePlan, RoleRejection,
    RoleRequest, SessionId, UserId,
};

use crate::infrastructure::ports::ClockPort;
use crate::stores::{Arrival, Participant, PresenceRegistry};

use super::masters::MasterAuthority;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinRequest {
    pub connection_id: ConnectionId,
    pub session_id: SessionId,
    pub user_id: Option<UserId>,
    pub player_name: Option<String>,
    pub requested: ParticipantRole,
}

#[derive(Debug, Clone)]
pub struct Joined {
    /// The stored entry; its `role` is the effective role
    pub participant: Participant,
    pub arrival: Arrival,
}

pub struct JoinSession {
    authority: Arc<MasterAuthority>,
    presence: Arc<PresenceRegistry>,
    clock: Arc<dyn ClockPort>,
}

impl JoinSession {
    pub fn new(
        authority: Arc<MasterAuthority>,
        presence: Arc<PresenceRegistry>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            authority,
            presence,
            clock,
        }
    }

    /// Decide the role this connection actually gets.
    ///
    /// Authority records override the client's request: a master grant
    /// upgrades a player, a missing grant downgrades a master. A failed
    /// lookup keeps the requested role.
    pub async fn resolve_role(
        &self,
        session_id: SessionId,
        user_id: Option<&UserId>,
        requested: ParticipantRole,
    ) -> Result<ParticipantRole, JoinSessionError> {
        let plan = RoleRequest::new(requested, user_id.cloned()).plan()?;
        Ok(self.settle(session_id, plan).await)
    }

    async fn settle(&self, session_id: SessionId, plan: RolePlan) -> ParticipantRole {
        let check = match &plan {
            RolePlan::Granted(_) => AuthorityCheck::NotMaster,
            RolePlan::CheckAuthority { user_id, .. } => {
                self.authority.check(session_id, user_id).await
            }
        };
        plan.settle(check)
    }

    pub async fn execute(&self, request: JoinRequest) -> Result<Joined, JoinSessionError> {
        let session_id = request.session_id;
        let plan = RoleRequest::new(request.requested, request.user_id.clone()).plan()?;
        let role = self.settle(session_id, plan.clone()).await;
        if role != request.requested {
            tracing::info!(
                session_id = %session_id,
                requested = %request.requested,
                effective = %role,
                "Join role adjusted by master authority"
            );
        }

        let mut participant = Participant {
            connection_id: request.connection_id,
            user_id: request.user_id.unwrap_or_else(UserId::anonymous),
            player_name: DisplayName::optional(request.player_name.as_deref()),
            role,
            connected_at: self.clock.now(),
        };
        let mut arrival = self.presence.join(session_id, participant.clone()).await;

        // A grant change that committed during the first lookup found no live
        // connection to notify, so look again now that this one is registered.
        if let RolePlan::CheckAuthority { user_id, .. } = &plan {
            let check = self.authority.check(session_id, user_id).await;
            if check != AuthorityCheck::Unavailable {
                let current = plan.clone().settle(check);
                if current != participant.role {
                    let change = self
                        .presence
                        .set_role_for_user(session_id, user_id, current)
                        .await;
                    if change.affected.contains(&participant.connection_id) {
                        tracing::info!(
                            session_id = %session_id,
                            user_id = %user_id,
                            stale = %participant.role,
                            effective = %current,
                            "Master authority changed during join"
                        );
                        participant.role = current;
                        arrival.participants = change.participants;
                    }
                }
            }
        }

        tracing::info!(
            session_id = %session_id,
            connection_id = %participant.connection_id,
            user_id = %participant.user_id,
            role = %participant.role,
            evicted = arrival.evicted.len(),
            "Connection joined session"
        );

        Ok(Joined {
            participant,
            arrival,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JoinSessionError {
    #[error("{0}")]
    Rejected(#[from] RoleRejection),
}
