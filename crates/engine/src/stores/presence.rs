//! Presence registry: who is connected to which session.
//!
//! Purely in-memory and rebuilt from nothing on restart. Every mutation runs
//! under one write lock with no await inside it, so each join/leave/rename is
//! observed atomically by other connections.
//!
//! The registry only records state and reports what changed; the caller turns
//! the returned outcomes into broadcasts.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rollcall_domain::{ConnectionId, DisplayName, ParticipantRole, SessionId, UserId};
use tokio::sync::RwLock;

/// One connection's presence in a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub connection_id: ConnectionId,
    pub user_id: UserId,
    pub player_name: Option<DisplayName>,
    pub role: ParticipantRole,
    pub connected_at: DateTime<Utc>,
}

impl Participant {
    /// A master or an identified player. At most one such connection per
    /// user is kept in a session.
    fn is_exclusive(&self) -> bool {
        !self.role.is_presentation() && !self.user_id.is_anonymous()
    }
}

/// A connection's current session and presence entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub session_id: SessionId,
    pub participant: Participant,
}

/// Result of a connection leaving a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub session_id: SessionId,
    pub participant: Participant,
    /// Empty when the session's collection was discarded
    pub remaining: Vec<Participant>,
}

/// Result of a join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arrival {
    /// Stale connections of the same user removed before this one was added
    pub evicted: Vec<Participant>,
    /// Set when the connection was bound to a different session before
    pub left_previous: Option<Departure>,
    pub participants: Vec<Participant>,
}

/// Result of a role change applied to a user's live connections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleChange {
    pub affected: Vec<ConnectionId>,
    pub participants: Vec<Participant>,
}

#[derive(Default)]
struct Inner {
    /// Per-session participants in join order
    sessions: HashMap<SessionId, Vec<Participant>>,
    bindings: HashMap<ConnectionId, SessionId>,
}

impl Inner {
    fn remove(&mut self, connection_id: ConnectionId) -> Option<Departure> {
        let session_id = self.bindings.remove(&connection_id)?;
        let members = self.sessions.get_mut(&session_id)?;
        let index = members
            .iter()
            .position(|p| p.connection_id == connection_id)?;
        let participant = members.remove(index);

        let remaining = if members.is_empty() {
            self.sessions.remove(&session_id);
            Vec::new()
        } else {
            members.clone()
        };

        Some(Departure {
            session_id,
            participant,
            remaining,
        })
    }

    fn snapshot(&self, session_id: SessionId) -> Vec<Participant> {
        self.sessions.get(&session_id).cloned().unwrap_or_default()
    }
}

#[derive(Default)]
pub struct PresenceRegistry {
    inner: RwLock<Inner>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `participant` in `session_id`.
    ///
    /// A connection already bound to another session leaves it first. A
    /// rejoin of the same session replaces the entry in place. When the
    /// newcomer is a master or an identified player, older master/player
    /// connections of the same user in this session are evicted.
    pub async fn join(&self, session_id: SessionId, participant: Participant) -> Arrival {
        let mut inner = self.inner.write().await;
        let connection_id = participant.connection_id;

        let left_previous = match inner.bindings.get(&connection_id).copied() {
            Some(bound) if bound != session_id => inner.remove(connection_id),
            _ => None,
        };

        let mut evicted = Vec::new();
        if participant.is_exclusive() {
            let stale: Vec<ConnectionId> = inner
                .sessions
                .get(&session_id)
                .map(|members| {
                    members
                        .iter()
                        .filter(|p| {
                            p.connection_id != connection_id
                                && p.user_id == participant.user_id
                                && !p.role.is_presentation()
                        })
                        .map(|p| p.connection_id)
                        .collect()
                })
                .unwrap_or_default();
            for id in stale {
                if let Some(departure) = inner.remove(id) {
                    evicted.push(departure.participant);
                }
            }
        }

        let members = inner.sessions.entry(session_id).or_default();
        match members
            .iter_mut()
            .find(|p| p.connection_id == connection_id)
        {
            Some(existing) => *existing = participant,
            None => members.push(participant),
        }
        inner.bindings.insert(connection_id, session_id);

        Arrival {
            evicted,
            left_previous,
            participants: inner.snapshot(session_id),
        }
    }

    /// Remove a connection. Unknown connections are a silent no-op.
    pub async fn leave(&self, connection_id: ConnectionId) -> Option<Departure> {
        self.inner.write().await.remove(connection_id)
    }

    /// Change the display name of a bound connection.
    pub async fn update_name(
        &self,
        connection_id: ConnectionId,
        player_name: Option<DisplayName>,
    ) -> Option<(Membership, Vec<Participant>)> {
        let mut inner = self.inner.write().await;
        let session_id = *inner.bindings.get(&connection_id)?;
        let participant = inner
            .sessions
            .get_mut(&session_id)?
            .iter_mut()
            .find(|p| p.connection_id == connection_id)?;
        participant.player_name = player_name;
        let participant = participant.clone();

        Some((
            Membership {
                session_id,
                participant,
            },
            inner.snapshot(session_id),
        ))
    }

    /// Set `role` on every non-presentation connection of `user_id` in the
    /// session.
    pub async fn set_role_for_user(
        &self,
        session_id: SessionId,
        user_id: &UserId,
        role: ParticipantRole,
    ) -> RoleChange {
        let mut inner = self.inner.write().await;
        let mut affected = Vec::new();
        if let Some(members) = inner.sessions.get_mut(&session_id) {
            for p in members
                .iter_mut()
                .filter(|p| &p.user_id == user_id && !p.role.is_presentation())
            {
                p.role = role;
                affected.push(p.connection_id);
            }
        }
        RoleChange {
            affected,
            participants: inner.snapshot(session_id),
        }
    }

    pub async fn membership(&self, connection_id: ConnectionId) -> Option<Membership> {
        let inner = self.inner.read().await;
        let session_id = *inner.bindings.get(&connection_id)?;
        let participant = inner
            .sessions
            .get(&session_id)?
            .iter()
            .find(|p| p.connection_id == connection_id)?
            .clone();
        Some(Membership {
            session_id,
            participant,
        })
    }

    /// Current participants, in join order.
    pub async fn list(&self, session_id: SessionId) -> Vec<Participant> {
        self.inner.read().await.snapshot(session_id)
    }

    pub async fn connection_ids(&self, session_id: SessionId) -> Vec<ConnectionId> {
        let inner = self.inner.read().await;
        inner
            .sessions
            .get(&session_id)
            .map(|members| members.iter().map(|p| p.connection_id).collect())
            .unwrap_or_default()
    }

    /// Whether the session currently has a collection at all.
    pub async fn has_session(&self, session_id: SessionId) -> bool {
        self.inner.read().await.sessions.contains_key(&session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(user: &str, role: ParticipantRole) -> Participant {
        Participant {
            connection_id: ConnectionId::new(),
            user_id: if user.is_empty() {
                UserId::anonymous()
            } else {
                UserId::new(user).unwrap()
            },
            player_name: None,
            role,
            connected_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn join_creates_collection_and_lists_in_order() {
        let registry = PresenceRegistry::new();
        let sid = SessionId::new();
        let gm = participant("gm", ParticipantRole::Master);
        let p1 = participant("p1", ParticipantRole::Player);

        registry.join(sid, gm.clone()).await;
        let arrival = registry.join(sid, p1.clone()).await;

        assert!(arrival.evicted.is_empty());
        assert_eq!(arrival.participants, vec![gm, p1]);
    }

    #[tokio::test]
    async fn last_leave_discards_collection() {
        let registry = PresenceRegistry::new();
        let sid = SessionId::new();
        let a = participant("a", ParticipantRole::Player);
        let b = participant("b", ParticipantRole::Player);
        registry.join(sid, a.clone()).await;
        registry.join(sid, b.clone()).await;

        let departure = registry.leave(a.connection_id).await.unwrap();
        assert_eq!(departure.remaining, vec![b.clone()]);

        let departure = registry.leave(b.connection_id).await.unwrap();
        assert!(departure.remaining.is_empty());
        assert!(!registry.has_session(sid).await);
    }

    #[tokio::test]
    async fn leave_of_unknown_connection_is_noop() {
        let registry = PresenceRegistry::new();
        assert!(registry.leave(ConnectionId::new()).await.is_none());
    }

    #[tokio::test]
    async fn identified_rejoin_evicts_older_connection() {
        let registry = PresenceRegistry::new();
        let sid = SessionId::new();
        let old = participant("p1", ParticipantRole::Player);
        let screen = participant("p1", ParticipantRole::Presentation);
        registry.join(sid, old.clone()).await;
        registry.join(sid, screen.clone()).await;

        let fresh = participant("p1", ParticipantRole::Master);
        let arrival = registry.join(sid, fresh.clone()).await;

        assert_eq!(arrival.evicted, vec![old.clone()]);
        assert_eq!(arrival.participants, vec![screen, fresh]);
        assert!(registry.membership(old.connection_id).await.is_none());
    }

    #[tokio::test]
    async fn anonymous_players_are_never_deduplicated() {
        let registry = PresenceRegistry::new();
        let sid = SessionId::new();
        registry.join(sid, participant("", ParticipantRole::Player)).await;
        let arrival = registry.join(sid, participant("", ParticipantRole::Player)).await;
        assert!(arrival.evicted.is_empty());
        assert_eq!(arrival.participants.len(), 2);
    }

    #[tokio::test]
    async fn joining_another_session_leaves_the_first() {
        let registry = PresenceRegistry::new();
        let first = SessionId::new();
        let second = SessionId::new();
        let p = participant("p1", ParticipantRole::Player);
        registry.join(first, p.clone()).await;

        let arrival = registry.join(second, p.clone()).await;
        let left = arrival.left_previous.unwrap();
        assert_eq!(left.session_id, first);
        assert!(!registry.has_session(first).await);
        assert_eq!(
            registry.membership(p.connection_id).await.unwrap().session_id,
            second
        );
    }

    #[tokio::test]
    async fn rejoining_same_session_replaces_entry() {
        let registry = PresenceRegistry::new();
        let sid = SessionId::new();
        let mut p = participant("p1", ParticipantRole::Player);
        registry.join(sid, p.clone()).await;
        p.role = ParticipantRole::Master;
        let arrival = registry.join(sid, p.clone()).await;
        assert_eq!(arrival.participants, vec![p]);
    }

    #[tokio::test]
    async fn update_name_changes_entry() {
        let registry = PresenceRegistry::new();
        let sid = SessionId::new();
        let p = participant("p1", ParticipantRole::Player);
        registry.join(sid, p.clone()).await;

        let (membership, list) = registry
            .update_name(p.connection_id, DisplayName::optional(Some("Aria")))
            .await
            .unwrap();
        assert_eq!(
            membership.participant.player_name.as_ref().map(|n| n.as_str()),
            Some("Aria")
        );
        assert_eq!(list[0].player_name, membership.participant.player_name);
        assert!(registry
            .update_name(ConnectionId::new(), None)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn role_change_skips_presentation_connections() {
        let registry = PresenceRegistry::new();
        let sid = SessionId::new();
        let player = participant("p1", ParticipantRole::Player);
        let screen = participant("p1", ParticipantRole::Presentation);
        registry.join(sid, player.clone()).await;
        registry.join(sid, screen.clone()).await;

        let change = registry
            .set_role_for_user(sid, &player.user_id, ParticipantRole::Master)
            .await;
        assert_eq!(change.affected, vec![player.connection_id]);
        assert_eq!(change.participants[0].role, ParticipantRole::Master);
        assert_eq!(change.participants[1].role, ParticipantRole::Presentation);
    }
}
