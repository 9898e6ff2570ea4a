//! Connection management for WebSocket clients.
//!
//! Holds the outbound channel of every live socket. Session membership lives
//! in the [`PresenceRegistry`]; this type turns memberships into fan-out.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use rollcall_domain::{ConnectionId, ParticipantRole, SessionId, UserId};
use rollcall_shared::{wire_timestamp, ConnectedUserData, ServerMessage};
use tokio::sync::mpsc;

use crate::infrastructure::ports::RoleNotifier;
use crate::stores::{Participant, PresenceRegistry};

/// What the writer task of a socket should do next.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundFrame {
    Message(ServerMessage),
    /// Send a close frame and stop writing
    Close,
}

/// Manages all active WebSocket connections.
pub struct ConnectionManager {
    senders: DashMap<ConnectionId, mpsc::Sender<OutboundFrame>>,
    presence: Arc<PresenceRegistry>,
}

impl ConnectionManager {
    pub fn new(presence: Arc<PresenceRegistry>) -> Self {
        Self {
            senders: DashMap::new(),
            presence,
        }
    }

    pub fn presence(&self) -> &Arc<PresenceRegistry> {
        &self.presence
    }

    pub fn register(&self, connection_id: ConnectionId, sender: mpsc::Sender<OutboundFrame>) {
        self.senders.insert(connection_id, sender);
        tracing::debug!(connection_id = %connection_id, "Connection registered");
    }

    pub fn unregister(&self, connection_id: ConnectionId) {
        if self.senders.remove(&connection_id).is_some() {
            tracing::debug!(connection_id = %connection_id, "Connection unregistered");
        }
    }

    /// Queue a message for one connection. Full or closed channels drop it.
    pub fn send(&self, connection_id: ConnectionId, message: ServerMessage) {
        self.push(connection_id, OutboundFrame::Message(message));
    }

    /// Ask a connection's writer to close the socket.
    pub fn close(&self, connection_id: ConnectionId) {
        self.push(connection_id, OutboundFrame::Close);
    }

    fn push(&self, connection_id: ConnectionId, frame: OutboundFrame) {
        let Some(sender) = self.senders.get(&connection_id).map(|s| s.clone()) else {
            return;
        };
        if let Err(e) = sender.try_send(frame) {
            tracing::warn!(
                connection_id = %connection_id,
                error = %e,
                "Failed to queue outbound frame"
            );
        }
    }

    /// Send to every connection currently in the session.
    pub async fn broadcast_to_session(&self, session_id: SessionId, message: ServerMessage) {
        let recipients = self.presence.connection_ids(session_id).await;
        tracing::trace!(
            session_id = %session_id,
            event = message.event_name(),
            recipients = recipients.len(),
            "Broadcasting to session"
        );
        for connection_id in recipients {
            self.send(connection_id, message.clone());
        }
    }

    /// Broadcast the given snapshot as `connected_users_list`.
    pub async fn broadcast_users_list(&self, session_id: SessionId, participants: &[Participant]) {
        self.broadcast_to_session(session_id, users_list(participants))
            .await;
    }
}

/// `connected_users_list` payload for a snapshot.
pub fn users_list(participants: &[Participant]) -> ServerMessage {
    ServerMessage::ConnectedUsersList {
        users: participants.iter().map(user_data).collect(),
    }
}

pub fn user_data(participant: &Participant) -> ConnectedUserData {
    ConnectedUserData {
        user_id: participant.user_id.to_string(),
        player_name: participant.player_name.as_ref().map(|n| n.to_string()),
        mode: participant.role,
        connected_at: wire_timestamp(participant.connected_at),
    }
}

/// `user_joined` announcement for a participant.
pub fn user_joined(participant: &Participant) -> ServerMessage {
    let data = user_data(participant);
    ServerMessage::UserJoined {
        user_id: data.user_id,
        player_name: data.player_name,
        mode: data.mode,
        connected_at: data.connected_at,
    }
}

#[async_trait]
impl RoleNotifier for ConnectionManager {
    async fn role_changed(&self, session_id: SessionId, user_id: &UserId, role: ParticipantRole) {
        let change = self
            .presence
            .set_role_for_user(session_id, user_id, role)
            .await;
        if change.affected.is_empty() {
            tracing::debug!(
                session_id = %session_id,
                user_id = %user_id,
                "Role changed for user without live connections"
            );
            return;
        }

        self.broadcast_to_session(
            session_id,
            ServerMessage::UserModeUpdated {
                user_id: user_id.to_string(),
                mode: role,
            },
        )
        .await;
        for connection_id in &change.affected {
            self.send(*connection_id, ServerMessage::ModeChanged { mode: role });
        }
        self.broadcast_users_list(session_id, &change.participants)
            .await;

        tracing::info!(
            session_id = %session_id,
            user_id = %user_id,
            role = %role,
            connections = change.affected.len(),
            "Live role updated"
        );
    }
}
