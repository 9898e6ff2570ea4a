//! Presence handlers: join, rename, leave, list, refresh requests.

use std::str::FromStr;

use rollcall_domain::{ConnectionId, DisplayName, ParticipantRole, SessionId, UserId};
use rollcall_shared::ServerMessage;

use super::{error_sanitizer::messages, require_membership, ConnectionContext, WsState};
use crate::api::connections::{user_joined, users_list};
use crate::stores::Departure;
use crate::use_cases::session::JoinRequest;

/// Pick the identity a join runs under. A header-bound user always wins.
fn join_identity(
    conn: &ConnectionContext,
    claimed: Option<String>,
) -> Result<Option<UserId>, ServerMessage> {
    let claimed = claimed
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    if let Some(bound) = &conn.bound_user {
        if claimed.as_deref().is_some_and(|c| c != bound.as_str()) {
            tracing::warn!(
                connection_id = %conn.id,
                bound_user = %bound,
                "Ignoring userId in join_session that differs from the bound user"
            );
        }
        return Ok(Some(bound.clone()));
    }

    claimed
        .map(UserId::new)
        .transpose()
        .map_err(|e| ServerMessage::error(e.to_string()))
}

pub(super) async fn handle_join(
    state: &WsState,
    conn: &ConnectionContext,
    session_id: &str,
    user_id: Option<String>,
    player_name: Option<String>,
    mode: ParticipantRole,
) -> Option<ServerMessage> {
    let Ok(session_id) = SessionId::from_str(session_id.trim()) else {
        return Some(ServerMessage::error(messages::INVALID_SESSION));
    };
    let user_id = match join_identity(conn, user_id) {
        Ok(user_id) => user_id,
        Err(e) => return Some(e),
    };

    let joined = match state
        .app
        .use_cases
        .session
        .join
        .execute(JoinRequest {
            connection_id: conn.id,
            session_id,
            user_id,
            player_name,
            requested: mode,
        })
        .await
    {
        Ok(joined) => joined,
        Err(e) => {
            tracing::info!(connection_id = %conn.id, session_id = %session_id, error = %e, "Join rejected");
            return Some(ServerMessage::error(e.to_string()));
        }
    };
    let connections = &state.connections;

    if let Some(previous) = &joined.arrival.left_previous {
        announce_departure(state, previous).await;
    }
    for stale in &joined.arrival.evicted {
        tracing::info!(
            session_id = %session_id,
            user_id = %stale.user_id,
            stale_connection = %stale.connection_id,
            "Closing duplicate connection"
        );
        connections.close(stale.connection_id);
    }

    connections.send(
        conn.id,
        ServerMessage::JoinedSession {
            session_id: session_id.to_string(),
            mode: joined.participant.role,
        },
    );
    connections
        .broadcast_to_session(session_id, user_joined(&joined.participant))
        .await;
    connections
        .broadcast_users_list(session_id, &joined.arrival.participants)
        .await;
    None
}

pub(super) async fn handle_update_name(
    state: &WsState,
    connection_id: ConnectionId,
    session_id: &str,
    player_name: &str,
) -> Option<ServerMessage> {
    let presence = state.connections.presence();
    let session_id = match SessionId::from_str(session_id.trim()) {
        Ok(id) if presence.has_session(id).await => id,
        _ => return Some(ServerMessage::error(messages::NOT_IN_SESSION)),
    };
    match presence.membership(connection_id).await {
        Some(m) if m.session_id == session_id => {}
        _ => return Some(ServerMessage::error(messages::USER_NOT_IN_SESSION)),
    }

    let Some((membership, participants)) = presence
        .update_name(connection_id, DisplayName::optional(Some(player_name)))
        .await
    else {
        return Some(ServerMessage::error(messages::USER_NOT_IN_SESSION));
    };

    state
        .connections
        .broadcast_to_session(session_id, user_joined(&membership.participant))
        .await;
    state
        .connections
        .broadcast_users_list(session_id, &participants)
        .await;

    tracing::info!(
        session_id = %session_id,
        user_id = %membership.participant.user_id,
        "Player name updated"
    );
    None
}

/// Explicit leave. Leaving while not joined is a no-op.
pub(super) async fn handle_leave(
    state: &WsState,
    connection_id: ConnectionId,
    session_id: &str,
) -> Option<ServerMessage> {
    match require_membership(state, connection_id, session_id).await {
        Ok(_) => {
            depart(state, connection_id).await;
            None
        }
        Err(ServerMessage::Error { message }) if message == messages::NOT_JOINED => None,
        Err(e) => Some(e),
    }
}

/// Remove the connection from its session, if any, and tell the rest.
pub(super) async fn depart(state: &WsState, connection_id: ConnectionId) {
    if let Some(departure) = state.connections.presence().leave(connection_id).await {
        announce_departure(state, &departure).await;
    }
}

async fn announce_departure(state: &WsState, departure: &Departure) {
    let session_id = departure.session_id;
    tracing::info!(
        session_id = %session_id,
        connection_id = %departure.participant.connection_id,
        user_id = %departure.participant.user_id,
        remaining = departure.remaining.len(),
        "Connection left session"
    );
    if departure.remaining.is_empty() {
        return;
    }

    state
        .connections
        .broadcast_to_session(
            session_id,
            ServerMessage::UserLeft {
                user_id: departure.participant.user_id.to_string(),
            },
        )
        .await;
    state
        .connections
        .broadcast_users_list(session_id, &departure.remaining)
        .await;
}

/// Unicast snapshot. Unknown sessions yield an empty list.
pub(super) async fn handle_users_list(state: &WsState, session_id: &str) -> Option<ServerMessage> {
    let participants = match SessionId::from_str(session_id.trim()) {
        Ok(id) => state.connections.presence().list(id).await,
        Err(_) => Vec::new(),
    };
    Some(users_list(&participants))
}

/// Relay a refresh signal to the whole session without interpreting it.
pub(super) async fn handle_request_update(
    state: &WsState,
    connection_id: ConnectionId,
    session_id: &str,
    update_type: String,
) -> Option<ServerMessage> {
    let membership = match require_membership(state, connection_id, session_id).await {
        Ok(m) => m,
        Err(e) => return Some(e),
    };
    state
        .connections
        .broadcast_to_session(
            membership.session_id,
            ServerMessage::UpdateRequested {
                update_type,
                requested_by: membership.participant.user_id.to_string(),
            },
        )
        .await;
    None
}
