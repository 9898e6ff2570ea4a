//! WebSocket gateway for session clients.
//!
//! One socket per browser tab. Text frames carry `{"event", "data"}` JSON in
//! both directions; each connection has a bounded outbound channel drained by
//! a writer task.

use std::{str::FromStr, sync::Arc};

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::HeaderMap,
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use rollcall_domain::{ConnectionId, SessionId, UserId};
use rollcall_shared::{ClientMessage, ProtocolError, ServerMessage};
use tokio::sync::mpsc;

mod ws_action;
mod ws_dice;
mod ws_session;

pub mod error_sanitizer;

use super::connections::{ConnectionManager, OutboundFrame};
use super::http::bound_user_from_headers;
use crate::app::App;
use crate::stores::Membership;
use error_sanitizer::messages;

/// Buffer size for per-connection message channel.
const CONNECTION_CHANNEL_BUFFER: usize = 256;

/// Combined state for WebSocket handlers.
pub struct WsState {
    pub app: Arc<App>,
    pub connections: Arc<ConnectionManager>,
}

impl WsState {
    pub fn new(app: Arc<App>, connections: Arc<ConnectionManager>) -> Self {
        Self { app, connections }
    }
}

/// Identity of the socket a message arrived on.
#[derive(Debug, Clone)]
pub(crate) struct ConnectionContext {
    pub id: ConnectionId,
    /// Set from `X-User-Id` at upgrade time; wins over payload user ids
    pub bound_user: Option<UserId>,
}

/// WebSocket upgrade handler - entry point for new connections.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(state): State<Arc<WsState>>,
) -> Response {
    let bound_user = bound_user_from_headers(&headers);
    ws.on_upgrade(move |socket| handle_socket(socket, state, bound_user))
}

/// Handle an individual WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<WsState>, bound_user: Option<UserId>) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let conn = ConnectionContext {
        id: ConnectionId::new(),
        bound_user,
    };
    let connection_id = conn.id;

    let (tx, mut rx) = mpsc::channel::<OutboundFrame>(CONNECTION_CHANNEL_BUFFER);
    state.connections.register(connection_id, tx);

    tracing::info!(
        connection_id = %connection_id,
        bound_user = ?conn.bound_user.as_ref().map(|u| u.as_str()),
        "WebSocket connection established"
    );

    // Forward queued frames to the socket
    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            match frame {
                OutboundFrame::Message(msg) => match serde_json::to_string(&msg) {
                    Ok(json) => {
                        if ws_sender.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!(
                            connection_id = %connection_id,
                            event = msg.event_name(),
                            error = %e,
                            "Failed to serialize server message"
                        );
                    }
                },
                OutboundFrame::Close => {
                    let _ = ws_sender.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    });

    loop {
        let next = tokio::select! {
            next = ws_receiver.next() => next,
            // writer gone: socket failed or we closed it
            _ = &mut send_task => break,
        };
        let Some(result) = next else {
            break;
        };

        match result {
            Ok(Message::Text(text)) => match ClientMessage::from_json(text.as_str()) {
                Ok(msg) => {
                    tracing::debug!(
                        connection_id = %connection_id,
                        event = msg.event_name(),
                        "Client message received"
                    );
                    if let Some(response) = handle_message(msg, &state, &conn).await {
                        state.connections.send(connection_id, response);
                    }
                }
                Err(e) => {
                    tracing::warn!(connection_id = %connection_id, error = %e, "Failed to parse message");
                    state
                        .connections
                        .send(connection_id, ServerMessage::error(messages::INVALID_MESSAGE));
                }
            },
            Ok(Message::Binary(_)) => {
                state.connections.send(
                    connection_id,
                    ServerMessage::error(ProtocolError::BinaryFrame.to_string()),
                );
            }
            Ok(Message::Close(_)) => {
                tracing::info!(connection_id = %connection_id, "WebSocket closed by client");
                break;
            }
            Err(e) => {
                tracing::error!(connection_id = %connection_id, error = %e, "WebSocket error");
                break;
            }
            // axum answers pings itself
            _ => {}
        }
    }

    // Teardown counts as leaving whatever session the connection was in
    ws_session::depart(&state, connection_id).await;
    state.connections.unregister(connection_id);
    send_task.abort();

    tracing::info!(connection_id = %connection_id, "WebSocket connection terminated");
}

/// Dispatch a parsed client message to the appropriate handler.
///
/// The returned message, if any, goes to the calling connection only.
async fn handle_message(
    msg: ClientMessage,
    state: &WsState,
    conn: &ConnectionContext,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::Heartbeat => Some(ServerMessage::Pong),

        // Presence
        ClientMessage::JoinSession {
            session_id,
            user_id,
            player_name,
            mode,
        } => ws_session::handle_join(state, conn, &session_id, user_id, player_name, mode).await,
        ClientMessage::UpdatePlayerName {
            session_id,
            player_name,
        } => ws_session::handle_update_name(state, conn.id, &session_id, &player_name).await,
        ClientMessage::LeaveSession { session_id } => {
            ws_session::handle_leave(state, conn.id, &session_id).await
        }
        ClientMessage::RequestUsersList { session_id } => {
            ws_session::handle_users_list(state, &session_id).await
        }
        ClientMessage::RequestUpdate {
            session_id,
            update_type,
        } => ws_session::handle_request_update(state, conn.id, &session_id, update_type).await,

        // Play
        ClientMessage::SubmitAction {
            session_id,
            user_id,
            character_id,
            action,
            dice,
            context,
        } => {
            ws_action::handle_submit_action(
                state,
                conn.id,
                &session_id,
                user_id,
                ws_action::submission(character_id, action, dice, context),
            )
            .await
        }
        ClientMessage::RequestDiceRoll {
            session_id,
            requested_for,
            formula,
            target,
            context,
        } => {
            ws_dice::handle_request_dice_roll(
                state,
                conn.id,
                &session_id,
                crate::use_cases::DiceRollInput {
                    requested_for,
                    formula,
                    target,
                    context,
                },
            )
            .await
        }
        ClientMessage::DiceRollCompleted {
            request_id,
            session_id,
            result,
        } => {
            ws_dice::handle_dice_roll_completed(state, conn.id, &session_id, &request_id, result)
                .await
        }
    }
}

/// The connection's membership, checked against the session the message
/// names.
async fn require_membership(
    state: &WsState,
    connection_id: ConnectionId,
    session_id: &str,
) -> Result<Membership, ServerMessage> {
    let membership = state
        .connections
        .presence()
        .membership(connection_id)
        .await
        .ok_or_else(|| ServerMessage::error(messages::NOT_JOINED))?;

    match SessionId::from_str(session_id.trim()) {
        Ok(named) if named == membership.session_id => Ok(membership),
        _ => Err(ServerMessage::error(messages::INVALID_SESSION)),
    }
}

#[cfg(test)]
pub(crate) mod test_support;

#[cfg(test)]
mod ws_integration_tests;
