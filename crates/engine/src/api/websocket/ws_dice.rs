//! Mediated dice rolls: a master asks, the addressee answers.

use rollcall_domain::{ConnectionId, DiceRollResult};
use rollcall_shared::ServerMessage;

use super::{require_membership, WsState};
use crate::use_cases::DiceRollInput;

pub(super) async fn handle_request_dice_roll(
    state: &WsState,
    connection_id: ConnectionId,
    session_id: &str,
    input: DiceRollInput,
) -> Option<ServerMessage> {
    let membership = match require_membership(state, connection_id, session_id).await {
        Ok(m) => m,
        Err(e) => return Some(e),
    };

    match state.app.use_cases.dice.request(&membership, input).await {
        Ok(request) => {
            // Everyone sees it; clients filter on requestedFor
            state
                .connections
                .broadcast_to_session(
                    request.session_id,
                    ServerMessage::DiceRollRequested((&request).into()),
                )
                .await;
            None
        }
        Err(e) => {
            tracing::debug!(connection_id = %connection_id, error = %e, "Dice roll request rejected");
            Some(ServerMessage::error(e.to_string()))
        }
    }
}

pub(super) async fn handle_dice_roll_completed(
    state: &WsState,
    connection_id: ConnectionId,
    session_id: &str,
    request_id: &str,
    result: DiceRollResult,
) -> Option<ServerMessage> {
    let membership = match require_membership(state, connection_id, session_id).await {
        Ok(m) => m,
        Err(e) => return Some(e),
    };

    match state
        .app
        .use_cases
        .dice
        .complete(&membership, request_id, result)
        .await
    {
        Ok(completed) => {
            state
                .connections
                .broadcast_to_session(
                    completed.session_id,
                    ServerMessage::DiceRollCompleted((&completed).into()),
                )
                .await;
            None
        }
        Err(e) => {
            tracing::debug!(
                connection_id = %connection_id,
                request_id = request_id,
                error = %e,
                "Dice roll completion rejected"
            );
            Some(ServerMessage::error(e.to_string()))
        }
    }
}
