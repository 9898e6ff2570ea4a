//! Action submission and the `action_result` fan-out.

use rollcall_domain::{ConnectionId, DiceRollResult};
use rollcall_shared::ServerMessage;

use super::{error_sanitizer::sanitize_repo_error, require_membership, WsState};
use crate::use_cases::{ActionSubmission, SubmitActionError};

pub(super) fn submission(
    character_id: Option<String>,
    action: String,
    dice: DiceRollResult,
    context: Option<serde_json::Value>,
) -> ActionSubmission {
    ActionSubmission {
        character_id,
        action,
        dice,
        context,
    }
}

pub(super) async fn handle_submit_action(
    state: &WsState,
    connection_id: ConnectionId,
    session_id: &str,
    claimed_user: Option<String>,
    submission: ActionSubmission,
) -> Option<ServerMessage> {
    let membership = match require_membership(state, connection_id, session_id).await {
        Ok(m) => m,
        Err(e) => return Some(e),
    };

    // The connection's bound identity acts, whatever the payload says
    if let Some(claimed) = claimed_user.as_deref().map(str::trim) {
        if !claimed.is_empty() && claimed != membership.participant.user_id.as_str() {
            tracing::warn!(
                connection_id = %connection_id,
                session_id = %membership.session_id,
                bound_user = %membership.participant.user_id,
                "Ignoring userId in submit_action that differs from the connection's user"
            );
        }
    }

    match state
        .app
        .use_cases
        .action
        .execute(&membership, submission)
        .await
    {
        Ok(record) => {
            let submitted_by = record.submitted_by.to_string();
            let narrator_response = Box::new(record.narrative.clone());
            state
                .connections
                .broadcast_to_session(
                    record.session_id,
                    ServerMessage::ActionResult {
                        action: Box::new(record),
                        narrator_response,
                        submitted_by,
                    },
                )
                .await;
            Some(ServerMessage::ActionSubmitted { success: true })
        }
        Err(SubmitActionError::Repo(e)) => {
            Some(ServerMessage::error(sanitize_repo_error(&e, "submit action")))
        }
        Err(e) => {
            tracing::info!(connection_id = %connection_id, error = %e, "Action rejected");
            Some(ServerMessage::error(e.to_string()))
        }
    }
}
