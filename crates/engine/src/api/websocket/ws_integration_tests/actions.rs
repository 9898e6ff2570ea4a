use super::*;

use crate::infrastructure::ports::MockNarratorPort;
use rollcall_domain::{NarratorOutcome, OutcomeKind};
use serde_json::json;

fn natural_twenty() -> DiceRollResult {
    DiceRollResult {
        roll: 25,
        formula: "1d20+5".into(),
        natural: Some(20),
        target: Some(15),
    }
}

fn submit(session_id: String, user_id: Option<&str>, action: &str) -> ClientMessage {
    ClientMessage::SubmitAction {
        session_id,
        user_id: user_id.map(str::to_string),
        character_id: None,
        action: action.into(),
        dice: natural_twenty(),
        context: Some(json!({ "location": "Old Mill" })),
    }
}

fn is_action_result(m: &ServerMessage) -> bool {
    matches!(m, ServerMessage::ActionResult { .. })
}

#[tokio::test]
async fn action_result_reaches_every_connection_once() {
    let server = TestServer::spawn().await;
    let session = server.create_session("gm").await;

    let mut gm = server.connect().await;
    let mut alice = server.connect().await;
    let mut screen = server.connect().await;
    ws_join(&mut gm, &session, Some("gm"), None, ParticipantRole::Master).await;
    ws_join(&mut alice, &session, Some("alice"), Some("Alice"), ParticipantRole::Player).await;
    ws_join(&mut screen, &session, None, None, ParticipantRole::Presentation).await;

    ws_send_client(
        &mut gm,
        &submit(session.id().to_string(), Some("gm"), "The bridge collapses"),
    )
    .await;

    for ws in [&mut gm, &mut alice, &mut screen] {
        let msg = ws_expect_message(ws, RECV_TIMEOUT, is_action_result).await;
        let ServerMessage::ActionResult {
            action,
            narrator_response,
            submitted_by,
        } = msg
        else {
            unreachable!()
        };
        assert_eq!(submitted_by, "gm");
        assert_eq!(action.action, "The bridge collapses");
        // narrator is offline in tests, so the fallback decides
        assert_eq!(narrator_response.outcome, OutcomeKind::CriticalSuccess);
        assert_eq!(narrator_response.headline(), Some("The bridge collapses"));
    }
    ws_expect_message(&mut gm, RECV_TIMEOUT, |m| {
        *m == ServerMessage::ActionSubmitted { success: true }
    })
    .await;

    for ws in [&mut gm, &mut alice, &mut screen] {
        ws_expect_no_message_matching(ws, QUIET_PERIOD, is_action_result).await;
    }

    let log = server
        .app
        .use_cases
        .session
        .manage
        .action_log(session.id())
        .await
        .unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].outcome, OutcomeKind::CriticalSuccess);
}

#[tokio::test]
async fn presentation_cannot_submit_and_nothing_is_broadcast() {
    let server = TestServer::spawn().await;
    let session = server.create_session("gm").await;

    let mut alice = server.connect().await;
    let mut screen = server.connect().await;
    ws_join(&mut alice, &session, Some("alice"), None, ParticipantRole::Player).await;
    ws_join(&mut screen, &session, None, None, ParticipantRole::Presentation).await;

    ws_send_client(
        &mut screen,
        &submit(session.id().to_string(), None, "I am a television"),
    )
    .await;

    ws_expect_message(&mut screen, RECV_TIMEOUT, |m| {
        *m == ServerMessage::error("Presentation mode cannot submit actions")
    })
    .await;
    ws_expect_no_message_matching(&mut alice, QUIET_PERIOD, is_action_result).await;
}

#[tokio::test]
async fn submitter_is_the_connection_user_not_the_payload() {
    let server = TestServer::spawn().await;
    let session = server.create_session("gm").await;

    let mut alice = server.connect().await;
    ws_join(&mut alice, &session, Some("alice"), None, ParticipantRole::Player).await;

    ws_send_client(
        &mut alice,
        &submit(session.id().to_string(), Some("gm"), "I search the desk"),
    )
    .await;

    let ServerMessage::ActionResult { submitted_by, action, .. } =
        ws_expect_message(&mut alice, RECV_TIMEOUT, is_action_result).await
    else {
        unreachable!()
    };
    assert_eq!(submitted_by, "alice");
    assert_eq!(action.submitted_by.as_str(), "alice");
}

#[tokio::test]
async fn submitting_to_a_missing_session_is_rejected() {
    let server = TestServer::spawn().await;
    let ghost = SessionId::new();

    let mut alice = server.connect().await;
    ws_send_client(
        &mut alice,
        &ClientMessage::JoinSession {
            session_id: ghost.to_string(),
            user_id: Some("alice".into()),
            player_name: None,
            mode: ParticipantRole::Player,
        },
    )
    .await;
    ws_expect_message(&mut alice, RECV_TIMEOUT, |m| {
        matches!(m, ServerMessage::JoinedSession { .. })
    })
    .await;

    ws_send_client(&mut alice, &submit(ghost.to_string(), None, "Hello?")).await;
    ws_expect_message(&mut alice, RECV_TIMEOUT, |m| {
        *m == ServerMessage::error("Session not found")
    })
    .await;
}

#[tokio::test]
async fn narrated_memory_and_history_are_kept() {
    let mut narrator = MockNarratorPort::new();
    narrator.expect_narrate().returning(|request| {
        assert_eq!(request.action, "I ask the innkeeper about the mill");
        let outcome: NarratorOutcome = serde_json::from_value(json!({
            "outcome": "partial",
            "narratives": [{ "level": "partial", "text": "The innkeeper hesitates." }],
            "memory_updates": [{ "key": "current_npc", "value": "Innkeeper Hollis", "replace": true }],
            "history_entry": { "summary": "Questioned the innkeeper" }
        }))
        .unwrap();
        Ok(outcome)
    });
    let server = TestServer::spawn_with(Arc::new(narrator), None).await;
    let session = server.create_session("gm").await;

    let mut alice = server.connect().await;
    ws_join(&mut alice, &session, Some("alice"), None, ParticipantRole::Player).await;
    ws_send_client(
        &mut alice,
        &submit(
            session.id().to_string(),
            None,
            "I ask the innkeeper about the mill",
        ),
    )
    .await;

    let ServerMessage::ActionResult { narrator_response, .. } =
        ws_expect_message(&mut alice, RECV_TIMEOUT, is_action_result).await
    else {
        unreachable!()
    };
    assert_eq!(narrator_response.outcome, OutcomeKind::Partial);
    ws_expect_message(&mut alice, RECV_TIMEOUT, |m| {
        matches!(m, ServerMessage::ActionSubmitted { success: true })
    })
    .await;

    let manage = &server.app.use_cases.session.manage;
    let memory = manage.memory(session.id()).await.unwrap();
    assert!(memory
        .iter()
        .any(|f| f.key == "current_npc" && f.value == "Innkeeper Hollis"));
    let history = manage.history(session.id()).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].summary, "Questioned the innkeeper");
}
