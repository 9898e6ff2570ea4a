use super::*;

fn perception_check(session: &Session) -> ClientMessage {
    ClientMessage::RequestDiceRoll {
        session_id: session.id().to_string(),
        requested_for: Some("bob".into()),
        formula: "1d20+5".into(),
        target: Some(15),
        context: Some("Perception".into()),
    }
}

fn eighteen() -> DiceRollResult {
    DiceRollResult {
        roll: 18,
        formula: "1d20+5".into(),
        natural: Some(18),
        target: Some(15),
    }
}

struct Table {
    server: TestServer,
    session: Session,
    gm: WsStream,
    bob: WsStream,
    screen: WsStream,
}

/// Master, addressed player and a presentation screen in one session.
async fn table() -> Table {
    let server = TestServer::spawn().await;
    let session = server.create_session("gm").await;

    let mut gm = server.connect().await;
    let mut bob = server.connect().await;
    let mut screen = server.connect().await;
    assert_eq!(
        ws_join(&mut gm, &session, Some("gm"), Some("GM"), ParticipantRole::Master).await,
        ParticipantRole::Master
    );
    ws_join(&mut bob, &session, Some("bob"), Some("Bob"), ParticipantRole::Player).await;
    ws_join(&mut screen, &session, None, None, ParticipantRole::Presentation).await;

    Table {
        server,
        session,
        gm,
        bob,
        screen,
    }
}

async fn expect_requested(ws: &mut WsStream) -> rollcall_shared::DiceRollRequestData {
    match ws_expect_message(ws, RECV_TIMEOUT, |m| {
        matches!(m, ServerMessage::DiceRollRequested(_))
    })
    .await
    {
        ServerMessage::DiceRollRequested(data) => data,
        _ => unreachable!(),
    }
}

async fn expect_completed(ws: &mut WsStream) -> rollcall_shared::DiceRollRequestData {
    match ws_expect_message(ws, RECV_TIMEOUT, |m| {
        matches!(m, ServerMessage::DiceRollCompleted(_))
    })
    .await
    {
        ServerMessage::DiceRollCompleted(data) => data,
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn mediated_roll_reaches_everyone_both_ways() {
    let Table {
        server: _server,
        session,
        mut gm,
        mut bob,
        mut screen,
        ..
    } = table().await;

    ws_send_client(&mut gm, &perception_check(&session)).await;

    let seen_by_bob = expect_requested(&mut bob).await;
    assert_eq!(seen_by_bob.status, DiceRollStatus::Pending);
    assert!(!seen_by_bob.id.is_empty());
    assert_eq!(seen_by_bob.requested_by, "gm");
    assert_eq!(seen_by_bob.requested_for, "bob");
    assert_eq!(expect_requested(&mut screen).await.id, seen_by_bob.id);
    assert_eq!(expect_requested(&mut gm).await.id, seen_by_bob.id);

    ws_send_client(
        &mut bob,
        &ClientMessage::DiceRollCompleted {
            request_id: seen_by_bob.id.clone(),
            session_id: session.id().to_string(),
            result: eighteen(),
        },
    )
    .await;

    for ws in [&mut gm, &mut bob, &mut screen] {
        let done = expect_completed(ws).await;
        assert_eq!(done.id, seen_by_bob.id);
        assert_eq!(done.status, DiceRollStatus::Submitted);
        assert_eq!(done.requested_for, "bob");
        assert_eq!(done.requested_by, "gm");
        assert_eq!(done.result, Some(eighteen()));
    }
}

#[tokio::test]
async fn rolls_need_a_session_membership() {
    let Table {
        server,
        session,
        mut gm,
        ..
    } = table().await;
    let mut stranger = server.connect().await;

    ws_send_client(&mut stranger, &perception_check(&session)).await;
    assert_eq!(
        ws_recv_server(&mut stranger).await,
        ServerMessage::error("Not joined to a session")
    );

    ws_send_client(
        &mut stranger,
        &ClientMessage::DiceRollCompleted {
            request_id: "dice-1-abc".into(),
            session_id: session.id().to_string(),
            result: eighteen(),
        },
    )
    .await;
    assert_eq!(
        ws_recv_server(&mut stranger).await,
        ServerMessage::error("Not joined to a session")
    );

    ws_expect_no_message_matching(&mut gm, QUIET_PERIOD, |m| {
        matches!(
            m,
            ServerMessage::DiceRollRequested(_) | ServerMessage::DiceRollCompleted(_)
        )
    })
    .await;
}

#[tokio::test]
async fn only_masters_request_and_a_target_is_required() {
    let Table {
        server: _server,
        session,
        mut gm,
        mut bob,
        ..
    } = table().await;

    ws_send_client(&mut bob, &perception_check(&session)).await;
    ws_expect_message(&mut bob, RECV_TIMEOUT, |m| {
        *m == ServerMessage::error("Only masters can request dice rolls")
    })
    .await;

    ws_send_client(
        &mut gm,
        &ClientMessage::RequestDiceRoll {
            session_id: session.id().to_string(),
            requested_for: None,
            formula: "1d20".into(),
            target: None,
            context: None,
        },
    )
    .await;
    ws_expect_message(&mut gm, RECV_TIMEOUT, |m| {
        *m == ServerMessage::error("requestedFor is required")
    })
    .await;
}

#[tokio::test]
async fn only_the_addressee_completes_and_only_once() {
    let Table {
        server,
        session,
        mut gm,
        mut bob,
        ..
    } = table().await;
    let mut mallory = server.connect().await;
    ws_join(&mut mallory, &session, Some("mallory"), None, ParticipantRole::Player).await;

    ws_send_client(&mut gm, &perception_check(&session)).await;
    let request = expect_requested(&mut bob).await;
    let complete = ClientMessage::DiceRollCompleted {
        request_id: request.id.clone(),
        session_id: session.id().to_string(),
        result: eighteen(),
    };

    ws_send_client(&mut mallory, &complete).await;
    ws_expect_message(&mut mallory, RECV_TIMEOUT, |m| {
        *m == ServerMessage::error("Dice roll request is addressed to another player")
    })
    .await;

    ws_send_client(&mut bob, &complete).await;
    expect_completed(&mut gm).await;

    ws_send_client(&mut bob, &complete).await;
    ws_expect_message(&mut bob, RECV_TIMEOUT, |m| {
        *m == ServerMessage::error("Dice roll request not found or expired")
    })
    .await;
}

#[tokio::test]
async fn presentation_screen_cannot_complete() {
    let Table {
        server: _server,
        session,
        mut gm,
        mut screen,
        ..
    } = table().await;

    ws_send_client(&mut gm, &perception_check(&session)).await;
    let request = expect_requested(&mut screen).await;

    ws_send_client(
        &mut screen,
        &ClientMessage::DiceRollCompleted {
            request_id: request.id,
            session_id: session.id().to_string(),
            result: eighteen(),
        },
    )
    .await;
    ws_expect_message(&mut screen, RECV_TIMEOUT, |m| {
        *m == ServerMessage::error("Presentation mode cannot complete dice rolls")
    })
    .await;
}
