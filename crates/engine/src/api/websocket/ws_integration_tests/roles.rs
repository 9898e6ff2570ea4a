use super::*;

fn uid(s: &str) -> UserId {
    UserId::new(s).unwrap()
}

fn is_mode_update(m: &ServerMessage) -> bool {
    matches!(
        m,
        ServerMessage::ModeChanged { .. } | ServerMessage::UserModeUpdated { .. }
    )
}

#[tokio::test]
async fn promoted_player_joins_as_master() {
    let server = TestServer::spawn().await;
    let session = server.create_session("gm").await;
    server
        .app
        .use_cases
        .session
        .masters
        .promote(session.id(), &uid("gm"), &uid("bob"))
        .await
        .unwrap();

    let mut bob = server.connect().await;
    let mode = ws_join(&mut bob, &session, Some("bob"), None, ParticipantRole::Player).await;
    assert_eq!(mode, ParticipantRole::Master);
}

#[tokio::test]
async fn master_request_without_grant_is_downgraded() {
    let server = TestServer::spawn().await;
    let session = server.create_session("gm").await;

    let mut mallory = server.connect().await;
    let mode = ws_join(&mut mallory, &session, Some("mallory"), None, ParticipantRole::Master).await;
    assert_eq!(mode, ParticipantRole::Player);

    let users = server.connections.presence().list(session.id()).await;
    assert_eq!(users[0].role, ParticipantRole::Player);
}

#[tokio::test]
async fn master_request_needs_a_user_id() {
    let server = TestServer::spawn().await;
    let session = server.create_session("gm").await;

    let mut ws = server.connect().await;
    ws_send_client(
        &mut ws,
        &ClientMessage::JoinSession {
            session_id: session.id().to_string(),
            user_id: None,
            player_name: Some("Sneaky".into()),
            mode: ParticipantRole::Master,
        },
    )
    .await;
    assert_eq!(
        ws_recv_server(&mut ws).await,
        ServerMessage::error("User ID required for master mode")
    );
    assert!(!server.connections.presence().has_session(session.id()).await);
}

#[tokio::test]
async fn live_promotion_and_hand_off_update_connected_clients() {
    let server = TestServer::spawn().await;
    let session = server.create_session("gm").await;
    let masters = server.app.use_cases.session.masters.clone();

    let mut gm = server.connect().await;
    let mut bob = server.connect().await;
    let mut carol = server.connect().await;
    ws_join(&mut gm, &session, Some("gm"), None, ParticipantRole::Master).await;
    ws_join(&mut bob, &session, Some("bob"), None, ParticipantRole::Player).await;
    ws_join(&mut carol, &session, Some("carol"), None, ParticipantRole::Player).await;
    ws_expect_users(&mut gm, 3).await;

    masters
        .promote(session.id(), &uid("gm"), &uid("bob"))
        .await
        .unwrap();

    assert_eq!(
        ws_expect_message(&mut bob, RECV_TIMEOUT, |m| matches!(m, ServerMessage::ModeChanged { .. }))
            .await,
        ServerMessage::ModeChanged {
            mode: ParticipantRole::Master
        }
    );
    assert_eq!(
        ws_expect_message(&mut carol, RECV_TIMEOUT, is_mode_update).await,
        ServerMessage::UserModeUpdated {
            user_id: "bob".into(),
            mode: ParticipantRole::Master,
        }
    );
    ws_expect_message(&mut gm, RECV_TIMEOUT, |m| {
        matches!(m, ServerMessage::ConnectedUsersList { users }
            if users.iter().any(|u| u.user_id == "bob" && u.mode == ParticipantRole::Master))
    })
    .await;

    // carol replaces bob as the promoted master
    masters
        .promote(session.id(), &uid("gm"), &uid("carol"))
        .await
        .unwrap();

    assert_eq!(
        ws_expect_message(&mut bob, RECV_TIMEOUT, |m| matches!(m, ServerMessage::ModeChanged { .. }))
            .await,
        ServerMessage::ModeChanged {
            mode: ParticipantRole::Player
        }
    );
    assert_eq!(
        ws_expect_message(&mut carol, RECV_TIMEOUT, |m| matches!(m, ServerMessage::ModeChanged { .. }))
            .await,
        ServerMessage::ModeChanged {
            mode: ParticipantRole::Master
        }
    );

    let roles: Vec<(String, ParticipantRole)> = server
        .connections
        .presence()
        .list(session.id())
        .await
        .into_iter()
        .map(|p| (p.user_id.to_string(), p.role))
        .collect();
    assert!(roles.contains(&("bob".to_string(), ParticipantRole::Player)));
    assert!(roles.contains(&("carol".to_string(), ParticipantRole::Master)));
    assert!(roles.contains(&("gm".to_string(), ParticipantRole::Master)));
}

#[tokio::test]
async fn bound_identity_outranks_payload_user() {
    let server = TestServer::spawn().await;
    let session = server.create_session("gm").await;

    let mut ws = server.connect_as("gm").await;
    let mode = ws_join(&mut ws, &session, Some("mallory"), None, ParticipantRole::Master).await;
    assert_eq!(mode, ParticipantRole::Master);

    let users = server.connections.presence().list(session.id()).await;
    assert_eq!(users[0].user_id.as_str(), "gm");
}
