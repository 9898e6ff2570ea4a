use super::*;

async fn wait_for_collection_gone(server: &TestServer, session_id: SessionId) {
    tokio::time::timeout(RECV_TIMEOUT, async {
        while server.connections.presence().has_session(session_id).await {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn join_announces_newcomer_and_refreshes_list() {
    let server = TestServer::spawn().await;
    let session = server.create_session("gm").await;

    let mut alice = server.connect().await;
    let mode = ws_join(&mut alice, &session, Some("alice"), Some("Alice"), ParticipantRole::Player).await;
    assert_eq!(mode, ParticipantRole::Player);
    ws_expect_users(&mut alice, 1).await;

    let mut bob = server.connect().await;
    ws_join(&mut bob, &session, Some("bob"), Some("Bob"), ParticipantRole::Player).await;

    let joined = ws_expect_message(&mut alice, RECV_TIMEOUT, |m| {
        matches!(m, ServerMessage::UserJoined { user_id, .. } if user_id == "bob")
    })
    .await;
    let ServerMessage::UserJoined { player_name, mode, .. } = joined else {
        unreachable!()
    };
    assert_eq!(player_name.as_deref(), Some("Bob"));
    assert_eq!(mode, ParticipantRole::Player);

    let ServerMessage::ConnectedUsersList { users } = ws_expect_users(&mut alice, 2).await else {
        unreachable!()
    };
    let ids: Vec<&str> = users.iter().map(|u| u.user_id.as_str()).collect();
    assert_eq!(ids, vec!["alice", "bob"]);
}

#[tokio::test]
async fn disconnect_of_one_member_emits_exactly_one_user_left() {
    let server = TestServer::spawn().await;
    let session = server.create_session("gm").await;

    let mut alice = server.connect().await;
    let mut bob = server.connect().await;
    let mut carol = server.connect().await;
    ws_join(&mut alice, &session, Some("alice"), None, ParticipantRole::Player).await;
    ws_join(&mut bob, &session, Some("bob"), None, ParticipantRole::Player).await;
    ws_join(&mut carol, &session, Some("carol"), None, ParticipantRole::Player).await;
    ws_expect_users(&mut alice, 3).await;

    carol.close(None).await.unwrap();

    ws_expect_message(&mut alice, RECV_TIMEOUT, |m| {
        matches!(m, ServerMessage::UserLeft { user_id } if user_id == "carol")
    })
    .await;
    ws_expect_users(&mut alice, 2).await;
    ws_expect_no_message_matching(&mut alice, QUIET_PERIOD, |m| {
        matches!(m, ServerMessage::UserLeft { .. })
    })
    .await;

    assert_eq!(
        server.connections.presence().list(session.id()).await.len(),
        2
    );
}

#[tokio::test]
async fn last_member_leaving_discards_the_collection() {
    let server = TestServer::spawn().await;
    let session = server.create_session("gm").await;

    let mut screen = server.connect().await;
    ws_join(&mut screen, &session, None, None, ParticipantRole::Presentation).await;
    assert!(server.connections.presence().has_session(session.id()).await);

    screen.close(None).await.unwrap();
    wait_for_collection_gone(&server, session.id()).await;
}

#[tokio::test]
async fn explicit_leave_notifies_the_rest() {
    let server = TestServer::spawn().await;
    let session = server.create_session("gm").await;

    let mut alice = server.connect().await;
    let mut bob = server.connect().await;
    ws_join(&mut alice, &session, Some("alice"), None, ParticipantRole::Player).await;
    ws_join(&mut bob, &session, Some("bob"), None, ParticipantRole::Player).await;

    ws_send_client(
        &mut bob,
        &ClientMessage::LeaveSession {
            session_id: session.id().to_string(),
        },
    )
    .await;

    ws_expect_message(&mut alice, RECV_TIMEOUT, |m| {
        matches!(m, ServerMessage::UserLeft { user_id } if user_id == "bob")
    })
    .await;
    ws_expect_users(&mut alice, 1).await;
}

#[tokio::test]
async fn duplicate_connection_of_same_user_is_closed() {
    let server = TestServer::spawn().await;
    let session = server.create_session("gm").await;

    let mut first_tab = server.connect().await;
    ws_join(&mut first_tab, &session, Some("alice"), None, ParticipantRole::Player).await;

    let mut second_tab = server.connect().await;
    ws_join(&mut second_tab, &session, Some("alice"), None, ParticipantRole::Player).await;

    ws_expect_close(&mut first_tab, RECV_TIMEOUT).await;
    let ServerMessage::ConnectedUsersList { users } = ws_expect_users(&mut second_tab, 1).await
    else {
        unreachable!()
    };
    assert_eq!(users[0].user_id, "alice");
}

#[tokio::test]
async fn anonymous_players_do_not_evict_each_other() {
    let server = TestServer::spawn().await;
    let session = server.create_session("gm").await;

    let mut one = server.connect().await;
    let mut two = server.connect().await;
    ws_join(&mut one, &session, None, Some("Guest"), ParticipantRole::Player).await;
    ws_join(&mut two, &session, None, Some("Guest"), ParticipantRole::Player).await;

    ws_expect_users(&mut one, 2).await;
}

#[tokio::test]
async fn joining_another_session_leaves_the_first() {
    let server = TestServer::spawn().await;
    let first = server.create_session("gm").await;
    let second = server.create_session("gm").await;

    let mut alice = server.connect().await;
    let mut bob = server.connect().await;
    ws_join(&mut alice, &first, Some("alice"), None, ParticipantRole::Player).await;
    ws_join(&mut bob, &first, Some("bob"), None, ParticipantRole::Player).await;
    ws_expect_users(&mut alice, 2).await;

    ws_join(&mut bob, &second, Some("bob"), None, ParticipantRole::Player).await;

    ws_expect_message(&mut alice, RECV_TIMEOUT, |m| {
        matches!(m, ServerMessage::UserLeft { user_id } if user_id == "bob")
    })
    .await;
    assert_eq!(server.connections.presence().list(second.id()).await.len(), 1);
}

#[tokio::test]
async fn rename_rebroadcasts_user_joined() {
    let server = TestServer::spawn().await;
    let session = server.create_session("gm").await;

    let mut alice = server.connect().await;
    ws_join(&mut alice, &session, Some("alice"), Some("Alice"), ParticipantRole::Player).await;

    ws_send_client(
        &mut alice,
        &ClientMessage::UpdatePlayerName {
            session_id: session.id().to_string(),
            player_name: "Alice the Bold".into(),
        },
    )
    .await;

    ws_expect_message(&mut alice, RECV_TIMEOUT, |m| {
        matches!(
            m,
            ServerMessage::UserJoined { player_name: Some(name), .. } if name == "Alice the Bold"
        )
    })
    .await;
    let ServerMessage::ConnectedUsersList { users } = ws_expect_message(&mut alice, RECV_TIMEOUT, |m| {
        matches!(m, ServerMessage::ConnectedUsersList { users }
            if users.iter().any(|u| u.player_name.as_deref() == Some("Alice the Bold")))
    })
    .await
    else {
        unreachable!()
    };
    assert_eq!(users.len(), 1);
}

#[tokio::test]
async fn rename_outside_a_session_is_an_error() {
    let server = TestServer::spawn().await;
    let session = server.create_session("gm").await;

    let mut stranger = server.connect().await;
    ws_send_client(
        &mut stranger,
        &ClientMessage::UpdatePlayerName {
            session_id: session.id().to_string(),
            player_name: "Nobody".into(),
        },
    )
    .await;
    let msg = ws_recv_server(&mut stranger).await;
    assert_eq!(msg, ServerMessage::error("Not in a session"));

    // the session exists in presence, but this connection is not part of it
    let mut alice = server.connect().await;
    ws_join(&mut alice, &session, Some("alice"), None, ParticipantRole::Player).await;
    ws_send_client(
        &mut stranger,
        &ClientMessage::UpdatePlayerName {
            session_id: session.id().to_string(),
            player_name: "Nobody".into(),
        },
    )
    .await;
    let msg = ws_recv_server(&mut stranger).await;
    assert_eq!(msg, ServerMessage::error("User not found in session"));
}

#[tokio::test]
async fn users_list_request_is_unicast() {
    let server = TestServer::spawn().await;
    let session = server.create_session("gm").await;

    let mut alice = server.connect().await;
    ws_join(&mut alice, &session, Some("alice"), None, ParticipantRole::Player).await;
    ws_expect_users(&mut alice, 1).await;

    let mut observer = server.connect().await;
    ws_send_client(
        &mut observer,
        &ClientMessage::RequestUsersList {
            session_id: session.id().to_string(),
        },
    )
    .await;
    let ServerMessage::ConnectedUsersList { users } = ws_recv_server(&mut observer).await else {
        panic!("expected users list");
    };
    assert_eq!(users.len(), 1);

    ws_expect_no_message_matching(&mut alice, QUIET_PERIOD, |m| {
        matches!(m, ServerMessage::ConnectedUsersList { .. })
    })
    .await;
}

#[tokio::test]
async fn request_update_is_relayed_with_requester() {
    let server = TestServer::spawn().await;
    let session = server.create_session("gm").await;

    let mut gm = server.connect().await;
    let mut screen = server.connect().await;
    ws_join(&mut gm, &session, Some("gm"), None, ParticipantRole::Master).await;
    ws_join(&mut screen, &session, None, None, ParticipantRole::Presentation).await;

    ws_send_client(
        &mut gm,
        &ClientMessage::RequestUpdate {
            session_id: session.id().to_string(),
            update_type: "scene".into(),
        },
    )
    .await;

    let msg = ws_expect_message(&mut screen, RECV_TIMEOUT, |m| {
        matches!(m, ServerMessage::UpdateRequested { .. })
    })
    .await;
    assert_eq!(
        msg,
        ServerMessage::UpdateRequested {
            update_type: "scene".into(),
            requested_by: "gm".into(),
        }
    );

    let refresh = ClientMessage::RequestUpdate {
        session_id: session.id().to_string(),
        update_type: "scene".into(),
    };

    let mut stranger = server.connect().await;
    ws_send_client(&mut stranger, &refresh).await;
    assert_eq!(
        ws_recv_server(&mut stranger).await,
        ServerMessage::error("Not joined to a session")
    );

    // joined, but to a different table
    let elsewhere = server.create_session("gm").await;
    ws_join(&mut stranger, &elsewhere, Some("eve"), None, ParticipantRole::Player).await;
    ws_send_client(&mut stranger, &refresh).await;
    ws_expect_message(&mut stranger, RECV_TIMEOUT, |m| {
        *m == ServerMessage::error("Invalid session")
    })
    .await;
}

#[tokio::test]
async fn reserved_anonymous_id_cannot_be_claimed() {
    let server = TestServer::spawn().await;
    let session = server.create_session("gm").await;

    let mut ws = server.connect().await;
    ws_send_client(
        &mut ws,
        &ClientMessage::JoinSession {
            session_id: session.id().to_string(),
            user_id: Some("anonymous".into()),
            player_name: None,
            mode: ParticipantRole::Player,
        },
    )
    .await;
    let ServerMessage::Error { message } = ws_recv_server(&mut ws).await else {
        panic!("expected an error");
    };
    assert!(message.contains("reserved"));
    assert!(!server.connections.presence().has_session(session.id()).await);
}

#[tokio::test]
async fn heartbeat_and_malformed_frames() {
    let server = TestServer::spawn().await;
    let mut ws = server.connect().await;

    ws_send_client(&mut ws, &ClientMessage::Heartbeat).await;
    assert_eq!(ws_recv_server(&mut ws).await, ServerMessage::Pong);

    ws_send_raw(&mut ws, "{not json").await;
    assert_eq!(
        ws_recv_server(&mut ws).await,
        ServerMessage::error("Invalid message format")
    );

    ws_send_raw(&mut ws, r#"{"event":"cast_fireball","data":{}}"#).await;
    assert_eq!(
        ws_recv_server(&mut ws).await,
        ServerMessage::error("Invalid message format")
    );
}
