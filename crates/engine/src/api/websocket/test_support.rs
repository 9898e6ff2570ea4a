use super::*;

use std::{net::SocketAddr, time::Duration};

use rollcall_domain::{ParticipantRole, Session};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{client::IntoClientRequest, http::HeaderValue, Message as WsMessage},
    MaybeTlsStream, WebSocketStream,
};

use crate::app::{Repositories, Services};
use crate::infrastructure::clock::{SystemClock, SystemRandom};
use crate::infrastructure::ports::{
    ClockPort, ImageGenPort, MockNarratorPort, NarrationError, NarratorPort,
};
use crate::infrastructure::sqlite::{
    test_db, SqliteActionRepo, SqliteChronicleRepo, SqliteMasterGrantRepo, SqliteSessionRepo,
};
use crate::stores::{PendingDiceRequests, PresenceRegistry};
use crate::use_cases::session::CreateSessionInput;

pub(crate) use rollcall_shared::{ClientMessage, ServerMessage};

pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

pub(crate) const RECV_TIMEOUT: Duration = Duration::from_secs(3);
pub(crate) const QUIET_PERIOD: Duration = Duration::from_millis(300);

/// A narrator that is always down, so actions take the fallback path.
pub(crate) fn offline_narrator() -> Arc<dyn NarratorPort> {
    let mut narrator = MockNarratorPort::new();
    narrator
        .expect_narrate()
        .returning(|_| Err(NarrationError::RequestFailed("narrator offline".into())));
    Arc::new(narrator)
}

/// The full engine on an ephemeral port, backed by a temp SQLite file.
pub(crate) struct TestServer {
    pub addr: SocketAddr,
    pub app: Arc<App>,
    pub connections: Arc<ConnectionManager>,
    _db: TempDir,
    handle: tokio::task::JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl TestServer {
    pub(crate) async fn spawn() -> Self {
        Self::spawn_with(offline_narrator(), None).await
    }

    pub(crate) async fn spawn_with(
        narrator: Arc<dyn NarratorPort>,
        image_gen: Option<Arc<dyn ImageGenPort>>,
    ) -> Self {
        let (db, pool) = test_db::fresh().await;
        let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());

        let repos = Repositories {
            sessions: Arc::new(SqliteSessionRepo::new(pool.clone())),
            masters: Arc::new(SqliteMasterGrantRepo::new(pool.clone())),
            actions: Arc::new(SqliteActionRepo::new(pool.clone())),
            chronicle: Arc::new(SqliteChronicleRepo::new(pool, clock.clone())),
        };
        let services = Services {
            narrator,
            image_gen,
            clock,
            random: Arc::new(SystemRandom::new()),
        };

        let presence = Arc::new(PresenceRegistry::new());
        let connections = Arc::new(ConnectionManager::new(presence.clone()));
        let app = Arc::new(App::new(
            repos,
            services,
            presence,
            Arc::new(PendingDiceRequests::new(Duration::from_secs(1800))),
            connections.clone(),
        ));
        let ws_state = Arc::new(WsState::new(app.clone(), connections.clone()));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = crate::api::router(app.clone(), ws_state);
        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            addr,
            app,
            connections,
            _db: db,
            handle,
        }
    }

    pub(crate) fn http(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub(crate) async fn create_session(&self, owner: &str) -> Session {
        self.app
            .use_cases
            .session
            .create
            .execute(CreateSessionInput {
                owner: UserId::new(owner).unwrap(),
                name: "Test Session".into(),
                description: None,
                campaign_id: None,
            })
            .await
            .unwrap()
    }

    pub(crate) async fn connect(&self) -> WsStream {
        let (ws, _resp) = connect_async(format!("ws://{}/ws", self.addr))
            .await
            .unwrap();
        ws
    }

    /// Connect as if the auth proxy had vouched for `user`.
    pub(crate) async fn connect_as(&self, user: &str) -> WsStream {
        let mut request = format!("ws://{}/ws", self.addr)
            .into_client_request()
            .unwrap();
        request
            .headers_mut()
            .insert(USER_ID_HEADER_NAME, HeaderValue::from_str(user).unwrap());
        let (ws, _resp) = connect_async(request).await.unwrap();
        ws
    }
}

const USER_ID_HEADER_NAME: &str = crate::api::http::USER_ID_HEADER;

pub(crate) async fn ws_send_client(ws: &mut WsStream, msg: &ClientMessage) {
    let json = serde_json::to_string(msg).unwrap();
    ws.send(WsMessage::Text(json.into())).await.unwrap();
}

pub(crate) async fn ws_send_raw(ws: &mut WsStream, text: &str) {
    ws.send(WsMessage::Text(text.to_string().into()))
        .await
        .unwrap();
}

pub(crate) async fn ws_recv_server(ws: &mut WsStream) -> ServerMessage {
    loop {
        let msg = ws.next().await.unwrap().unwrap();
        if let WsMessage::Text(text) = msg {
            return serde_json::from_str::<ServerMessage>(&text).unwrap();
        }
    }
}

pub(crate) async fn ws_expect_message<F>(
    ws: &mut WsStream,
    timeout: Duration,
    mut predicate: F,
) -> ServerMessage
where
    F: FnMut(&ServerMessage) -> bool,
{
    tokio::time::timeout(timeout, async {
        loop {
            let msg = ws_recv_server(ws).await;
            if predicate(&msg) {
                return msg;
            }
        }
    })
    .await
    .unwrap()
}

pub(crate) async fn ws_expect_no_message_matching<F>(
    ws: &mut WsStream,
    timeout: Duration,
    mut predicate: F,
) where
    F: FnMut(&ServerMessage) -> bool,
{
    let result = tokio::time::timeout(timeout, async {
        loop {
            let msg = ws_recv_server(ws).await;
            if predicate(&msg) {
                panic!("unexpected message: {:?}", msg);
            }
        }
    })
    .await;

    // We only succeed if we timed out without seeing a matching message.
    assert!(result.is_err());
}

/// Wait for the server to close the socket.
pub(crate) async fn ws_expect_close(ws: &mut WsStream, timeout: Duration) {
    tokio::time::timeout(timeout, async {
        loop {
            match ws.next().await {
                None | Some(Ok(WsMessage::Close(_))) | Some(Err(_)) => return,
                Some(Ok(_)) => {}
            }
        }
    })
    .await
    .unwrap()
}

/// Join and wait for `joined_session`; returns the effective role.
pub(crate) async fn ws_join(
    ws: &mut WsStream,
    session: &Session,
    user_id: Option<&str>,
    player_name: Option<&str>,
    mode: ParticipantRole,
) -> ParticipantRole {
    ws_send_client(
        ws,
        &ClientMessage::JoinSession {
            session_id: session.id().to_string(),
            user_id: user_id.map(str::to_string),
            player_name: player_name.map(str::to_string),
            mode,
        },
    )
    .await;
    match ws_expect_message(ws, RECV_TIMEOUT, |m| {
        matches!(
            m,
            ServerMessage::JoinedSession { .. } | ServerMessage::Error { .. }
        )
    })
    .await
    {
        ServerMessage::JoinedSession { mode, .. } => mode,
        other => panic!("join failed: {:?}", other),
    }
}

/// Wait until the session's users list has `count` entries.
pub(crate) async fn ws_expect_users(ws: &mut WsStream, count: usize) -> ServerMessage {
    ws_expect_message(ws, RECV_TIMEOUT, |m| {
        matches!(m, ServerMessage::ConnectedUsersList { users } if users.len() == count)
    })
    .await
}
