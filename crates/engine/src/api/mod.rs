//! API layer - HTTP and WebSocket entry points.

use std::sync::Arc;

use axum::{routing::get, Router};

pub mod connections;
pub mod http;
pub mod websocket;

pub use connections::ConnectionManager;
pub use websocket::WsState;

use crate::app::App;

/// HTTP routes plus the `/ws` upgrade, state applied.
pub fn router(app: Arc<App>, ws_state: Arc<WsState>) -> Router {
    http::routes()
        .with_state(app)
        .route("/ws", get(websocket::ws_handler).with_state(ws_state))
}
