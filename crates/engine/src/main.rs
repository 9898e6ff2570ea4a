//! Rollcall engine - main entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::header::HeaderName;
use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rollcall_engine::api::{self, ConnectionManager, WsState};
use rollcall_engine::app::{Repositories, Services};
use rollcall_engine::infrastructure::{
    clock::{SystemClock, SystemRandom},
    config::EngineConfig,
    image_gen::StabilityClient,
    narrator::NarratorClient,
    ports::{ClockPort, ImageGenPort},
    sqlite::{self, SqliteActionRepo, SqliteChronicleRepo, SqliteMasterGrantRepo, SqliteSessionRepo},
};
use rollcall_engine::stores::{PendingDiceRequests, PresenceRegistry};
use rollcall_engine::App;

/// How often expired dice roll requests are dropped.
const DICE_PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (the engine may be started from `crates/engine`).
    load_dotenv_from_repo_root();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rollcall_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Rollcall engine");

    let config = EngineConfig::from_env();
    let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());

    tracing::info!(database = %config.database, "Opening SQLite database");
    let pool = sqlite::connect(&config.database).await?;

    let repos = Repositories {
        sessions: Arc::new(SqliteSessionRepo::new(pool.clone())),
        masters: Arc::new(SqliteMasterGrantRepo::new(pool.clone())),
        actions: Arc::new(SqliteActionRepo::new(pool.clone())),
        chronicle: Arc::new(SqliteChronicleRepo::new(pool, clock.clone())),
    };

    tracing::info!(
        url = %config.ai_service_url,
        timeout_secs = config.ai_request_timeout.as_secs(),
        "Narrator configured"
    );
    let narrator = Arc::new(NarratorClient::new(
        &config.ai_service_url,
        config.ai_request_timeout,
    ));
    let image_gen: Option<Arc<dyn ImageGenPort>> = match &config.image_service_url {
        Some(url) => {
            tracing::info!(url = %url, "Image generation enabled");
            Some(Arc::new(StabilityClient::new(
                url,
                config.image_service_api_key.clone(),
            )))
        }
        None => {
            tracing::info!("IMAGE_SERVICE_URL not set, image generation disabled");
            None
        }
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
        Arc::new(PendingDiceRequests::new(config.dice_request_ttl)),
        connections.clone(),
    ));
    let ws_state = Arc::new(WsState::new(app.clone(), connections));

    // Drop dice requests nobody answered
    let purge_app = app.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(DICE_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let purged = purge_app.use_cases.dice.purge_expired().await;
            if purged > 0 {
                tracing::debug!(purged, "Purged expired dice roll requests");
            }
        }
    });

    let mut router = api::router(app, ws_state).layer(TraceLayer::new_for_http());

    if let Some(cors) = config
        .cors_allowed_origins
        .as_deref()
        .and_then(build_cors_layer)
    {
        router = router.layer(cors);
    }

    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}

fn build_cors_layer(allowed_origins: &str) -> Option<CorsLayer> {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        // Clients send X-User-Id and JSON bodies, both of which trigger preflights.
        .allow_headers([
            HeaderName::from_static("x-user-id"),
            axum::http::header::CONTENT_TYPE,
        ]);

    if allowed_origins == "*" {
        return Some(cors.allow_origin(Any));
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| HeaderValue::from_str(s).ok())
        .collect();

    if origins.is_empty() {
        tracing::warn!(value = allowed_origins, "CORS_ALLOWED_ORIGINS has no usable origins");
        return None;
    }

    Some(cors.allow_origin(origins))
}
