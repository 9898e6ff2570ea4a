//! SQLite persistence.
//!
//! One pool shared by all repositories. The schema is created on start-up;
//! ids are stored as text, timestamps as RFC 3339 text, JSON payloads as text.

mod actions;
mod chronicle;
mod masters;
mod sessions;

pub use actions::SqliteActionRepo;
pub use chronicle::SqliteChronicleRepo;
pub use masters::SqliteMasterGrantRepo;
pub use sessions::SqliteSessionRepo;

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::infrastructure::ports::RepoError;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS sessions (
        id TEXT PRIMARY KEY NOT NULL,
        owner_id TEXT NOT NULL,
        campaign_id TEXT,
        name TEXT NOT NULL,
        description TEXT,
        status TEXT NOT NULL,
        room_code TEXT NOT NULL UNIQUE,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_sessions_owner ON sessions(owner_id)",
    r#"
    CREATE TABLE IF NOT EXISTS session_masters (
        session_id TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
        user_id TEXT NOT NULL,
        is_original_creator INTEGER NOT NULL,
        created_at TEXT NOT NULL,
        UNIQUE (session_id, user_id)
    )
    "#,
    // at most one creator row and one promoted row per session
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS idx_session_masters_creator
        ON session_masters(session_id) WHERE is_original_creator = 1
    "#,
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS idx_session_masters_promoted
        ON session_masters(session_id) WHERE is_original_creator = 0
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS session_actions (
        id TEXT PRIMARY KEY NOT NULL,
        session_id TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
        submitted_by TEXT NOT NULL,
        character_id TEXT,
        action TEXT NOT NULL,
        dice_json TEXT NOT NULL,
        context_json TEXT,
        outcome TEXT NOT NULL,
        narrative_json TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_session_actions_session ON session_actions(session_id, created_at)",
    r#"
    CREATE TABLE IF NOT EXISTS session_memory (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
        key TEXT NOT NULL,
        value TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS session_history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
        summary TEXT NOT NULL,
        timestamp TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS session_images (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
        prompt_id TEXT NOT NULL,
        image_url TEXT NOT NULL,
        metadata_json TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
];

/// Open (creating if needed) the database and apply the schema.
///
/// Accepts either a `sqlite:` URL or a plain file path.
pub async fn connect(database: &str) -> Result<SqlitePool, RepoError> {
    let url = if database.starts_with("sqlite:") {
        database.to_string()
    } else {
        format!("sqlite:{}", database)
    };

    let options = SqliteConnectOptions::from_str(&url)
        .map_err(|e| RepoError::database("connect", e))?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .map_err(|e| RepoError::database("connect", e))?;

    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(&pool)
            .await
            .map_err(|e| RepoError::database("migrate", e))?;
    }

    Ok(pool)
}

/// Map a sqlx error, surfacing uniqueness violations as constraint errors.
pub(crate) fn map_db_err(operation: &'static str) -> impl Fn(sqlx::Error) -> RepoError {
    move |e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepoError::constraint(format!("{}: {}", operation, db.message()))
        }
        _ => RepoError::database(operation, e),
    }
}

pub(crate) fn parse_time(value: &str) -> Result<DateTime<Utc>, RepoError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| RepoError::serialization(format!("bad timestamp '{}': {}", value, e)))
}
