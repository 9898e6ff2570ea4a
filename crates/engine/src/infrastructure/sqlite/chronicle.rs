//! SQLite-backed session memory, history and images.

use std::sync::Arc;

use async_trait::async_trait;
use rollcall_domain::{ChronicleEntry, MemoryFact, MemoryUpdate, SessionId, SessionImage};
use sqlx::{Row, SqlitePool};

use super::{map_db_err, parse_time};
use crate::infrastructure::ports::{ChronicleRepo, ClockPort, RepoError};

pub struct SqliteChronicleRepo {
    pool: SqlitePool,
    clock: Arc<dyn ClockPort>,
}

impl SqliteChronicleRepo {
    pub fn new(pool: SqlitePool, clock: Arc<dyn ClockPort>) -> Self {
        Self { pool, clock }
    }
}

#[async_trait]
impl ChronicleRepo for SqliteChronicleRepo {
    async fn load_memory(&self, session_id: SessionId) -> Result<Vec<MemoryFact>, RepoError> {
        let rows = sqlx::query(
            "SELECT key, value, created_at FROM session_memory WHERE session_id = ? ORDER BY id ASC",
        )
        .bind(session_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err("load_memory"))?;

        rows.iter()
            .map(|row| {
                let created_at: String = row.get("created_at");
                Ok(MemoryFact {
                    key: row.get("key"),
                    value: row.get("value"),
                    created_at: parse_time(&created_at)?,
                })
            })
            .collect()
    }

    async fn apply_memory_updates(
        &self,
        session_id: SessionId,
        updates: &[MemoryUpdate],
    ) -> Result<(), RepoError> {
        if updates.is_empty() {
            return Ok(());
        }
        let now = self.clock.now().to_rfc3339();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(map_db_err("apply_memory_updates"))?;

        for update in updates {
            if update.replace {
                sqlx::query("DELETE FROM session_memory WHERE session_id = ? AND key = ?")
                    .bind(session_id.to_string())
                    .bind(&update.key)
                    .execute(&mut *tx)
                    .await
                    .map_err(map_db_err("apply_memory_updates"))?;
            }
            sqlx::query(
                "INSERT INTO session_memory (session_id, key, value, created_at) VALUES (?, ?, ?, ?)",
            )
            .bind(session_id.to_string())
            .bind(&update.key)
            .bind(&update.value)
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(map_db_err("apply_memory_updates"))?;
        }

        tx.commit()
            .await
            .map_err(map_db_err("apply_memory_updates"))?;
        Ok(())
    }

    async fn append_history(&self, entry: &ChronicleEntry) -> Result<(), RepoError> {
        sqlx::query("INSERT INTO session_history (session_id, summary, timestamp) VALUES (?, ?, ?)")
            .bind(entry.session_id.to_string())
            .bind(&entry.summary)
            .bind(entry.timestamp.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(map_db_err("append_history"))?;
        Ok(())
    }

    async fn save_image(&self, image: &SessionImage) -> Result<(), RepoError> {
        let metadata = serde_json::to_string(&image.metadata).map_err(RepoError::serialization)?;
        sqlx::query(
            "INSERT INTO session_images (session_id, prompt_id, image_url, metadata_json, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(image.session_id.to_string())
        .bind(&image.prompt_id)
        .bind(&image.image_url)
        .bind(metadata)
        .bind(image.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(map_db_err("save_image"))?;
        Ok(())
    }

    async fn list_history(&self, session_id: SessionId) -> Result<Vec<ChronicleEntry>, RepoError> {
        let rows = sqlx::query(
            "SELECT summary, timestamp FROM session_history WHERE session_id = ? \
             ORDER BY timestamp ASC, id ASC",
        )
        .bind(session_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err("list_history"))?;

        rows.iter()
            .map(|row| {
                let timestamp: String = row.get("timestamp");
                Ok(ChronicleEntry {
                    session_id,
                    summary: row.get("summary"),
                    timestamp: parse_time(&timestamp)?,
                })
            })
            .collect()
    }
}
