//! SQLite-backed action log.

use async_trait::async_trait;
use rollcall_domain::{ActionId, ActionRecord, CharacterId, SessionId, UserId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::{map_db_err, parse_time};
use crate::infrastructure::ports::{ActionRepo, RepoError};

pub struct SqliteActionRepo {
    pool: SqlitePool,
}

impl SqliteActionRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn from_json<T: serde::de::DeserializeOwned>(text: &str) -> Result<T, RepoError> {
    serde_json::from_str(text).map_err(RepoError::serialization)
}

fn row_to_action(row: &SqliteRow) -> Result<ActionRecord, RepoError> {
    let id: String = row.get("id");
    let session_id: String = row.get("session_id");
    let submitted_by: String = row.get("submitted_by");
    let character_id: Option<String> = row.get("character_id");
    let dice_json: String = row.get("dice_json");
    let context_json: Option<String> = row.get("context_json");
    let narrative_json: String = row.get("narrative_json");
    let created_at: String = row.get("created_at");

    let narrative: rollcall_domain::NarratorOutcome = from_json(&narrative_json)?;

    Ok(ActionRecord {
        id: id.parse::<ActionId>().map_err(RepoError::serialization)?,
        session_id: session_id
            .parse::<SessionId>()
            .map_err(RepoError::serialization)?,
        submitted_by: UserId::from_trusted(submitted_by),
        character_id: character_id
            .map(|c| c.parse::<CharacterId>())
            .transpose()
            .map_err(RepoError::serialization)?,
        action: row.get("action"),
        dice: from_json(&dice_json)?,
        context: context_json.as_deref().map(from_json).transpose()?,
        outcome: narrative.outcome,
        narrative,
        created_at: parse_time(&created_at)?,
    })
}

#[async_trait]
impl ActionRepo for SqliteActionRepo {
    async fn save(&self, record: &ActionRecord) -> Result<(), RepoError> {
        let dice_json = serde_json::to_string(&record.dice).map_err(RepoError::serialization)?;
        let narrative_json =
            serde_json::to_string(&record.narrative).map_err(RepoError::serialization)?;
        let context_json = record
            .context
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(RepoError::serialization)?;

        sqlx::query(
            r#"
            INSERT INTO session_actions
                (id, session_id, submitted_by, character_id, action, dice_json,
                 context_json, outcome, narrative_json, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id.to_string())
        .bind(record.session_id.to_string())
        .bind(record.submitted_by.as_str())
        .bind(record.character_id.map(|c| c.to_string()))
        .bind(&record.action)
        .bind(dice_json)
        .bind(context_json)
        .bind(record.outcome.as_str())
        .bind(narrative_json)
        .bind(record.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(map_db_err("save_action"))?;
        Ok(())
    }

    async fn list_for_session(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<ActionRecord>, RepoError> {
        let rows = sqlx::query(
            "SELECT id, session_id, submitted_by, character_id, action, dice_json, \
             context_json, narrative_json, created_at \
             FROM session_actions WHERE session_id = ? ORDER BY created_at ASC",
        )
        .bind(session_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err("list_actions"))?;
        rows.iter().map(row_to_action).collect()
    }
}
