//! SQLite-backed master authority grants.

use async_trait::async_trait;
use rollcall_domain::{SessionId, SessionMaster, UserId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::{map_db_err, parse_time};
use crate::infrastructure::ports::{MasterGrantRepo, RepoError};

pub struct SqliteMasterGrantRepo {
    pool: SqlitePool,
}

impl SqliteMasterGrantRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_grant(row: &SqliteRow) -> Result<SessionMaster, RepoError> {
    let session_id: String = row.get("session_id");
    let user_id: String = row.get("user_id");
    let is_original_creator: bool = row.get("is_original_creator");
    let created_at: String = row.get("created_at");

    Ok(SessionMaster {
        session_id: session_id
            .parse::<SessionId>()
            .map_err(RepoError::serialization)?,
        user_id: UserId::from_trusted(user_id),
        is_original_creator,
        created_at: parse_time(&created_at)?,
    })
}

#[async_trait]
impl MasterGrantRepo for SqliteMasterGrantRepo {
    async fn list(&self, session_id: SessionId) -> Result<Vec<SessionMaster>, RepoError> {
        let rows = sqlx::query(
            "SELECT session_id, user_id, is_original_creator, created_at \
             FROM session_masters WHERE session_id = ? \
             ORDER BY is_original_creator DESC, created_at ASC",
        )
        .bind(session_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err("list_masters"))?;
        rows.iter().map(row_to_grant).collect()
    }

    async fn get(
        &self,
        session_id: SessionId,
        user_id: &UserId,
    ) -> Result<Option<SessionMaster>, RepoError> {
        let row = sqlx::query(
            "SELECT session_id, user_id, is_original_creator, created_at \
             FROM session_masters WHERE session_id = ? AND user_id = ?",
        )
        .bind(session_id.to_string())
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_err("get_master"))?;
        row.as_ref().map(row_to_grant).transpose()
    }

    async fn insert(&self, grant: &SessionMaster) -> Result<(), RepoError> {
        sqlx::query(
            "INSERT INTO session_masters (session_id, user_id, is_original_creator, created_at) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(grant.session_id.to_string())
        .bind(grant.user_id.as_str())
        .bind(grant.is_original_creator)
        .bind(grant.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(map_db_err("insert_master"))?;
        Ok(())
    }

    async fn delete_promoted(
        &self,
        session_id: SessionId,
        user_id: &UserId,
    ) -> Result<bool, RepoError> {
        let result = sqlx::query(
            "DELETE FROM session_masters \
             WHERE session_id = ? AND user_id = ? AND is_original_creator = 0",
        )
        .bind(session_id.to_string())
        .bind(user_id.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_db_err("delete_master"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn hand_off(
        &self,
        session_id: SessionId,
        grant: &SessionMaster,
    ) -> Result<Vec<UserId>, RepoError> {
        if grant.is_original_creator || grant.session_id != session_id {
            return Err(RepoError::constraint(
                "hand_off expects a promoted grant for the same session",
            ));
        }

        let mut tx = self.pool.begin().await.map_err(map_db_err("hand_off"))?;

        let demoted: Vec<String> = sqlx::query_scalar(
            "SELECT user_id FROM session_masters \
             WHERE session_id = ? AND is_original_creator = 0 AND user_id != ?",
        )
        .bind(session_id.to_string())
        .bind(grant.user_id.as_str())
        .fetch_all(&mut *tx)
        .await
        .map_err(map_db_err("hand_off"))?;

        sqlx::query("DELETE FROM session_masters WHERE session_id = ? AND is_original_creator = 0")
            .bind(session_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(map_db_err("hand_off"))?;

        sqlx::query(
            "INSERT INTO session_masters (session_id, user_id, is_original_creator, created_at) \
             VALUES (?, ?, 0, ?)",
        )
        .bind(session_id.to_string())
        .bind(grant.user_id.as_str())
        .bind(grant.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(map_db_err("hand_off"))?;

        tx.commit().await.map_err(map_db_err("hand_off"))?;

        Ok(demoted.into_iter().map(UserId::from_trusted).collect())
    }
}
