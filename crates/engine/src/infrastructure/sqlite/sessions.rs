//! SQLite-backed session storage.

use async_trait::async_trait;
use rollcall_domain::{
    CampaignId, RoomCode, Session, SessionId, SessionMaster, SessionName, SessionStatus, UserId,
};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::{map_db_err, parse_time};
use crate::infrastructure::ports::{RepoError, SessionRepo};

pub struct SqliteSessionRepo {
    pool: SqlitePool,
}

impl SqliteSessionRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

const SELECT_SESSION: &str = "SELECT id, owner_id, campaign_id, name, description, status, \
     room_code, created_at, updated_at FROM sessions";

fn row_to_session(row: &SqliteRow) -> Result<Session, RepoError> {
    let id: String = row.get("id");
    let owner_id: String = row.get("owner_id");
    let campaign_id: Option<String> = row.get("campaign_id");
    let name: String = row.get("name");
    let description: Option<String> = row.get("description");
    let status: String = row.get("status");
    let room_code: String = row.get("room_code");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    let campaign_id = campaign_id
        .map(|c| c.parse::<CampaignId>())
        .transpose()
        .map_err(RepoError::serialization)?;

    Ok(Session::from_parts(
        id.parse::<SessionId>().map_err(RepoError::serialization)?,
        UserId::from_trusted(owner_id),
        campaign_id,
        SessionName::new(name).map_err(RepoError::serialization)?,
        description,
        status.parse::<SessionStatus>().map_err(RepoError::serialization)?,
        RoomCode::parse(room_code).map_err(RepoError::serialization)?,
        parse_time(&created_at)?,
        parse_time(&updated_at)?,
    ))
}

#[async_trait]
impl SessionRepo for SqliteSessionRepo {
    async fn create_with_creator(
        &self,
        session: &Session,
        creator: &SessionMaster,
    ) -> Result<(), RepoError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(map_db_err("create_session"))?;

        sqlx::query(
            r#"
            INSERT INTO sessions
                (id, owner_id, campaign_id, name, description, status, room_code, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(session.id().to_string())
        .bind(session.owner_id().as_str())
        .bind(session.campaign_id().map(|c| c.to_string()))
        .bind(session.name().as_str())
        .bind(session.description())
        .bind(session.status().as_str())
        .bind(session.room_code().as_str())
        .bind(session.created_at().to_rfc3339())
        .bind(session.updated_at().to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(map_db_err("create_session"))?;

        sqlx::query(
            "INSERT INTO session_masters (session_id, user_id, is_original_creator, created_at) \
             VALUES (?, ?, 1, ?)",
        )
        .bind(creator.session_id.to_string())
        .bind(creator.user_id.as_str())
        .bind(creator.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(map_db_err("create_session"))?;

        tx.commit().await.map_err(map_db_err("create_session"))?;
        Ok(())
    }

    async fn get(&self, id: SessionId) -> Result<Option<Session>, RepoError> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_SESSION))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err("get_session"))?;
        row.as_ref().map(row_to_session).transpose()
    }

    async fn get_by_room_code(&self, code: &RoomCode) -> Result<Option<Session>, RepoError> {
        let row = sqlx::query(&format!("{} WHERE room_code = ?", SELECT_SESSION))
            .bind(code.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err("get_session_by_code"))?;
        row.as_ref().map(row_to_session).transpose()
    }

    async fn room_code_exists(&self, code: &RoomCode) -> Result<bool, RepoError> {
        let row = sqlx::query("SELECT 1 FROM sessions WHERE room_code = ? LIMIT 1")
            .bind(code.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_err("room_code_exists"))?;
        Ok(row.is_some())
    }

    async fn list_for_owner(&self, owner: &UserId) -> Result<Vec<Session>, RepoError> {
        let rows = sqlx::query(&format!(
            "{} WHERE owner_id = ? ORDER BY created_at DESC",
            SELECT_SESSION
        ))
        .bind(owner.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err("list_sessions"))?;
        rows.iter().map(row_to_session).collect()
    }

    async fn update(&self, session: &Session) -> Result<(), RepoError> {
        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET campaign_id = ?, name = ?, description = ?, status = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(session.campaign_id().map(|c| c.to_string()))
        .bind(session.name().as_str())
        .bind(session.description())
        .bind(session.status().as_str())
        .bind(session.updated_at().to_rfc3339())
        .bind(session.id().to_string())
        .execute(&self.pool)
        .await
        .map_err(map_db_err("update_session"))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::not_found("Session", session.id()));
        }
        Ok(())
    }

    async fn delete(&self, id: SessionId) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(map_db_err("delete_session"))?;
        Ok(())
    }
}
