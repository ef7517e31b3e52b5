use chrono::{DateTime, Utc};
use prep_core::model::UserId;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{ser, user_id_from_str};
use crate::repository::{PrepScoreRepository, PrepScoreSnapshot, StorageError};

#[async_trait::async_trait]
impl PrepScoreRepository for SqliteRepository {
    async fn upsert_score(
        &self,
        user_id: UserId,
        score: f64,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO prep_scores (user_id, score, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(user_id) DO UPDATE SET
                    score = excluded.score,
                    updated_at = excluded.updated_at
            ",
        )
        .bind(user_id.to_string())
        .bind(score)
        .bind(updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn get_score(&self, user_id: UserId) -> Result<Option<PrepScoreSnapshot>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT user_id, score, updated_at
                FROM prep_scores
                WHERE user_id = ?1
            ",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(PrepScoreSnapshot {
            user_id: user_id_from_str(row.try_get::<String, _>("user_id").map_err(ser)?.as_str())?,
            score: row.try_get("score").map_err(ser)?,
            updated_at: row.try_get("updated_at").map_err(ser)?,
        }))
    }
}
