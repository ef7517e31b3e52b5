use prep_core::model::{Session, SessionId, UserId};

use super::SqliteRepository;
use super::mapping::{map_session_row, ser, user_id_from_str};
use crate::repository::{NewSessionRecord, SessionRepository, StorageError};
use sqlx::Row;

const SESSION_COLUMNS: &str = r"
    id, user_id, subject, correct_questions, total_questions,
    difficulty, confidence, guess_percent, time_taken_minutes,
    kind, created_at
";

#[async_trait::async_trait]
impl SessionRepository for SqliteRepository {
    async fn insert_session(&self, record: NewSessionRecord) -> Result<SessionId, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO sessions (
                    user_id, subject, correct_questions, total_questions,
                    difficulty, confidence, guess_percent, time_taken_minutes,
                    kind, created_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ",
        )
        .bind(record.user_id.to_string())
        .bind(record.subject.as_str())
        .bind(i64::from(record.correct_questions))
        .bind(i64::from(record.total_questions))
        .bind(record.difficulty.as_str())
        .bind(record.confidence.as_str())
        .bind(i64::from(record.guess_percent))
        .bind(i64::from(record.time_taken_minutes))
        .bind(record.kind.as_str())
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(SessionId::new(res.last_insert_rowid()))
    }

    async fn delete_session(&self, user_id: UserId, id: SessionId) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
                DELETE FROM sessions
                WHERE id = ?1 AND user_id = ?2
            ",
        )
        .bind(id.value())
        .bind(user_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn sessions_for_user(&self, user_id: UserId) -> Result<Vec<Session>, StorageError> {
        let sql = format!(
            r"
                SELECT {SESSION_COLUMNS}
                FROM sessions
                WHERE user_id = ?1
            "
        );

        let rows = sqlx::query(&sql)
            .bind(user_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_session_row(&row)?);
        }
        Ok(out)
    }

    async fn sessions_by_user(&self) -> Result<Vec<(UserId, Vec<Session>)>, StorageError> {
        let sql = format!(
            r"
                SELECT {SESSION_COLUMNS}
                FROM sessions
                ORDER BY user_id ASC, id ASC
            "
        );

        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        // Rows arrive sorted by user, so one sequential pass groups them.
        let mut out: Vec<(UserId, Vec<Session>)> = Vec::new();
        for row in rows {
            let user_id =
                user_id_from_str(row.try_get::<String, _>("user_id").map_err(ser)?.as_str())?;
            let session = map_session_row(&row)?;
            match out.last_mut() {
                Some((current, sessions)) if *current == user_id => sessions.push(session),
                _ => out.push((user_id, vec![session])),
            }
        }
        Ok(out)
    }
}
