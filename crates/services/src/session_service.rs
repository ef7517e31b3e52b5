use std::sync::Arc;

use prep_core::model::{Session, SessionDraft, SessionId, UserId};
use prep_core::scoring::ScoreEngine;
use storage::repository::{NewSessionRecord, PrepScoreRepository, SessionRepository};

use crate::error::SessionLogError;

//
// ─── LOGGED SESSION ────────────────────────────────────────────────────────────
//

/// Result of logging a session: the stored record plus the freshly
/// recomputed overall prep score.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggedSession {
    pub session: Session,
    pub overall_score: f64,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Coordinates the session write path: boundary validation, persistence,
/// and the full prep-score recomputation that follows every write.
///
/// There is no incremental path. Each write re-fetches the authoritative
/// session set and overwrites the persisted score projection, so the
/// snapshot can only ever lag by whatever the storage layer's own write
/// ordering allows (two concurrent tabs race on the projection, not on
/// the session records themselves).
pub struct SessionService {
    engine: ScoreEngine,
    sessions: Arc<dyn SessionRepository>,
    scores: Arc<dyn PrepScoreRepository>,
}

impl SessionService {
    #[must_use]
    pub fn new(
        engine: ScoreEngine,
        sessions: Arc<dyn SessionRepository>,
        scores: Arc<dyn PrepScoreRepository>,
    ) -> Self {
        Self {
            engine,
            sessions,
            scores,
        }
    }

    /// Validate and persist a session, then recompute and store the
    /// user's overall prep score.
    ///
    /// Validation happens here, at the boundary: the scoring core assumes
    /// the record invariants hold and has no recovery path for a
    /// zero-question or over-correct record.
    ///
    /// # Errors
    ///
    /// Returns `SessionLogError::Validation` if the draft violates the
    /// record invariants, or `SessionLogError::Storage` if persistence
    /// fails.
    pub async fn log_session(&self, draft: SessionDraft) -> Result<LoggedSession, SessionLogError> {
        let user_id = draft.user_id;
        let validated = draft.validate(self.engine.now())?;

        let record = NewSessionRecord::from_validated(&validated);
        let id = self.sessions.insert_session(record).await?;
        let session = validated.assign_id(id);

        let overall_score = self.recompute_and_store(user_id).await?;

        Ok(LoggedSession {
            session,
            overall_score,
        })
    }

    /// Delete a session owned by the user, then recompute and store the
    /// overall prep score. Returns the fresh score.
    ///
    /// Deleting a non-negative-scoring record can only lower (or leave
    /// unchanged) the affected subject's blended score; the recomputation
    /// makes that visible immediately.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` (wrapped) if the session does not
    /// exist or belongs to another user.
    pub async fn delete_session(
        &self,
        user_id: UserId,
        id: SessionId,
    ) -> Result<f64, SessionLogError> {
        self.sessions.delete_session(user_id, id).await?;
        Ok(self.recompute_and_store(user_id).await?)
    }

    /// Re-derive the overall score from the authoritative session set and
    /// overwrite the persisted projection.
    async fn recompute_and_store(
        &self,
        user_id: UserId,
    ) -> Result<f64, storage::repository::StorageError> {
        let sessions = self.sessions.sessions_for_user(user_id).await?;
        let score = self.engine.overall_prep_score(&sessions);
        self.scores
            .upsert_score(user_id, score, self.engine.now())
            .await?;
        Ok(score)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
