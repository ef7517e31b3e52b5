use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use prep_core::model::{
    Confidence, Difficulty, Session, SessionId, SessionKind, Subject, UserId, ValidatedSession,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Insert shape for a session that has passed boundary validation but has
/// no storage id yet.
///
/// Mirrors the domain record so repositories can persist without leaking
/// storage concerns into the domain layer.
#[derive(Debug, Clone)]
pub struct NewSessionRecord {
    pub user_id: UserId,
    pub subject: Subject,
    pub correct_questions: u32,
    pub total_questions: u32,
    pub difficulty: Difficulty,
    pub confidence: Confidence,
    pub guess_percent: u32,
    pub time_taken_minutes: u32,
    pub kind: SessionKind,
    pub created_at: DateTime<Utc>,
}

impl NewSessionRecord {
    #[must_use]
    pub fn from_validated(validated: &ValidatedSession) -> Self {
        let draft = validated.draft();
        Self {
            user_id: draft.user_id,
            subject: draft.subject,
            correct_questions: draft.correct_questions,
            total_questions: draft.total_questions,
            difficulty: draft.difficulty,
            confidence: draft.confidence,
            guess_percent: draft.guess_percent,
            time_taken_minutes: draft.time_taken_minutes,
            kind: draft.kind,
            created_at: validated.created_at(),
        }
    }
}

/// Persisted projection of a user's overall prep score.
///
/// A cache of the last recomputation, overwritten on every write; the
/// authoritative value is always re-derivable from the session set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrepScoreSnapshot {
    pub user_id: UserId,
    pub score: f64,
    pub updated_at: DateTime<Utc>,
}

/// Repository contract for session records.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Persist a new session and return its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the session cannot be stored.
    async fn insert_session(&self, record: NewSessionRecord) -> Result<SessionId, StorageError>;

    /// Delete a session owned by the given user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the session does not exist or
    /// belongs to a different user.
    async fn delete_session(&self, user_id: UserId, id: SessionId) -> Result<(), StorageError>;

    /// Fetch every session for one user. No ordering contract; scoring is
    /// order-independent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or decode failure.
    async fn sessions_for_user(&self, user_id: UserId) -> Result<Vec<Session>, StorageError>;

    /// Fetch every user's sessions, grouped per user, in a deterministic
    /// user order (leaderboard input).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or decode failure.
    async fn sessions_by_user(&self) -> Result<Vec<(UserId, Vec<Session>)>, StorageError>;
}

/// Repository contract for the persisted prep-score projection.
#[async_trait]
pub trait PrepScoreRepository: Send + Sync {
    /// Insert or overwrite the user's score snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be stored.
    async fn upsert_score(
        &self,
        user_id: UserId,
        score: f64,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Fetch the user's score snapshot, if one has been persisted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on connection or decode failure.
    async fn get_score(&self, user_id: UserId) -> Result<Option<PrepScoreSnapshot>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    sessions: Arc<Mutex<Vec<Session>>>,
    scores: Arc<Mutex<HashMap<UserId, PrepScoreSnapshot>>>,
    next_id: Arc<Mutex<i64>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for InMemoryRepository {
    async fn insert_session(&self, record: NewSessionRecord) -> Result<SessionId, StorageError> {
        let id = {
            let mut next = self
                .next_id
                .lock()
                .map_err(|e| StorageError::Connection(e.to_string()))?;
            *next += 1;
            SessionId::new(*next)
        };

        let session = Session::from_persisted(
            id,
            record.user_id,
            record.subject,
            record.correct_questions,
            record.total_questions,
            record.difficulty,
            record.confidence,
            record.guess_percent,
            record.time_taken_minutes,
            record.kind,
            record.created_at,
        )
        .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let mut guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.push(session);
        Ok(id)
    }

    async fn delete_session(&self, user_id: UserId, id: SessionId) -> Result<(), StorageError> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let before = guard.len();
        guard.retain(|s| !(s.id() == id && s.user_id() == user_id));
        if guard.len() == before {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn sessions_for_user(&self, user_id: UserId) -> Result<Vec<Session>, StorageError> {
        let guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .iter()
            .filter(|s| s.user_id() == user_id)
            .cloned()
            .collect())
    }

    async fn sessions_by_user(&self) -> Result<Vec<(UserId, Vec<Session>)>, StorageError> {
        let guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        // Group by user in first-insertion order so callers see a
        // deterministic sequence.
        let mut order: Vec<UserId> = Vec::new();
        let mut grouped: HashMap<UserId, Vec<Session>> = HashMap::new();
        for session in guard.iter() {
            let user = session.user_id();
            if !grouped.contains_key(&user) {
                order.push(user);
            }
            grouped.entry(user).or_default().push(session.clone());
        }

        Ok(order
            .into_iter()
            .map(|user| {
                let sessions = grouped.remove(&user).unwrap_or_default();
                (user, sessions)
            })
            .collect())
    }
}

#[async_trait]
impl PrepScoreRepository for InMemoryRepository {
    async fn upsert_score(
        &self,
        user_id: UserId,
        score: f64,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .scores
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(
            user_id,
            PrepScoreSnapshot {
                user_id,
                score,
                updated_at,
            },
        );
        Ok(())
    }

    async fn get_score(&self, user_id: UserId) -> Result<Option<PrepScoreSnapshot>, StorageError> {
        let guard = self
            .scores
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&user_id).cloned())
    }
}

/// Aggregates session and score repositories behind trait objects for easy
/// backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub sessions: Arc<dyn SessionRepository>,
    pub scores: Arc<dyn PrepScoreRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let sessions: Arc<dyn SessionRepository> = Arc::new(repo.clone());
        let scores: Arc<dyn PrepScoreRepository> = Arc::new(repo);
        Self { sessions, scores }
    }
}
