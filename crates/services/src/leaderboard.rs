use std::cmp::Ordering;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use prep_core::model::UserId;
use prep_core::scoring::ScoreEngine;
use storage::repository::SessionRepository;

use crate::error::LeaderboardError;

/// One leaderboard row. Ranks are 1-based and assigned after ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub user_id: UserId,
    pub score: f64,
}

/// Ranks every user by overall prep score.
///
/// Uses the same decay-aware engine as the dashboard and the post-write
/// snapshot, recomputed live from every user's session set, so the
/// leaderboard can never disagree with a user's own dashboard about the
/// algorithm.
pub struct LeaderboardService {
    engine: ScoreEngine,
    sessions: Arc<dyn SessionRepository>,
}

impl LeaderboardService {
    #[must_use]
    pub fn new(engine: ScoreEngine, sessions: Arc<dyn SessionRepository>) -> Self {
        Self { engine, sessions }
    }

    /// Compute the full standings: a total order by score descending.
    ///
    /// Ties keep the repository's deterministic user order (stable sort).
    /// A score of exactly 0 means "no data" rather than measured
    /// performance, so zero-scorers are placed at the bottom in their
    /// original relative order regardless of how they would tie
    /// numerically.
    ///
    /// # Errors
    ///
    /// Returns `LeaderboardError::Storage` if the grouped fetch fails.
    pub async fn standings(&self) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let grouped = self.sessions.sessions_by_user().await?;

        let mut scored: Vec<(UserId, f64)> = Vec::with_capacity(grouped.len());
        let mut unscored: Vec<(UserId, f64)> = Vec::new();
        for (user_id, sessions) in &grouped {
            let score = self.engine.overall_prep_score(sessions);
            if score == 0.0 {
                unscored.push((*user_id, score));
            } else {
                scored.push((*user_id, score));
            }
        }

        // Stable sort keeps insertion order for equal scores.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.extend(unscored);

        Ok(scored
            .into_iter()
            .zip(1_u32..)
            .map(|((user_id, score), rank)| LeaderboardEntry {
                rank,
                user_id,
                score,
            })
            .collect())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use prep_core::model::{
        Confidence, Difficulty, SessionDraft, SessionKind, Subject,
    };
    use prep_core::time::{fixed_clock, fixed_now};
    use storage::repository::{InMemoryRepository, NewSessionRecord, SessionRepository};

    async fn insert_scoring_session(repo: &InMemoryRepository, user_id: UserId, correct: u32) {
        let validated = SessionDraft {
            user_id,
            subject: Subject::Medicine,
            correct_questions: correct,
            total_questions: 10,
            difficulty: Difficulty::Medium,
            confidence: Confidence::Medium,
            guess_percent: 0,
            time_taken_minutes: 30,
            kind: SessionKind::Mock,
        }
        .validate(fixed_now())
        .unwrap();
        repo.insert_session(NewSessionRecord::from_validated(&validated))
            .await
            .unwrap();
    }

    fn service(repo: &InMemoryRepository) -> LeaderboardService {
        LeaderboardService::new(
            ScoreEngine::new().with_clock(fixed_clock()),
            Arc::new(repo.clone()),
        )
    }

    #[tokio::test]
    async fn standings_order_by_score_descending() {
        let repo = InMemoryRepository::new();
        let weaker = UserId::new_random();
        let stronger = UserId::new_random();

        insert_scoring_session(&repo, weaker, 4).await;
        insert_scoring_session(&repo, stronger, 9).await;

        let standings = service(&repo).standings().await.unwrap();
        assert_eq!(standings.len(), 2);
        assert_eq!(standings[0].user_id, stronger);
        assert_eq!(standings[0].rank, 1);
        assert_eq!(standings[1].user_id, weaker);
        assert_eq!(standings[1].rank, 2);
        assert!(standings[0].score > standings[1].score);
    }

    #[tokio::test]
    async fn ties_keep_repository_order() {
        let repo = InMemoryRepository::new();
        let first = UserId::new_random();
        let second = UserId::new_random();

        insert_scoring_session(&repo, first, 7).await;
        insert_scoring_session(&repo, second, 7).await;

        let standings = service(&repo).standings().await.unwrap();
        assert_eq!(standings[0].user_id, first);
        assert_eq!(standings[1].user_id, second);
        assert_eq!(standings[0].score, standings[1].score);
    }

    #[tokio::test]
    async fn zero_scorers_sink_to_the_bottom() {
        let repo = InMemoryRepository::new();
        let empty_user = UserId::new_random();
        let scoring_user = UserId::new_random();

        // A session scoring exactly zero still counts as "no data".
        let validated = SessionDraft {
            user_id: empty_user,
            subject: Subject::Histology,
            correct_questions: 0,
            total_questions: 10,
            difficulty: Difficulty::Hard,
            confidence: Confidence::High,
            guess_percent: 0,
            time_taken_minutes: 10,
            kind: SessionKind::Practice,
        }
        .validate(fixed_now())
        .unwrap();
        repo.insert_session(NewSessionRecord::from_validated(&validated))
            .await
            .unwrap();

        insert_scoring_session(&repo, scoring_user, 5).await;

        let standings = service(&repo).standings().await.unwrap();
        assert_eq!(standings[0].user_id, scoring_user);
        assert_eq!(standings[1].user_id, empty_user);
        assert_eq!(standings[1].score, 0.0);
        assert_eq!(standings[1].rank, 2);
    }

    #[tokio::test]
    async fn empty_world_yields_empty_standings() {
        let repo = InMemoryRepository::new();
        let standings = service(&repo).standings().await.unwrap();
        assert!(standings.is_empty());
    }
}
