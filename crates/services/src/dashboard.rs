use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use prep_core::model::UserId;
use prep_core::scoring::{ScoreEngine, SubjectScore};
use storage::repository::SessionRepository;

use crate::error::DashboardError;

/// Derived read model for one user's dashboard render.
///
/// Recomputed from the freshly fetched session set on every call; nothing
/// here is cached, and decay means two renders of unchanged data can
/// differ. `generated_at` is the instant every row was scored against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub user_id: UserId,
    pub overall_score: f64,
    pub subjects: Vec<SubjectScore>,
    pub generated_at: DateTime<Utc>,
}

/// Derives per-subject and overall scores for display.
pub struct DashboardService {
    engine: ScoreEngine,
    sessions: Arc<dyn SessionRepository>,
}

impl DashboardService {
    #[must_use]
    pub fn new(engine: ScoreEngine, sessions: Arc<dyn SessionRepository>) -> Self {
        Self { engine, sessions }
    }

    /// Build the dashboard for one user from the authoritative session
    /// set. Always returns all 17 subject rows; subjects without sessions
    /// show a blended score of 0.
    ///
    /// # Errors
    ///
    /// Returns `DashboardError::Storage` if the session fetch fails.
    pub async fn dashboard_for(&self, user_id: UserId) -> Result<Dashboard, DashboardError> {
        let sessions = self.sessions.sessions_for_user(user_id).await?;

        let subjects = self.engine.subject_breakdown(&sessions);
        let overall_score = self.engine.overall_from_breakdown(&subjects);

        Ok(Dashboard {
            user_id,
            overall_score,
            subjects,
            generated_at: self.engine.now(),
        })
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
    use prep_core::time::fixed_clock;
    use storage::repository::{InMemoryRepository, NewSessionRecord, SessionRepository};

    async fn insert(
        repo: &InMemoryRepository,
        user_id: UserId,
        subject: Subject,
        correct: u32,
        kind: SessionKind,
    ) {
        let validated = SessionDraft {
            user_id,
            subject,
            correct_questions: correct,
            total_questions: 10,
            difficulty: Difficulty::Medium,
            confidence: Confidence::High,
            guess_percent: 0,
            time_taken_minutes: 30,
            kind,
        }
        .validate(prep_core::time::fixed_now())
        .unwrap();
        repo.insert_session(NewSessionRecord::from_validated(&validated))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn empty_user_gets_a_zero_dashboard_with_all_rows() {
        let repo = InMemoryRepository::new();
        let service = DashboardService::new(
            ScoreEngine::new().with_clock(fixed_clock()),
            Arc::new(repo),
        );

        let dashboard = service.dashboard_for(UserId::new_random()).await.unwrap();
        assert_eq!(dashboard.overall_score, 0.0);
        assert_eq!(dashboard.subjects.len(), 17);
        assert!(dashboard.subjects.iter().all(|row| row.blended == 0.0));
    }

    #[tokio::test]
    async fn dashboard_rows_agree_with_the_headline_score() {
        let repo = InMemoryRepository::new();
        let user = UserId::new_random();
        insert(&repo, user, Subject::Medicine, 8, SessionKind::Mock).await;
        insert(&repo, user, Subject::Anatomy, 6, SessionKind::Practice).await;

        let engine = ScoreEngine::new().with_clock(fixed_clock());
        let service = DashboardService::new(engine.clone(), Arc::new(repo.clone()));

        let dashboard = service.dashboard_for(user).await.unwrap();
        let direct = engine.overall_prep_score(&repo.sessions_for_user(user).await.unwrap());
        assert_eq!(dashboard.overall_score, direct);

        let medicine = dashboard
            .subjects
            .iter()
            .find(|row| row.subject == Subject::Medicine)
            .unwrap();
        assert!(medicine.blended > 0.0);
        assert_eq!(medicine.practice_mean, 0.0);
    }
}
