use std::sync::Arc;

use prep_core::scoring::ScoreEngine;
use storage::repository::Storage;

use crate::Clock;
use crate::dashboard::DashboardService;
use crate::error::AppServicesError;
use crate::leaderboard::LeaderboardService;
use crate::session_service::SessionService;

/// Assembles app-facing services around one shared score engine.
///
/// Sharing the engine is what guarantees the dashboard, the post-write
/// snapshot, and the leaderboard all apply the same canonical algorithm
/// (same decay, same blend, same tables).
#[derive(Clone)]
pub struct AppServices {
    sessions: Arc<SessionService>,
    dashboard: Arc<DashboardService>,
    leaderboard: Arc<LeaderboardService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::with_storage(storage, clock))
    }

    /// Build services over an existing storage aggregate (in-memory in
    /// tests, SQLite in the app).
    #[must_use]
    pub fn with_storage(storage: Storage, clock: Clock) -> Self {
        let engine = ScoreEngine::new().with_clock(clock);

        let sessions = Arc::new(SessionService::new(
            engine.clone(),
            Arc::clone(&storage.sessions),
            Arc::clone(&storage.scores),
        ));
        let dashboard = Arc::new(DashboardService::new(
            engine.clone(),
            Arc::clone(&storage.sessions),
        ));
        let leaderboard = Arc::new(LeaderboardService::new(
            engine,
            Arc::clone(&storage.sessions),
        ));

        Self {
            sessions,
            dashboard,
            leaderboard,
        }
    }

    #[must_use]
    pub fn sessions(&self) -> Arc<SessionService> {
        Arc::clone(&self.sessions)
    }

    #[must_use]
    pub fn dashboard(&self) -> Arc<DashboardService> {
        Arc::clone(&self.dashboard)
    }

    #[must_use]
    pub fn leaderboard(&self) -> Arc<LeaderboardService> {
        Arc::clone(&self.leaderboard)
    }
}
