#![forbid(unsafe_code)]

pub mod app_services;
pub mod dashboard;
pub mod error;
pub mod leaderboard;
pub mod session_service;

pub use prep_core::Clock;

pub use app_services::AppServices;
pub use dashboard::{Dashboard, DashboardService};
pub use error::{AppServicesError, DashboardError, LeaderboardError, SessionLogError};
pub use leaderboard::{LeaderboardEntry, LeaderboardService};
pub use session_service::{LoggedSession, SessionService};
