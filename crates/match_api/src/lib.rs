pub mod dto;
pub mod error;
pub mod routes;

use match_service::{MatchmakingCoordinator, RewardLedger, SessionManager};
use std::sync::Arc;

pub use error::ApiError;
pub use routes::router;

/// Shared service state behind every handler.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<MatchmakingCoordinator>,
    pub sessions: Arc<SessionManager>,
    pub ledger: Arc<RewardLedger>,
}
