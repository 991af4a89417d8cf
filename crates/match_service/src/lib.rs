pub mod backend;
pub mod catalog;
pub mod coordinator;
pub mod errors;
pub mod ledger;
pub mod session_manager;

pub use backend::{BackendError, InMemoryBackend, InMemoryBackendConfig, MatchmakingBackend};
pub use catalog::{CatalogHandle, CatalogLoadError};
pub use coordinator::{CoordinatorConfig, MatchmakingCoordinator};
pub use errors::{RewardError, SessionError, TicketError};
pub use ledger::{GrantOutcome, RewardLedger};
pub use session_manager::{
    EndSessionReport, RewardFlushResult, RewardFlushStatus, SessionManager,
};
