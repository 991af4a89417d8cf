use match_core::SessionState;
use match_store::StoreError;
use thiserror::Error;

/// Error granting or reading rewards.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RewardError {
    /// The id is not in the loaded catalog.
    #[error("reward id {0:?} is not in the catalog")]
    InvalidRewardId(String),
    /// The catalog itself is not loaded. Distinct from an unknown id.
    #[error("reward catalog is not loaded")]
    CatalogUnavailable,
    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Error operating on a session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    /// Unknown id, or a record the store has purged; the two are
    /// indistinguishable by design.
    #[error("session {0:?} not found")]
    NotFound(String),
    #[error("session {id:?} is not active (state: {state:?})")]
    NotActive { id: String, state: SessionState },
    #[error(transparent)]
    Reward(#[from] RewardError),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Error requesting or inspecting a matchmaking ticket.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TicketError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// The backend has no record: expired, wrong id, or never created.
    /// Not retryable.
    #[error("ticket {0:?} not found")]
    NotFound(String),
    #[error("matchmaking backend error: {0}")]
    Backend(String),
    #[error(transparent)]
    Storage(#[from] StoreError),
}
