use thiserror::Error;

/// Failure talking to a backing store. Mutating store operations are
/// conditional writes, so callers may retry on this without risking
/// duplicate effects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
