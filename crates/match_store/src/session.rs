use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use match_core::{InteractionEvent, SessionRecord, SessionState, SessionSummary};

/// Outcome of a conditional session insert.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A live record with this id already exists; the insert did nothing.
    AlreadyExists,
}

/// Fields to set atomically with a state transition.
#[derive(Clone, Copy, Debug, Default)]
pub struct TransitionEffects {
    pub end_time: Option<DateTime<Utc>>,
    pub ttl: Option<i64>,
}

/// Outcome of a compare-and-swap on the session state field.
#[derive(Clone, Debug, PartialEq)]
pub enum StateTransition {
    /// The swap applied; the record after the transition is returned.
    Applied(SessionRecord),
    /// The record was not in the expected state; its actual state is returned.
    WrongState(SessionState),
    NotFound,
}

/// Outcome of a conditional event append.
#[derive(Clone, Debug, PartialEq)]
pub enum EventAppend {
    /// Appended; carries the event count after the append.
    Appended(usize),
    WrongState(SessionState),
    NotFound,
}

/// Outcome of a conditional pending-reward add.
#[derive(Clone, Debug, PartialEq)]
pub enum PendingRewardAdd {
    /// Added (or already pending); carries the pending list after the call.
    Added(Vec<String>),
    WrongState(SessionState),
    NotFound,
}

/// Time-bounded store of session records and summaries.
///
/// The store purges (or treats as absent) any record whose `ttl` has passed;
/// callers never delete ephemeral data themselves, and a read past expiry is
/// indistinguishable from a record that never existed.
///
/// All mutation is conditional: state changes are compare-and-swap on the
/// state field, appends are conditional on `state == Active`. Implementations
/// must preserve per-session append order for events, or timestamp-sort on
/// read if the underlying store cannot.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert a new record iff no live record with this id exists.
    async fn insert_session(&self, record: SessionRecord) -> Result<InsertOutcome, StoreError>;

    async fn get_session(&self, session_id: &str) -> Result<Option<SessionRecord>, StoreError>;

    /// Compare-and-swap the state field, applying `effects` with the swap.
    async fn transition_state(
        &self,
        session_id: &str,
        from: SessionState,
        to: SessionState,
        effects: TransitionEffects,
    ) -> Result<StateTransition, StoreError>;

    /// Append a gameplay event, conditional on the session being `Active`.
    async fn append_event(
        &self,
        session_id: &str,
        event: InteractionEvent,
    ) -> Result<EventAppend, StoreError>;

    /// Add a pending reward, conditional on the session being `Active`.
    /// Duplicate ids within one session are absorbed.
    async fn add_pending_reward(
        &self,
        session_id: &str,
        reward_id: &str,
    ) -> Result<PendingRewardAdd, StoreError>;

    /// Write a summary, keyed `(player_id, session_id)`. Overwrite is
    /// permitted: retries produce identical content.
    async fn put_summary(&self, summary: SessionSummary) -> Result<(), StoreError>;

    async fn get_summary(
        &self,
        player_id: &str,
        session_id: &str,
    ) -> Result<Option<SessionSummary>, StoreError>;
}
