use crate::errors::{RewardError, SessionError};
use crate::ledger::{GrantOutcome, RewardLedger};
use chrono::Utc;
use match_core::{
    ttl_epoch, InteractionEvent, SessionRecord, SessionState, SessionSummary,
};
use match_store::{
    EventAppend, InsertOutcome, PendingRewardAdd, SessionStore, StateTransition, StoreError,
    TransitionEffects,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Per-reward outcome of an end-of-session flush.
#[derive(Clone, Debug, PartialEq)]
pub enum RewardFlushStatus {
    Granted,
    AlreadyGranted,
    Failed(RewardError),
}

#[derive(Clone, Debug, PartialEq)]
pub struct RewardFlushResult {
    pub reward_id: String,
    pub status: RewardFlushStatus,
}

impl RewardFlushResult {
    /// Whether the ledger accepted this reward (first grant or replay).
    pub fn accepted(&self) -> bool {
        matches!(
            self.status,
            RewardFlushStatus::Granted | RewardFlushStatus::AlreadyGranted
        )
    }
}

/// What `end_session` produced: the summary that was written and the
/// per-reward flush outcomes, never collapsed into one aggregate failure.
#[derive(Clone, Debug, PartialEq)]
pub struct EndSessionReport {
    pub summary: SessionSummary,
    pub reward_results: Vec<RewardFlushResult>,
}

/// Owns the session state machine `Created → Active → Ended`.
///
/// The fourth state, `Expired`, is time-driven and belongs to the store:
/// once the TTL passes, every read here returns NotFound. All mutation goes
/// through the store's conditional primitives, so concurrent calls for the
/// same session are safe without any lock of our own.
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    ledger: Arc<RewardLedger>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, ledger: Arc<RewardLedger>) -> Self {
        Self { store, ledger }
    }

    /// Create a fresh session in `Created`.
    pub async fn create_session(
        &self,
        player_id: &str,
        shard_id: &str,
    ) -> Result<SessionRecord, SessionError> {
        let record = SessionRecord::new(player_id.to_string(), shard_id.to_string());
        self.store.insert_session(record.clone()).await?;
        tracing::info!(
            session_id = %record.session_id,
            player_id,
            shard_id,
            "session created"
        );
        Ok(record)
    }

    /// Insert a pre-built `Created` record iff no live session has its id.
    /// Repeat observations of the same completed ticket land here as no-ops.
    pub async fn insert_created(&self, record: SessionRecord) -> Result<bool, SessionError> {
        match self.store.insert_session(record.clone()).await? {
            InsertOutcome::Inserted => {
                tracing::info!(
                    session_id = %record.session_id,
                    player_id = %record.player_id,
                    shard_id = %record.shard_id,
                    "session created from completed ticket"
                );
                Ok(true)
            }
            InsertOutcome::AlreadyExists => Ok(false),
        }
    }

    /// Transition `Created → Active`. Activating an already-active session
    /// is an idempotent no-op; any other state is rejected.
    pub async fn activate(&self, session_id: &str) -> Result<SessionRecord, SessionError> {
        let outcome = self
            .store
            .transition_state(
                session_id,
                SessionState::Created,
                SessionState::Active,
                TransitionEffects::default(),
            )
            .await?;
        match outcome {
            StateTransition::Applied(record) => {
                tracing::info!(session_id, "session activated");
                Ok(record)
            }
            StateTransition::WrongState(SessionState::Active) => self
                .store
                .get_session(session_id)
                .await?
                .ok_or_else(|| SessionError::NotFound(session_id.to_string())),
            StateTransition::WrongState(state) => Err(SessionError::NotActive {
                id: session_id.to_string(),
                state,
            }),
            StateTransition::NotFound => Err(SessionError::NotFound(session_id.to_string())),
        }
    }

    /// Append a gameplay event. Only legal while `Active`; the event goes to
    /// the ephemeral sequence and is never replicated to durable storage.
    /// Returns the event and the event count after the append.
    pub async fn record_event(
        &self,
        session_id: &str,
        event_type: String,
        data: HashMap<String, String>,
    ) -> Result<(InteractionEvent, usize), SessionError> {
        let event = InteractionEvent::new(event_type, data);
        match self.store.append_event(session_id, event.clone()).await? {
            EventAppend::Appended(count) => Ok((event, count)),
            EventAppend::WrongState(state) => {
                tracing::warn!(session_id, ?state, "event rejected: session not active");
                Err(SessionError::NotActive {
                    id: session_id.to_string(),
                    state,
                })
            }
            EventAppend::NotFound => Err(SessionError::NotFound(session_id.to_string())),
        }
    }

    /// Stage a reward for the end-of-session flush. Only legal while
    /// `Active`. The id is validated against the catalog up front; the
    /// durable write happens at `end_session`. Returns the pending list.
    pub async fn grant_reward(
        &self,
        session_id: &str,
        reward_id: &str,
    ) -> Result<Vec<String>, SessionError> {
        self.ledger.validate(reward_id).await?;
        match self.store.add_pending_reward(session_id, reward_id).await? {
            PendingRewardAdd::Added(pending) => Ok(pending),
            PendingRewardAdd::WrongState(state) => {
                tracing::warn!(session_id, ?state, "reward rejected: session not active");
                Err(SessionError::NotActive {
                    id: session_id.to_string(),
                    state,
                })
            }
            PendingRewardAdd::NotFound => Err(SessionError::NotFound(session_id.to_string())),
        }
    }

    /// End a session: CAS `Active → Ended`, flush pending rewards through
    /// the ledger one by one, then write the summary.
    ///
    /// Idempotent: ending an already-ended session re-runs the flush (the
    /// ledger deduplicates) and rewrites the identical summary, so both
    /// calls return the same payload. A crash between the CAS and the
    /// summary write heals the same way on the retry.
    pub async fn end_session(&self, session_id: &str) -> Result<EndSessionReport, SessionError> {
        let now = Utc::now();
        let outcome = self
            .store
            .transition_state(
                session_id,
                SessionState::Active,
                SessionState::Ended,
                TransitionEffects {
                    end_time: Some(now),
                    ttl: Some(ttl_epoch(&now)),
                },
            )
            .await?;

        let record = match outcome {
            StateTransition::Applied(record) => {
                tracing::info!(
                    session_id,
                    pending = record.pending_rewards.len(),
                    "session ended"
                );
                record
            }
            StateTransition::WrongState(SessionState::Ended) => self
                .store
                .get_session(session_id)
                .await?
                .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?,
            StateTransition::WrongState(state) => {
                return Err(SessionError::NotActive {
                    id: session_id.to_string(),
                    state,
                })
            }
            StateTransition::NotFound => {
                return Err(SessionError::NotFound(session_id.to_string()))
            }
        };

        self.flush_rewards(record).await
    }

    /// Grant every pending reward independently and write the summary with
    /// exactly the ids the ledger accepted, in pending order.
    async fn flush_rewards(&self, record: SessionRecord) -> Result<EndSessionReport, SessionError> {
        let end_time = record.end_time.ok_or_else(|| {
            SessionError::Storage(StoreError::Unavailable(format!(
                "ended session {} has no end time",
                record.session_id
            )))
        })?;

        let mut reward_results = Vec::with_capacity(record.pending_rewards.len());
        let mut accepted = Vec::new();

        for reward_id in &record.pending_rewards {
            let status = match self
                .ledger
                .grant(&record.player_id, reward_id, &record.session_id)
                .await
            {
                Ok(GrantOutcome::Granted(_)) => {
                    accepted.push(reward_id.clone());
                    RewardFlushStatus::Granted
                }
                Ok(GrantOutcome::AlreadyGranted(_)) => {
                    accepted.push(reward_id.clone());
                    RewardFlushStatus::AlreadyGranted
                }
                Err(e) => {
                    tracing::warn!(
                        session_id = %record.session_id,
                        reward_id = %reward_id,
                        error = %e,
                        "reward grant failed during session end"
                    );
                    RewardFlushStatus::Failed(e)
                }
            };
            reward_results.push(RewardFlushResult {
                reward_id: reward_id.clone(),
                status,
            });
        }

        let summary = SessionSummary::new(
            record.player_id.clone(),
            record.session_id.clone(),
            record.start_time,
            end_time,
            accepted,
        );
        self.store.put_summary(summary.clone()).await?;

        Ok(EndSessionReport {
            summary,
            reward_results,
        })
    }

    /// Fetch a session. Expired records are NotFound, identical to ids that
    /// never existed.
    pub async fn get_session(&self, session_id: &str) -> Result<SessionRecord, SessionError> {
        self.store
            .get_session(session_id)
            .await?
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))
    }

    pub async fn session_state(&self, session_id: &str) -> Result<SessionState, SessionError> {
        Ok(self.get_session(session_id).await?.state)
    }

    pub async fn get_summary(
        &self,
        player_id: &str,
        session_id: &str,
    ) -> Result<Option<SessionSummary>, SessionError> {
        Ok(self.store.get_summary(player_id, session_id).await?)
    }

    /// Write a summary pushed by a trusted game server: grant each reward
    /// through the ledger, then overwrite the summary with the accepted ids.
    pub async fn put_pushed_summary(
        &self,
        player_id: &str,
        session_id: &str,
        rewards: &[String],
        end_time: Option<chrono::DateTime<Utc>>,
    ) -> Result<EndSessionReport, SessionError> {
        let end_time = end_time.unwrap_or_else(Utc::now);
        let start_time = match self.store.get_session(session_id).await? {
            Some(record) => record.start_time,
            None => end_time,
        };

        let mut reward_results = Vec::with_capacity(rewards.len());
        let mut accepted = Vec::new();
        for reward_id in rewards {
            let status = match self.ledger.grant(player_id, reward_id, session_id).await {
                Ok(GrantOutcome::Granted(_)) => {
                    accepted.push(reward_id.clone());
                    RewardFlushStatus::Granted
                }
                Ok(GrantOutcome::AlreadyGranted(_)) => {
                    accepted.push(reward_id.clone());
                    RewardFlushStatus::AlreadyGranted
                }
                Err(e) => RewardFlushStatus::Failed(e),
            };
            reward_results.push(RewardFlushResult {
                reward_id: reward_id.clone(),
                status,
            });
        }

        let summary = SessionSummary::new(
            player_id.to_string(),
            session_id.to_string(),
            start_time,
            end_time,
            accepted,
        );
        self.store.put_summary(summary.clone()).await?;

        Ok(EndSessionReport {
            summary,
            reward_results,
        })
    }
}
