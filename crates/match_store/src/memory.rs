//! In-memory store implementations for tests, demos, and local runs.
//!
//! Both stores check expiry against the wall clock on every read, so tests
//! simulate TTL purges by planting records with a `ttl` in the past instead
//! of waiting.

use crate::error::StoreError;
use crate::ledger::{GrantInsert, LedgerStore};
use crate::session::{
    EventAppend, InsertOutcome, PendingRewardAdd, SessionStore, StateTransition, TransitionEffects,
};
use async_trait::async_trait;
use chrono::Utc;
use match_core::{InteractionEvent, RewardGrant, SessionRecord, SessionState, SessionSummary};
use std::collections::HashMap;
use tokio::sync::RwLock;

fn expired(ttl: Option<i64>) -> bool {
    matches!(ttl, Some(t) if t <= Utc::now().timestamp())
}

/// In-memory reward ledger. A single map guarded by one lock gives the
/// insert-if-absent atomicity the trait requires.
#[derive(Default)]
pub struct InMemoryLedger {
    grants: RwLock<HashMap<(String, String), RewardGrant>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    async fn insert_grant_if_absent(&self, grant: RewardGrant) -> Result<GrantInsert, StoreError> {
        let mut grants = self.grants.write().await;
        let key = (grant.player_id.clone(), grant.reward_id.clone());
        if let Some(existing) = grants.get(&key) {
            return Ok(GrantInsert::Exists(existing.clone()));
        }
        grants.insert(key, grant);
        Ok(GrantInsert::Inserted)
    }

    async fn get_grant(
        &self,
        player_id: &str,
        reward_id: &str,
    ) -> Result<Option<RewardGrant>, StoreError> {
        let grants = self.grants.read().await;
        Ok(grants
            .get(&(player_id.to_string(), reward_id.to_string()))
            .cloned())
    }

    async fn list_grants(&self, player_id: &str) -> Result<Vec<RewardGrant>, StoreError> {
        let grants = self.grants.read().await;
        let mut out: Vec<RewardGrant> = grants
            .values()
            .filter(|g| g.player_id == player_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.reward_id.cmp(&b.reward_id));
        Ok(out)
    }
}

/// In-memory ephemeral session store. Records past their `ttl` read as
/// absent; conditional writes to them behave as if the record were purged.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, SessionRecord>>,
    summaries: RwLock<HashMap<(String, String), SessionSummary>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plant a record directly, bypassing the conditional insert. Test hook.
    pub async fn plant_session(&self, record: SessionRecord) {
        self.sessions
            .write()
            .await
            .insert(record.session_id.clone(), record);
    }

    /// Plant a summary directly, bypassing `put_summary`. Test hook.
    pub async fn plant_summary(&self, summary: SessionSummary) {
        self.summaries.write().await.insert(
            (summary.player_id.clone(), summary.session_id.clone()),
            summary,
        );
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn insert_session(&self, record: SessionRecord) -> Result<InsertOutcome, StoreError> {
        let mut sessions = self.sessions.write().await;
        match sessions.get(&record.session_id) {
            Some(existing) if !expired(existing.ttl) => Ok(InsertOutcome::AlreadyExists),
            _ => {
                sessions.insert(record.session_id.clone(), record);
                Ok(InsertOutcome::Inserted)
            }
        }
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<SessionRecord>, StoreError> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(session_id)
            .filter(|r| !expired(r.ttl))
            .cloned())
    }

    async fn transition_state(
        &self,
        session_id: &str,
        from: SessionState,
        to: SessionState,
        effects: TransitionEffects,
    ) -> Result<StateTransition, StoreError> {
        let mut sessions = self.sessions.write().await;
        let Some(record) = sessions.get_mut(session_id).filter(|r| !expired(r.ttl)) else {
            return Ok(StateTransition::NotFound);
        };
        if record.state != from {
            return Ok(StateTransition::WrongState(record.state));
        }
        record.state = to;
        if let Some(end_time) = effects.end_time {
            record.end_time = Some(end_time);
        }
        if let Some(ttl) = effects.ttl {
            record.ttl = Some(ttl);
        }
        Ok(StateTransition::Applied(record.clone()))
    }

    async fn append_event(
        &self,
        session_id: &str,
        event: InteractionEvent,
    ) -> Result<EventAppend, StoreError> {
        let mut sessions = self.sessions.write().await;
        let Some(record) = sessions.get_mut(session_id).filter(|r| !expired(r.ttl)) else {
            return Ok(EventAppend::NotFound);
        };
        if record.state != SessionState::Active {
            return Ok(EventAppend::WrongState(record.state));
        }
        record.events.push(event);
        Ok(EventAppend::Appended(record.events.len()))
    }

    async fn add_pending_reward(
        &self,
        session_id: &str,
        reward_id: &str,
    ) -> Result<PendingRewardAdd, StoreError> {
        let mut sessions = self.sessions.write().await;
        let Some(record) = sessions.get_mut(session_id).filter(|r| !expired(r.ttl)) else {
            return Ok(PendingRewardAdd::NotFound);
        };
        if record.state != SessionState::Active {
            return Ok(PendingRewardAdd::WrongState(record.state));
        }
        if !record.pending_rewards.iter().any(|r| r == reward_id) {
            record.pending_rewards.push(reward_id.to_string());
        }
        Ok(PendingRewardAdd::Added(record.pending_rewards.clone()))
    }

    async fn put_summary(&self, summary: SessionSummary) -> Result<(), StoreError> {
        let mut summaries = self.summaries.write().await;
        summaries.insert(
            (summary.player_id.clone(), summary.session_id.clone()),
            summary,
        );
        Ok(())
    }

    async fn get_summary(
        &self,
        player_id: &str,
        session_id: &str,
    ) -> Result<Option<SessionSummary>, StoreError> {
        let summaries = self.summaries.read().await;
        Ok(summaries
            .get(&(player_id.to_string(), session_id.to_string()))
            .filter(|s| !expired(Some(s.ttl)))
            .cloned())
    }
}
