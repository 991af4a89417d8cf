use crate::time::ttl_epoch;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// State of a player session.
///
/// `Expired` is never written to a store: it is what a record conceptually
/// becomes when the ephemeral store purges it. Reads past expiry return
/// NotFound, identical to a session that never existed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    Created,
    Active,
    Ended,
    Expired,
}

/// One gameplay event recorded during an active session. Ephemeral only:
/// events are never replicated to durable storage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionEvent {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    #[serde(default)]
    pub data: HashMap<String, String>,
}

impl InteractionEvent {
    pub fn new(event_type: String, data: HashMap<String, String>) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type,
            data,
        }
    }
}

/// One player's session on a match shard.
///
/// Invariants: events and pending rewards grow only while `Active`;
/// `end_time` and `ttl` are set iff the session has ended.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub session_id: String,
    pub player_id: String,
    pub shard_id: String,
    pub state: SessionState,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub events: Vec<InteractionEvent>,
    #[serde(default)]
    pub pending_rewards: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<i64>,
}

impl SessionRecord {
    /// New session in `Created` with a fresh id.
    pub fn new(player_id: String, shard_id: String) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), player_id, shard_id)
    }

    /// New session in `Created` with a caller-supplied id (e.g. the backend's
    /// player session id).
    pub fn with_id(session_id: String, player_id: String, shard_id: String) -> Self {
        Self {
            session_id,
            player_id,
            shard_id,
            state: SessionState::Created,
            start_time: Utc::now(),
            end_time: None,
            events: Vec::new(),
            pending_rewards: Vec::new(),
            ttl: None,
        }
    }
}

/// Durable-for-72h record of a finished session: which rewards the ledger
/// accepted, and when the session ran. Written once at session end; the
/// owning store purges it after `ttl`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub player_id: String,
    pub session_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub rewards: Vec<String>,
    /// Epoch seconds; the store interprets this as the expiration marker.
    pub ttl: i64,
}

impl SessionSummary {
    pub fn new(
        player_id: String,
        session_id: String,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        rewards: Vec<String>,
    ) -> Self {
        let ttl = ttl_epoch(&end_time);
        Self {
            player_id,
            session_id,
            start_time,
            end_time,
            rewards,
            ttl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::SESSION_TTL_SECS;

    #[test]
    fn new_session_starts_created_with_no_end() {
        let session = SessionRecord::new("p1".to_string(), "shard-1".to_string());
        assert_eq!(session.state, SessionState::Created);
        assert!(session.end_time.is_none());
        assert!(session.ttl.is_none());
        assert!(session.events.is_empty());
    }

    #[test]
    fn summary_ttl_derived_from_end_time() {
        let end = Utc::now();
        let summary = SessionSummary::new(
            "p1".to_string(),
            "s1".to_string(),
            end,
            end,
            vec!["first_capture".to_string()],
        );
        assert_eq!(summary.ttl, end.timestamp() + SESSION_TTL_SECS);
    }
}
