//! Wire shapes. Field names follow the public API (camelCase).

use chrono::{DateTime, Utc};
use match_core::{
    AttributeValue, ConnectionInfo, MatchTicket, SessionRecord, SessionState, SessionSummary,
    TicketStatus,
};
use match_service::{RewardError, RewardFlushResult, RewardFlushStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMatchRequest {
    #[serde(default)]
    pub player_id: Option<String>,
    #[serde(default)]
    pub player_attributes: Option<HashMap<String, AttributeValue>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketResponse {
    pub ticket_id: String,
    pub status: TicketStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_wait_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_info: Option<ConnectionInfo>,
}

impl From<MatchTicket> for TicketResponse {
    fn from(ticket: MatchTicket) -> Self {
        Self {
            ticket_id: ticket.ticket_id,
            status: ticket.status,
            status_reason: ticket.status_reason,
            status_message: ticket.status_message,
            start_time: ticket.created_at,
            end_time: ticket.ended_at,
            estimated_wait_time: ticket.estimated_wait_secs,
            connection_info: ticket.connection_info,
        }
    }
}

/// Session view. Events stay server-side; only their count is exposed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: String,
    pub player_id: String,
    pub shard_id: String,
    pub state: SessionState,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub events_recorded: usize,
    pub pending_rewards: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<i64>,
}

impl From<SessionRecord> for SessionResponse {
    fn from(record: SessionRecord) -> Self {
        Self {
            session_id: record.session_id,
            player_id: record.player_id,
            shard_id: record.shard_id,
            state: record.state,
            start_time: record.start_time,
            end_time: record.end_time,
            events_recorded: record.events.len(),
            pending_rewards: record.pending_rewards,
            ttl: record.ttl,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordEventRequest {
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub data: Option<HashMap<String, String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordEventResponse {
    pub event_id: String,
    pub events_recorded: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddRewardRequest {
    #[serde(default)]
    pub reward_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddRewardResponse {
    pub pending_rewards: Vec<String>,
}

/// Per-reward outcome on the wire. `status` is `GRANTED`, `ALREADY_GRANTED`,
/// or the error kind that failed the grant.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardResultDto {
    pub reward_id: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<RewardFlushResult> for RewardResultDto {
    fn from(result: RewardFlushResult) -> Self {
        let (status, message) = match &result.status {
            RewardFlushStatus::Granted => ("GRANTED", None),
            RewardFlushStatus::AlreadyGranted => ("ALREADY_GRANTED", None),
            RewardFlushStatus::Failed(e) => (reward_error_code(e), Some(e.to_string())),
        };
        Self {
            reward_id: result.reward_id,
            status,
            message,
        }
    }
}

fn reward_error_code(e: &RewardError) -> &'static str {
    match e {
        RewardError::InvalidRewardId(_) => "INVALID_REWARD_ID",
        RewardError::CatalogUnavailable => "REWARD_CATALOG_NOT_FOUND",
        RewardError::Storage(_) => "STORAGE_FAILED",
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndSessionResponse {
    pub summary: SessionSummary,
    pub reward_results: Vec<RewardResultDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PutSummaryRequest {
    #[serde(default)]
    pub player_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub rewards: Vec<String>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PutSummaryResponse {
    pub success: bool,
    pub player_id: String,
    pub session_id: String,
    pub rewards_stored: usize,
    pub ttl: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRewardsResponse {
    pub player_id: String,
    pub rewards: Vec<match_core::RewardGrant>,
}
