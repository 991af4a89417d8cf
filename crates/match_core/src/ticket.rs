use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A scalar matchmaking attribute (skill rating, region, playstyle, ...).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Number(f64),
    Text(String),
}

/// One player entry on a matchmaking ticket.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketPlayer {
    pub player_id: String,
    #[serde(default)]
    pub attributes: HashMap<String, AttributeValue>,
    /// Measured latency per region, in milliseconds.
    #[serde(default)]
    pub latency_by_region_ms: HashMap<String, u64>,
}

/// Status of a matchmaking ticket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Queued,
    Searching,
    Completed,
    Failed,
    Cancelled,
    TimedOut,
}

impl TicketStatus {
    /// Terminal tickets never change status again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TicketStatus::Completed
                | TicketStatus::Failed
                | TicketStatus::Cancelled
                | TicketStatus::TimedOut
        )
    }
}

/// Placement for one matched player within a completed ticket.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchedPlayerSession {
    pub player_id: String,
    pub player_session_id: String,
}

/// Where to connect once a ticket completes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    pub session_arn: String,
    pub address: String,
    pub port: u16,
    pub matched_player_sessions: Vec<MatchedPlayerSession>,
}

/// A matchmaking request tracked through states until matched or terminated.
///
/// Invariant: `players` is non-empty and `connection_info` is present iff
/// `status == Completed`. Mutation goes through the transition helpers so the
/// invariant holds everywhere a ticket is observed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchTicket {
    pub ticket_id: String,
    pub players: Vec<TicketPlayer>,
    pub status: TicketStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_wait_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_info: Option<ConnectionInfo>,
}

impl MatchTicket {
    /// Open a new ticket in `Queued` for the given players.
    pub fn open(ticket_id: String, players: Vec<TicketPlayer>) -> Self {
        debug_assert!(!players.is_empty());
        Self {
            ticket_id,
            players,
            status: TicketStatus::Queued,
            status_reason: None,
            status_message: None,
            created_at: Utc::now(),
            ended_at: None,
            estimated_wait_secs: None,
            connection_info: None,
        }
    }

    /// Transition to `Completed`, attaching connection info.
    pub fn complete(&mut self, info: ConnectionInfo) {
        self.status = TicketStatus::Completed;
        self.connection_info = Some(info);
        self.ended_at = Some(Utc::now());
    }

    /// Transition to a terminal, non-completed status with an optional reason.
    pub fn terminate(&mut self, status: TicketStatus, reason: Option<String>) {
        debug_assert!(status.is_terminal() && status != TicketStatus::Completed);
        self.status = status;
        self.status_reason = reason;
        self.connection_info = None;
        self.ended_at = Some(Utc::now());
    }

    /// A caller-local view of this ticket after a poll deadline elapsed.
    /// The backend ticket is untouched; only the view is marked timed out.
    pub fn timed_out_view(&self) -> Self {
        let mut view = self.clone();
        view.status = TicketStatus::TimedOut;
        view.status_reason = Some("local poll deadline elapsed".to_string());
        view.connection_info = None;
        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: &str) -> TicketPlayer {
        TicketPlayer {
            player_id: id.to_string(),
            attributes: HashMap::new(),
            latency_by_region_ms: HashMap::new(),
        }
    }

    #[test]
    fn connection_info_present_iff_completed() {
        let mut ticket = MatchTicket::open("t1".to_string(), vec![player("p1")]);
        assert!(ticket.connection_info.is_none());

        ticket.complete(ConnectionInfo {
            session_arn: "arn:shard/1".to_string(),
            address: "127.0.0.1".to_string(),
            port: 7777,
            matched_player_sessions: vec![MatchedPlayerSession {
                player_id: "p1".to_string(),
                player_session_id: "ps1".to_string(),
            }],
        });
        assert_eq!(ticket.status, TicketStatus::Completed);
        assert!(ticket.connection_info.is_some());
        assert!(ticket.ended_at.is_some());

        let mut failed = MatchTicket::open("t2".to_string(), vec![player("p2")]);
        failed.terminate(TicketStatus::Failed, Some("no players".to_string()));
        assert!(failed.connection_info.is_none());
    }

    #[test]
    fn timed_out_view_drops_connection_info_and_keeps_original() {
        let mut ticket = MatchTicket::open("t1".to_string(), vec![player("p1")]);
        ticket.status = TicketStatus::Searching;

        let view = ticket.timed_out_view();
        assert_eq!(view.status, TicketStatus::TimedOut);
        assert!(view.connection_info.is_none());
        // Original is unchanged
        assert_eq!(ticket.status, TicketStatus::Searching);
    }

    #[test]
    fn status_serializes_screaming_snake() {
        let json = serde_json::to_string(&TicketStatus::TimedOut).unwrap();
        assert_eq!(json, "\"TIMED_OUT\"");
    }
}
