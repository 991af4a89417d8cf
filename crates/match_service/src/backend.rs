use async_trait::async_trait;
use chrono::Utc;
use match_core::{
    ConnectionInfo, MatchTicket, MatchedPlayerSession, TicketPlayer, TicketStatus,
};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Failure talking to the matchmaking backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct BackendError(pub String);

/// The external matchmaking queue, treated as a black box: submit a ticket,
/// describe it by id, cancel it. `describe` and `cancel` return `None` for
/// ids the backend has no record of.
#[async_trait]
pub trait MatchmakingBackend: Send + Sync {
    async fn submit(&self, players: Vec<TicketPlayer>) -> Result<MatchTicket, BackendError>;

    async fn describe(&self, ticket_id: &str) -> Result<Option<MatchTicket>, BackendError>;

    /// Cancel a ticket. Idempotent: a terminal ticket is returned unchanged.
    async fn cancel(&self, ticket_id: &str) -> Result<Option<MatchTicket>, BackendError>;
}

/// Configuration for the in-memory backend.
#[derive(Clone, Debug)]
pub struct InMemoryBackendConfig {
    /// Players needed to form a match.
    pub match_size: usize,
    /// Backend-side ticket lifetime; older unmatched tickets report `TimedOut`.
    pub ticket_timeout: Duration,
    /// Estimated wait reported on open tickets.
    pub estimated_wait_secs: u64,
    /// Address handed out in connection info.
    pub shard_address: String,
    pub shard_port: u16,
}

impl Default for InMemoryBackendConfig {
    fn default() -> Self {
        Self {
            match_size: 2,
            ticket_timeout: Duration::from_secs(120),
            estimated_wait_secs: 30,
            shard_address: "127.0.0.1".to_string(),
            shard_port: 7777,
        }
    }
}

#[derive(Default)]
struct BackendState {
    tickets: HashMap<String, MatchTicket>,
    /// Ticket ids waiting for a match, in submit order.
    waiting: Vec<String>,
    next_shard: u64,
}

/// In-memory matchmaking backend for tests, demos, and local runs.
///
/// Forms a match as soon as `match_size` tickets wait, allocating a shard
/// and one player session per matched player. It mimics the externally
/// observable contract of a real queue: tickets submit as `Queued`, report
/// `Searching` while open, and time out backend-side after `ticket_timeout`.
pub struct InMemoryBackend {
    config: InMemoryBackendConfig,
    state: Mutex<BackendState>,
}

impl InMemoryBackend {
    pub fn new(config: InMemoryBackendConfig) -> Self {
        Self {
            config,
            state: Mutex::new(BackendState::default()),
        }
    }

    fn complete_waiting(&self, state: &mut BackendState) {
        while state.waiting.len() >= self.config.match_size {
            let matched: Vec<String> = state.waiting.drain(..self.config.match_size).collect();

            state.next_shard += 1;
            let session_arn = format!("arn:match:shard/{}", state.next_shard);

            let mut placements = Vec::new();
            for ticket_id in &matched {
                if let Some(ticket) = state.tickets.get(ticket_id) {
                    for player in &ticket.players {
                        placements.push(MatchedPlayerSession {
                            player_id: player.player_id.clone(),
                            player_session_id: format!("psess-{}", Uuid::new_v4()),
                        });
                    }
                }
            }

            let info = ConnectionInfo {
                session_arn,
                address: self.config.shard_address.clone(),
                port: self.config.shard_port,
                matched_player_sessions: placements,
            };

            for ticket_id in &matched {
                if let Some(ticket) = state.tickets.get_mut(ticket_id) {
                    ticket.complete(info.clone());
                }
            }
        }
    }

    fn apply_timeout(&self, ticket: &mut MatchTicket, waiting: &mut Vec<String>) {
        if ticket.status.is_terminal() {
            return;
        }
        // Signed comparison: a backwards wall-clock step makes the age
        // negative, which must not read as ancient
        let age = Utc::now().signed_duration_since(ticket.created_at);
        if age.num_milliseconds() as i128 >= self.config.ticket_timeout.as_millis() as i128 {
            ticket.terminate(
                TicketStatus::TimedOut,
                Some("matchmaking timed out".to_string()),
            );
            waiting.retain(|id| id != &ticket.ticket_id);
        }
    }
}

#[async_trait]
impl MatchmakingBackend for InMemoryBackend {
    async fn submit(&self, players: Vec<TicketPlayer>) -> Result<MatchTicket, BackendError> {
        if players.is_empty() {
            return Err(BackendError("ticket must carry at least one player".to_string()));
        }

        let mut state = self.state.lock().await;
        let mut ticket = MatchTicket::open(Uuid::new_v4().to_string(), players);
        ticket.estimated_wait_secs = Some(self.config.estimated_wait_secs);

        let ticket_id = ticket.ticket_id.clone();
        state.tickets.insert(ticket_id.clone(), ticket);
        state.waiting.push(ticket_id.clone());

        self.complete_waiting(&mut state);

        Ok(state.tickets[&ticket_id].clone())
    }

    async fn describe(&self, ticket_id: &str) -> Result<Option<MatchTicket>, BackendError> {
        let mut state = self.state.lock().await;
        let BackendState {
            tickets, waiting, ..
        } = &mut *state;

        let Some(ticket) = tickets.get_mut(ticket_id) else {
            return Ok(None);
        };

        self.apply_timeout(ticket, waiting);
        // An open ticket is being searched once anyone asks about it
        if ticket.status == TicketStatus::Queued {
            ticket.status = TicketStatus::Searching;
        }
        Ok(Some(ticket.clone()))
    }

    async fn cancel(&self, ticket_id: &str) -> Result<Option<MatchTicket>, BackendError> {
        let mut state = self.state.lock().await;
        let BackendState {
            tickets, waiting, ..
        } = &mut *state;

        let Some(ticket) = tickets.get_mut(ticket_id) else {
            return Ok(None);
        };

        if !ticket.status.is_terminal() {
            ticket.terminate(TicketStatus::Cancelled, Some("cancelled by caller".to_string()));
            waiting.retain(|id| id != ticket_id);
        }
        Ok(Some(ticket.clone()))
    }
}
