use crate::backend::MatchmakingBackend;
use crate::errors::TicketError;
use crate::session_manager::SessionManager;
use match_core::{AttributeValue, MatchTicket, SessionRecord, TicketPlayer, TicketStatus};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Configuration for the matchmaking coordinator.
#[derive(Clone, Debug)]
pub struct CoordinatorConfig {
    /// Merged as the `skill` attribute when the caller omits one.
    pub default_skill: f64,
    /// Merged as the `region` attribute when the caller omits one.
    pub default_region: String,
    /// Interval between backend polls in `wait_for_match`.
    pub poll_interval: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            default_skill: 10.0,
            default_region: "us-west-2".to_string(),
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// Wraps the matchmaking backend: submits tickets, polls status, and derives
/// sessions when a ticket completes.
///
/// Polling is caller-driven; there is no server push. The coordinator itself
/// never mutates a ticket after observing `Completed`.
pub struct MatchmakingCoordinator {
    backend: Arc<dyn MatchmakingBackend>,
    sessions: Arc<SessionManager>,
    config: CoordinatorConfig,
}

impl MatchmakingCoordinator {
    pub fn new(
        backend: Arc<dyn MatchmakingBackend>,
        sessions: Arc<SessionManager>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            backend,
            sessions,
            config,
        }
    }

    /// Submit a matchmaking request for one player.
    ///
    /// Defaults merged before submission, each only when the caller omitted
    /// the key: `skill = config.default_skill`, `region =
    /// config.default_region`. Caller-supplied values always win.
    pub async fn request_match(
        &self,
        player_id: &str,
        attributes: Option<HashMap<String, AttributeValue>>,
    ) -> Result<MatchTicket, TicketError> {
        if player_id.trim().is_empty() {
            return Err(TicketError::InvalidRequest(
                "playerId is required".to_string(),
            ));
        }

        let mut attributes = attributes.unwrap_or_default();
        attributes
            .entry("skill".to_string())
            .or_insert(AttributeValue::Number(self.config.default_skill));
        attributes
            .entry("region".to_string())
            .or_insert_with(|| AttributeValue::Text(self.config.default_region.clone()));

        let player = TicketPlayer {
            player_id: player_id.to_string(),
            attributes,
            latency_by_region_ms: HashMap::new(),
        };

        let ticket = self
            .backend
            .submit(vec![player])
            .await
            .map_err(|e| TicketError::Backend(e.to_string()))?;
        tracing::info!(ticket_id = %ticket.ticket_id, player_id, "match requested");

        // A single-player queue can complete on submission
        if ticket.status == TicketStatus::Completed {
            self.derive_sessions(&ticket).await?;
        }
        Ok(ticket)
    }

    /// Describe a ticket. On first observing `Completed`, one `Created`
    /// session is derived per matched player; the conditional insert makes
    /// repeated observations no-ops.
    pub async fn get_status(&self, ticket_id: &str) -> Result<MatchTicket, TicketError> {
        let ticket = self
            .backend
            .describe(ticket_id)
            .await
            .map_err(|e| TicketError::Backend(e.to_string()))?
            .ok_or_else(|| TicketError::NotFound(ticket_id.to_string()))?;

        if ticket.status == TicketStatus::Completed {
            self.derive_sessions(&ticket).await?;
        }
        Ok(ticket)
    }

    /// Poll until the ticket is terminal or `timeout` elapses.
    ///
    /// On timeout the returned view is marked `TimedOut` locally; the
    /// backend ticket stays live and only an explicit `cancel` ends it.
    pub async fn wait_for_match(
        &self,
        ticket_id: &str,
        timeout: Duration,
    ) -> Result<MatchTicket, TicketError> {
        let deadline = Instant::now() + timeout;
        loop {
            let ticket = self.get_status(ticket_id).await?;
            if ticket.status.is_terminal() {
                return Ok(ticket);
            }
            if Instant::now() >= deadline {
                tracing::debug!(ticket_id, "local poll deadline elapsed");
                return Ok(ticket.timed_out_view());
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// Cancel a ticket on the backend. Idempotent: cancelling an
    /// already-terminal ticket returns it unchanged.
    pub async fn cancel(&self, ticket_id: &str) -> Result<MatchTicket, TicketError> {
        self.backend
            .cancel(ticket_id)
            .await
            .map_err(|e| TicketError::Backend(e.to_string()))?
            .ok_or_else(|| TicketError::NotFound(ticket_id.to_string()))
    }

    /// One `Created` session per matched player: session id is the backend's
    /// player session id, shard id is the match's session ARN.
    async fn derive_sessions(&self, ticket: &MatchTicket) -> Result<(), TicketError> {
        let Some(info) = &ticket.connection_info else {
            return Err(TicketError::Backend(format!(
                "completed ticket {} has no connection info",
                ticket.ticket_id
            )));
        };

        for placement in &info.matched_player_sessions {
            let record = SessionRecord::with_id(
                placement.player_session_id.clone(),
                placement.player_id.clone(),
                info.session_arn.clone(),
            );
            self.sessions.insert_created(record).await.map_err(|e| match e {
                crate::errors::SessionError::Storage(s) => TicketError::Storage(s),
                other => TicketError::Backend(other.to_string()),
            })?;
        }
        Ok(())
    }
}
