use crate::dto::*;
use crate::error::ApiError;
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};

/// Build the HTTP API over the shared service state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/matches", post(create_match))
        .route("/matches/{ticket_id}", get(get_match).delete(cancel_match))
        .route("/sessions/{session_id}", get(get_session))
        .route("/sessions/{session_id}/activate", post(activate_session))
        .route("/sessions/{session_id}/events", post(record_event))
        .route("/sessions/{session_id}/rewards", post(add_reward))
        .route("/sessions/{session_id}/end", post(end_session))
        .route("/sessions/{session_id}/summary", post(put_summary))
        .route("/players/{player_id}/rewards", get(list_rewards))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn create_match(
    State(state): State<AppState>,
    Json(body): Json<CreateMatchRequest>,
) -> Result<(StatusCode, Json<TicketResponse>), ApiError> {
    let player_id = body
        .player_id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::invalid_request("playerId is required"))?;

    let ticket = state
        .coordinator
        .request_match(player_id, body.player_attributes)
        .await?;
    Ok((StatusCode::CREATED, Json(ticket.into())))
}

async fn get_match(
    State(state): State<AppState>,
    Path(ticket_id): Path<String>,
) -> Result<Json<TicketResponse>, ApiError> {
    let ticket = state.coordinator.get_status(&ticket_id).await?;
    Ok(Json(ticket.into()))
}

async fn cancel_match(
    State(state): State<AppState>,
    Path(ticket_id): Path<String>,
) -> Result<Json<TicketResponse>, ApiError> {
    let ticket = state.coordinator.cancel(&ticket_id).await?;
    Ok(Json(ticket.into()))
}

async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let record = state.sessions.get_session(&session_id).await?;
    Ok(Json(record.into()))
}

async fn activate_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let record = state.sessions.activate(&session_id).await?;
    Ok(Json(record.into()))
}

async fn record_event(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(body): Json<RecordEventRequest>,
) -> Result<Json<RecordEventResponse>, ApiError> {
    let event_type = body
        .event_type
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::invalid_request("eventType is required"))?;

    let (event, events_recorded) = state
        .sessions
        .record_event(&session_id, event_type, body.data.unwrap_or_default())
        .await?;
    Ok(Json(RecordEventResponse {
        event_id: event.event_id,
        events_recorded,
    }))
}

async fn add_reward(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(body): Json<AddRewardRequest>,
) -> Result<Json<AddRewardResponse>, ApiError> {
    let reward_id = body
        .reward_id
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| ApiError::invalid_request("rewardId is required"))?;

    let pending_rewards = state.sessions.grant_reward(&session_id, &reward_id).await?;
    Ok(Json(AddRewardResponse { pending_rewards }))
}

async fn end_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<EndSessionResponse>, ApiError> {
    let report = state.sessions.end_session(&session_id).await?;
    Ok(Json(EndSessionResponse {
        summary: report.summary,
        reward_results: report.reward_results.into_iter().map(Into::into).collect(),
    }))
}

/// Summary push from a trusted game server. Grants are idempotent, so
/// replays of the same push converge on the same stored summary.
async fn put_summary(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(body): Json<PutSummaryRequest>,
) -> Result<Json<PutSummaryResponse>, ApiError> {
    let player_id = body
        .player_id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::invalid_request("playerId is required"))?;
    if let Some(body_session) = body.session_id.as_deref() {
        if body_session != session_id {
            return Err(ApiError::invalid_request(
                "sessionId in body does not match path",
            ));
        }
    }

    let report = state
        .sessions
        .put_pushed_summary(player_id, &session_id, &body.rewards, body.end_time)
        .await?;
    Ok(Json(PutSummaryResponse {
        success: true,
        player_id: player_id.to_string(),
        session_id,
        rewards_stored: report.summary.rewards.len(),
        ttl: report.summary.ttl,
    }))
}

async fn list_rewards(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
) -> Result<Json<PlayerRewardsResponse>, ApiError> {
    let rewards = state.ledger.list_grants(&player_id).await?;
    Ok(Json(PlayerRewardsResponse { player_id, rewards }))
}
