use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use match_service::{RewardError, SessionError, TicketError};
use match_store::StoreError;
use serde_json::json;

/// Wire-level error: a machine-readable kind plus a human-readable message,
/// rendered as `{"error": KIND, "message": ...}` with the mapped status.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "INVALID_REQUEST",
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(code = self.code, message = %self.message, "request failed");
        }
        let body = Json(json!({
            "error": self.code,
            "message": self.message,
        }));
        (self.status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "STORAGE_FAILED",
            message: e.to_string(),
        }
    }
}

impl From<RewardError> for ApiError {
    fn from(e: RewardError) -> Self {
        match e {
            RewardError::InvalidRewardId(_) => Self {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                code: "INVALID_REWARD_ID",
                message: e.to_string(),
            },
            RewardError::CatalogUnavailable => Self {
                status: StatusCode::SERVICE_UNAVAILABLE,
                code: "REWARD_CATALOG_NOT_FOUND",
                message: e.to_string(),
            },
            RewardError::Storage(s) => s.into(),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::NotFound(_) => Self {
                status: StatusCode::NOT_FOUND,
                code: "SESSION_NOT_FOUND",
                message: e.to_string(),
            },
            SessionError::NotActive { .. } => Self {
                status: StatusCode::CONFLICT,
                code: "SESSION_NOT_ACTIVE",
                message: e.to_string(),
            },
            SessionError::Reward(r) => r.into(),
            SessionError::Storage(s) => s.into(),
        }
    }
}

impl From<TicketError> for ApiError {
    fn from(e: TicketError) -> Self {
        match e {
            TicketError::InvalidRequest(_) => Self::invalid_request(e.to_string()),
            TicketError::NotFound(_) => Self {
                status: StatusCode::NOT_FOUND,
                code: "TICKET_NOT_FOUND",
                message: e.to_string(),
            },
            TicketError::Backend(_) => Self {
                status: StatusCode::BAD_GATEWAY,
                code: "MATCHMAKING_FAILED",
                message: e.to_string(),
            },
            TicketError::Storage(s) => s.into(),
        }
    }
}
