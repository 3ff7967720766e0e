use axum::{Json, http::StatusCode, response::IntoResponse};
use oauth2::basic::BasicErrorResponseType;
use oauth2::{HttpClientError, RequestTokenError, StandardErrorResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;

pub type TokenRequestError =
    RequestTokenError<HttpClientError<reqwest::Error>, StandardErrorResponse<BasicErrorResponseType>>;

#[derive(Debug, ThisError)]
pub enum BridgeError {
    #[error("Google Calendar not connected for user {user_id}")]
    NotConnected { user_id: i64 },

    #[error("Authorization code rejected: {0}")]
    Exchange(String),

    #[error("Refresh token rejected; re-authorization required: {0}")]
    RefreshFailed(String),

    #[error("Calendar provider error (status {status:?}): {message}")]
    Provider { status: Option<u16>, message: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Token endpoint error: {0}")]
    TokenEndpoint(String),

    #[error("Task {task_id} not found in the task store")]
    TaskNotFound { task_id: i64 },

    #[error("Event link for task {task_id} not stored: task missing or already linked")]
    EventLinkRejected { task_id: i64 },

    #[error("Database error: {0}")]
    Database(#[from] SqlxError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BridgeError {
    /// Stable tag used in structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeError::NotConnected { .. } => "not_connected",
            BridgeError::Exchange(_) => "exchange_error",
            BridgeError::RefreshFailed(_) => "refresh_failed",
            BridgeError::Provider { .. } => "provider_error",
            BridgeError::Validation(_) => "validation_error",
            BridgeError::Unauthorized => "unauthorized",
            BridgeError::TokenEndpoint(_) => "token_endpoint",
            BridgeError::TaskNotFound { .. } => "task_not_found",
            BridgeError::EventLinkRejected { .. } => "event_link_rejected",
            BridgeError::Database(_) => "database",
            BridgeError::UrlParse(_) => "url_parse",
            BridgeError::Json(_) => "json",
        }
    }

    /// Map a failed authorization-code exchange.
    pub fn from_exchange(e: TokenRequestError) -> Self {
        match e {
            RequestTokenError::ServerResponse(err) => {
                BridgeError::Exchange(err.error().to_string())
            }
            other => Self::token_transport(other),
        }
    }

    /// Map a failed refresh grant. A provider rejection means the refresh
    /// token is dead.
    pub fn from_refresh(e: TokenRequestError) -> Self {
        match e {
            RequestTokenError::ServerResponse(err) => {
                BridgeError::RefreshFailed(err.error().to_string())
            }
            other => Self::token_transport(other),
        }
    }

    fn token_transport(e: TokenRequestError) -> Self {
        match e {
            RequestTokenError::Request(req_e) => {
                BridgeError::TokenEndpoint(format!("request failed: {}", req_e))
            }
            RequestTokenError::Parse(parse_err, _body) => {
                BridgeError::TokenEndpoint(format!("unparsable token response: {}", parse_err))
            }
            RequestTokenError::Other(s) => BridgeError::TokenEndpoint(s),
            RequestTokenError::ServerResponse(err) => {
                BridgeError::TokenEndpoint(err.error().to_string())
            }
        }
    }

    /// Message safe to hand to a browser or API client.
    pub fn public_message(&self) -> &'static str {
        match self {
            BridgeError::NotConnected { .. } => "Google Calendar not connected",
            BridgeError::Exchange(_) => "Google rejected the authorization code",
            BridgeError::RefreshFailed(_) => {
                "Google Calendar access was revoked; please reconnect"
            }
            BridgeError::Provider { .. } | BridgeError::TokenEndpoint(_) => {
                "Google Calendar is unavailable"
            }
            BridgeError::Validation(_) => "Invalid request",
            BridgeError::Unauthorized => "Authentication required",
            BridgeError::TaskNotFound { .. } => "Task not found",
            BridgeError::EventLinkRejected { .. }
            | BridgeError::Database(_)
            | BridgeError::UrlParse(_)
            | BridgeError::Json(_) => "An internal server error occurred.",
        }
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> axum::response::Response {
        let (status, code) = match &self {
            BridgeError::NotConnected { .. } => (StatusCode::BAD_REQUEST, "NOT_CONNECTED"),
            BridgeError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            BridgeError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            BridgeError::RefreshFailed(_) => {
                (StatusCode::UNAUTHORIZED, "REAUTHORIZATION_REQUIRED")
            }
            BridgeError::Exchange(_) => (StatusCode::UNAUTHORIZED, "EXCHANGE_FAILED"),
            BridgeError::Provider { status, .. } => match status {
                Some(429) => (StatusCode::BAD_GATEWAY, "RATE_LIMIT"),
                _ => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            },
            BridgeError::TokenEndpoint(_) => (StatusCode::BAD_GATEWAY, "BAD_GATEWAY"),
            BridgeError::TaskNotFound { .. } => (StatusCode::NOT_FOUND, "TASK_NOT_FOUND"),
            BridgeError::EventLinkRejected { .. }
            | BridgeError::Database(_)
            | BridgeError::UrlParse(_)
            | BridgeError::Json(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let message = match &self {
            BridgeError::Validation(detail) => detail.clone(),
            other => other.public_message().to_string(),
        };

        let body = ApiErrorBody {
            code: code.to_string(),
            message,
        };
        (status, Json(ApiErrorResponse { error: body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}
