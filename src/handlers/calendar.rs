use crate::error::BridgeError;
use crate::middleware::auth::AuthenticatedUser;
use crate::router::BridgeState;
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct AuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUrlResponse {
    pub authorization_url: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatusResponse {
    pub connected: bool,
    pub sync_enabled: bool,
    pub calendar_id: Option<String>,
    pub connected_at: Option<DateTime<Utc>>,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResultResponse {
    pub success: bool,
    pub message: String,
    pub synced_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub enabled: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResponse {
    pub success: bool,
    pub sync_enabled: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct DisconnectResponse {
    pub success: bool,
    pub message: String,
}

/// GET /calendar/connect -> consent URL for the caller.
pub async fn connect(
    State(state): State<BridgeState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> Result<Json<AuthUrlResponse>, BridgeError> {
    let url = state.tokens.authorization_url(user_id)?;
    Ok(Json(AuthUrlResponse {
        authorization_url: url.to_string(),
        message: "Please visit this URL to authorize access to Google Calendar".to_string(),
    }))
}

/// GET /calendar/oauth2callback -> browser redirect to the frontend with the
/// outcome. Errors travel only in the redirect's query string.
pub async fn oauth_callback(
    State(state): State<BridgeState>,
    Query(query): Query<AuthCallbackQuery>,
) -> Response {
    let Some(user_id) = query.state.as_deref().and_then(|s| s.trim().parse::<i64>().ok()) else {
        warn!("oauth callback with missing or invalid state");
        return redirect_failure(&state, "invalid state parameter");
    };
    let Some(code) = query.code.as_deref().filter(|c| !c.is_empty()) else {
        warn!(user_id, "oauth callback without code");
        return redirect_failure(&state, "missing authorization code");
    };

    match state.tokens.exchange_code(code, user_id).await {
        Ok(_) => {
            info!(user_id, "oauth callback stored credential");
            redirect_to(&state, &[("success", "true")])
        }
        Err(err) => {
            warn!(user_id, error_kind = err.kind(), error = %err, "oauth callback failed");
            redirect_failure(&state, err.public_message())
        }
    }
}

/// GET /calendar/status
pub async fn status(
    State(state): State<BridgeState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> Result<Json<ConnectionStatusResponse>, BridgeError> {
    let resp = match state.tokens.status(user_id).await? {
        Some(cred) => ConnectionStatusResponse {
            connected: true,
            sync_enabled: cred.sync_enabled,
            calendar_id: Some(cred.calendar_id),
            connected_at: cred.created_at,
            last_updated: cred.updated_at,
        },
        None => ConnectionStatusResponse {
            connected: false,
            sync_enabled: false,
            calendar_id: None,
            connected_at: None,
            last_updated: None,
        },
    };
    Ok(Json(resp))
}

/// POST /calendar/sync -> push every task of the caller.
pub async fn sync_all(
    State(state): State<BridgeState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> Result<Response, BridgeError> {
    if !state.tokens.is_connected(user_id).await? {
        let body = SyncResultResponse {
            success: false,
            message: "Google Calendar not connected".to_string(),
            synced_count: 0,
        };
        return Ok((StatusCode::BAD_REQUEST, Json(body)).into_response());
    }

    let synced_count = state.sync.sync_all_tasks(user_id).await;
    Ok(Json(SyncResultResponse {
        success: true,
        message: "Successfully synced tasks to Google Calendar".to_string(),
        synced_count,
    })
    .into_response())
}

/// PUT /calendar/sync/toggle
pub async fn toggle_sync(
    State(state): State<BridgeState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Json(req): Json<ToggleRequest>,
) -> Result<Json<ToggleResponse>, BridgeError> {
    let enabled = req
        .enabled
        .ok_or_else(|| BridgeError::Validation("Missing 'enabled' field".to_string()))?;
    let cred = state.tokens.toggle_sync(user_id, enabled).await?;
    Ok(Json(ToggleResponse {
        success: true,
        sync_enabled: cred.sync_enabled,
        message: format!("Sync {}", if enabled { "enabled" } else { "disabled" }),
    }))
}

/// DELETE /calendar/disconnect
pub async fn disconnect(
    State(state): State<BridgeState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> Result<Json<DisconnectResponse>, BridgeError> {
    state.tokens.disconnect(user_id).await?;
    Ok(Json(DisconnectResponse {
        success: true,
        message: "Google Calendar disconnected successfully".to_string(),
    }))
}

fn redirect_failure(state: &BridgeState, message: &str) -> Response {
    redirect_to(state, &[("success", "false"), ("error", message)])
}

fn redirect_to(state: &BridgeState, params: &[(&str, &str)]) -> Response {
    let mut target = state.callback_redirect.clone();
    target.query_pairs_mut().extend_pairs(params);
    Redirect::to(target.as_str()).into_response()
}
