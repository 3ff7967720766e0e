use crate::calendar::GoogleCalendarClient;
use crate::config::Config;
use crate::db::{CredentialsStorage, SqlitePool, TaskStorage};
use crate::error::BridgeError;
use crate::google_oauth::TokenManager;
use crate::handlers::{calendar, tasks};
use crate::service::CalendarSync;
use axum::{
    Router,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use url::Url;

const CALLBACK_LANDING_PATH: &str = "calendar-connected";

#[derive(Clone)]
pub struct BridgeState {
    pub tokens: Arc<TokenManager>,
    pub sync: Arc<CalendarSync>,
    pub api_key: Arc<str>,
    /// Frontend page the OAuth callback redirects the browser to.
    pub callback_redirect: Url,
}

impl BridgeState {
    pub fn new(
        tokens: Arc<TokenManager>,
        sync: Arc<CalendarSync>,
        api_key: Arc<str>,
        frontend_url: &str,
    ) -> Result<Self, BridgeError> {
        let callback_redirect = Url::parse(&format!(
            "{}/{}",
            frontend_url.trim_end_matches('/'),
            CALLBACK_LANDING_PATH
        ))?;
        Ok(Self {
            tokens,
            sync,
            api_key,
            callback_redirect,
        })
    }

    /// Wire the Google-backed token manager, calendar client and SQLite
    /// task store over one pool.
    pub fn from_config(cfg: &Config, pool: SqlitePool) -> Result<Self, BridgeError> {
        let tokens = Arc::new(TokenManager::new(
            cfg.google.clone(),
            CredentialsStorage::new(pool.clone()),
        )?);
        let calendar = Arc::new(GoogleCalendarClient::new(&cfg.google)?);
        let task_store = Arc::new(TaskStorage::new(pool));
        let sync = Arc::new(CalendarSync::new(tokens.clone(), calendar, task_store));
        Self::new(
            tokens,
            sync,
            Arc::from(cfg.basic.api_key.as_str()),
            &cfg.basic.frontend_url,
        )
    }
}

pub fn calbridge_router(state: BridgeState) -> Router {
    let calendar_routes = Router::new()
        .route("/connect", get(calendar::connect))
        .route("/oauth2callback", get(calendar::oauth_callback))
        .route("/status", get(calendar::status))
        .route("/sync", post(calendar::sync_all))
        .route("/sync/toggle", put(calendar::toggle_sync))
        .route("/disconnect", delete(calendar::disconnect));

    let hook_routes = Router::new()
        .route("/created", post(tasks::task_created))
        .route("/updated", post(tasks::task_updated))
        .route("/deleted", post(tasks::task_deleted));

    Router::new()
        .nest("/calendar", calendar_routes)
        .nest("/hooks/tasks", hook_routes)
        .with_state(state)
}
