#![allow(dead_code)]

use async_trait::async_trait;
use calbridge::BridgeError;
use calbridge::calendar::{CalendarClient, CalendarEvent};
use calbridge::config::GoogleConfig;
use calbridge::db::{CredentialsStorage, SqlitePool, TaskStorage, init_schema};
use calbridge::google_oauth::{CalendarCredential, TokenManager};
use calbridge::service::{CalendarSync, Task};
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Single-connection in-memory database so every query sees the same data.
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("failed to open in-memory sqlite");
    init_schema(&pool).await.expect("failed to init schema");
    pool
}

pub fn google_config(token_server: &MockServer) -> GoogleConfig {
    GoogleConfig {
        client_id: "test-client".into(),
        client_secret: "test-secret".into(),
        redirect_uri: "http://localhost:8000/calendar/oauth2callback".into(),
        token_uri: format!("{}/token", token_server.uri()),
        calendar_api_base: format!("{}/calendar/v3", token_server.uri()),
        ..GoogleConfig::default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CalendarCall {
    Insert {
        access_token: String,
        calendar_id: String,
        event: CalendarEvent,
    },
    Update {
        access_token: String,
        calendar_id: String,
        event_id: String,
        event: CalendarEvent,
    },
    Delete {
        access_token: String,
        calendar_id: String,
        event_id: String,
    },
}

/// Calendar double that records every call; can be switched to fail.
#[derive(Default)]
pub struct RecordingCalendar {
    calls: Mutex<Vec<CalendarCall>>,
    inserted: AtomicUsize,
    failing: AtomicBool,
}

impl RecordingCalendar {
    pub fn calls(&self) -> Vec<CalendarCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn record(&self, call: CalendarCall) -> Result<(), BridgeError> {
        self.calls.lock().unwrap().push(call);
        if self.failing.load(Ordering::SeqCst) {
            return Err(BridgeError::Provider {
                status: Some(500),
                message: "backend error".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CalendarClient for RecordingCalendar {
    async fn insert_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event: &CalendarEvent,
    ) -> Result<String, BridgeError> {
        self.record(CalendarCall::Insert {
            access_token: access_token.into(),
            calendar_id: calendar_id.into(),
            event: event.clone(),
        })?;
        let n = self.inserted.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("evt-{n}"))
    }

    async fn update_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event_id: &str,
        event: &CalendarEvent,
    ) -> Result<(), BridgeError> {
        self.record(CalendarCall::Update {
            access_token: access_token.into(),
            calendar_id: calendar_id.into(),
            event_id: event_id.into(),
            event: event.clone(),
        })
    }

    async fn delete_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event_id: &str,
    ) -> Result<(), BridgeError> {
        self.record(CalendarCall::Delete {
            access_token: access_token.into(),
            calendar_id: calendar_id.into(),
            event_id: event_id.into(),
        })
    }
}

pub struct Harness {
    pub server: MockServer,
    pub pool: SqlitePool,
    pub credentials: CredentialsStorage,
    pub tasks: TaskStorage,
    pub tokens: Arc<TokenManager>,
    pub calendar: Arc<RecordingCalendar>,
    pub sync: Arc<CalendarSync>,
}

impl Harness {
    pub async fn new() -> Self {
        let server = MockServer::start().await;
        let pool = memory_pool().await;
        let credentials = CredentialsStorage::new(pool.clone());
        let tasks = TaskStorage::new(pool.clone());
        let tokens = Arc::new(
            TokenManager::new(google_config(&server), credentials.clone())
                .expect("token manager"),
        );
        let calendar = Arc::new(RecordingCalendar::default());
        let sync = Arc::new(CalendarSync::new(
            tokens.clone(),
            calendar.clone(),
            Arc::new(tasks.clone()),
        ));
        Self {
            server,
            pool,
            credentials,
            tasks,
            tokens,
            calendar,
            sync,
        }
    }

    pub async fn seed_credential(&self, user_id: i64, expiry: DateTime<Utc>) -> CalendarCredential {
        let cred = CalendarCredential::connected(
            user_id,
            "stored-access".into(),
            Some("stored-refresh".into()),
            expiry,
            "primary",
        );
        self.credentials.save(cred).await.expect("seed credential")
    }

    pub async fn insert_task(&self, owner_id: i64, title: &str, due_at: Option<DateTime<Utc>>) -> Task {
        let task = Task {
            id: 0,
            owner_id,
            title: title.into(),
            description: Some(format!("{title} details")),
            due_at,
            completed: false,
            external_event_id: None,
        };
        self.tasks.insert(&task).await.expect("insert task")
    }
}

pub async fn mount_refresh(server: &MockServer, template: ResponseTemplate, expected: u64) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(template)
        .expect(expected)
        .mount(server)
        .await;
}

pub async fn mount_code_exchange(server: &MockServer, template: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .respond_with(template)
        .mount(server)
        .await;
}

pub fn token_ok(access_token: &str, refresh_token: Option<&str>) -> ResponseTemplate {
    let mut body = json!({
        "access_token": access_token,
        "token_type": "Bearer",
        "expires_in": 3599,
        "scope": "https://www.googleapis.com/auth/calendar.events",
    });
    if let Some(rt) = refresh_token {
        body["refresh_token"] = json!(rt);
    }
    ResponseTemplate::new(200).set_body_json(body)
}

pub fn invalid_grant() -> ResponseTemplate {
    ResponseTemplate::new(400).set_body_json(json!({
        "error": "invalid_grant",
        "error_description": "Token has been expired or revoked.",
    }))
}
