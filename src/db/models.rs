use crate::google_oauth::credentials::CalendarCredential;
use crate::service::task_store::Task;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DbCredential {
    pub id: i64,
    pub user_id: i64,
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_expiry: DateTime<Utc>,
    pub calendar_id: String,
    pub sync_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbCredential> for CalendarCredential {
    fn from(d: DbCredential) -> Self {
        CalendarCredential {
            user_id: d.user_id,
            access_token: d.access_token,
            refresh_token: d.refresh_token,
            token_expiry: d.token_expiry,
            calendar_id: d.calendar_id,
            sync_enabled: d.sync_enabled,
            created_at: Some(d.created_at),
            updated_at: Some(d.updated_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DbTask {
    pub id: i64,
    pub owner_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub completed: bool,
    pub external_event_id: Option<String>,
}

impl From<DbTask> for Task {
    fn from(d: DbTask) -> Self {
        Task {
            id: d.id,
            owner_id: d.owner_id,
            title: d.title,
            description: d.description,
            due_at: d.due_at,
            completed: d.completed,
            external_event_id: d.external_event_id,
        }
    }
}
