use crate::error::BridgeError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Task record as owned by the task service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub owner_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub external_event_id: Option<String>,
}

/// The slice of the task service the calendar sync needs.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn get(&self, task_id: i64) -> Result<Option<Task>, BridgeError>;

    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<Task>, BridgeError>;

    /// Annotate a task with the calendar event created for it.
    async fn set_external_event_id(&self, task_id: i64, event_id: &str) -> Result<(), BridgeError>;
}
