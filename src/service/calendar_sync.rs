use crate::calendar::{CalendarClient, CalendarEvent};
use crate::error::BridgeError;
use crate::google_oauth::TokenManager;
use crate::service::task_store::{Task, TaskStore};
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error, info, warn};

/// Why a sync made no calendar call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotConnected,
    SyncDisabled,
    /// Delete requested for a task that never got an event.
    NotLinked,
}

/// Terminal result of one best-effort calendar operation.
#[derive(Debug)]
pub enum SyncOutcome {
    Skipped(SkipReason),
    Created { event_id: String },
    Updated { event_id: String },
    Deleted { event_id: String },
    Failed(BridgeError),
}

impl SyncOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, SyncOutcome::Failed(_))
    }
}

/// In-memory counters, reset on restart.
#[derive(Debug, Default)]
pub struct SyncMetrics {
    created: AtomicU64,
    updated: AtomicU64,
    deleted: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncMetricsSnapshot {
    pub created: u64,
    pub updated: u64,
    pub deleted: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl SyncMetrics {
    fn record(&self, outcome: &SyncOutcome) {
        let counter = match outcome {
            SyncOutcome::Skipped(_) => &self.skipped,
            SyncOutcome::Created { .. } => &self.created,
            SyncOutcome::Updated { .. } => &self.updated,
            SyncOutcome::Deleted { .. } => &self.deleted,
            SyncOutcome::Failed(_) => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SyncMetricsSnapshot {
        SyncMetricsSnapshot {
            created: self.created.load(Ordering::Relaxed),
            updated: self.updated.load(Ordering::Relaxed),
            deleted: self.deleted.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Sync Orchestrator: maps task mutations onto calendar events without ever
/// failing the mutation that triggered it.
pub struct CalendarSync {
    tokens: Arc<TokenManager>,
    calendar: Arc<dyn CalendarClient>,
    tasks: Arc<dyn TaskStore>,
    metrics: SyncMetrics,
}

impl CalendarSync {
    pub fn new(
        tokens: Arc<TokenManager>,
        calendar: Arc<dyn CalendarClient>,
        tasks: Arc<dyn TaskStore>,
    ) -> Self {
        Self {
            tokens,
            calendar,
            tasks,
            metrics: SyncMetrics::default(),
        }
    }

    pub fn metrics(&self) -> SyncMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Create or update the task's event. On first create the event id is
    /// written to the task store and to `task`.
    pub async fn sync_task_to_calendar(&self, task: &mut Task, user_id: i64) -> SyncOutcome {
        let outcome = self
            .try_sync(task, user_id)
            .await
            .unwrap_or_else(SyncOutcome::Failed);
        self.finish("sync", task.id, user_id, outcome)
    }

    pub async fn delete_task_from_calendar(&self, task: &Task, user_id: i64) -> SyncOutcome {
        let outcome = self
            .try_delete(task, user_id)
            .await
            .unwrap_or_else(SyncOutcome::Failed);
        self.finish("delete", task.id, user_id, outcome)
    }

    /// Sync every task owned by `user_id`; returns how many syncs were issued.
    pub async fn sync_all_tasks(&self, user_id: i64) -> usize {
        let tasks = match self.tasks.list_by_owner(user_id).await {
            Ok(tasks) => tasks,
            Err(e) => {
                warn!(user_id, error_kind = e.kind(), error = %e, "failed to list tasks for full sync");
                return 0;
            }
        };

        let mut synced = 0;
        for mut task in tasks {
            self.sync_task_to_calendar(&mut task, user_id).await;
            synced += 1;
        }
        info!(user_id, synced, "full calendar sync issued");
        synced
    }

    // Collaborator hooks: call after the task mutation is persisted. The
    // outcome is logged and dropped here.

    pub async fn on_task_created(&self, task: &mut Task, user_id: i64) {
        let _ = self.sync_task_to_calendar(task, user_id).await;
    }

    pub async fn on_task_updated(&self, task: &mut Task, user_id: i64) {
        let _ = self.sync_task_to_calendar(task, user_id).await;
    }

    pub async fn on_task_deleted(&self, task: &Task, user_id: i64) {
        let _ = self.delete_task_from_calendar(task, user_id).await;
    }

    /// Fresh credential read on every call; a credential is never cached here.
    async fn skip_reason(&self, user_id: i64) -> Result<Option<SkipReason>, BridgeError> {
        Ok(match self.tokens.store().get(user_id).await? {
            None => Some(SkipReason::NotConnected),
            Some(cred) if !cred.sync_enabled => Some(SkipReason::SyncDisabled),
            Some(_) => None,
        })
    }

    async fn try_sync(&self, task: &mut Task, user_id: i64) -> Result<SyncOutcome, BridgeError> {
        if let Some(reason) = self.skip_reason(user_id).await? {
            return Ok(SyncOutcome::Skipped(reason));
        }

        // Hook callers never see the event id, so the store holds the link.
        if task.external_event_id.is_none() {
            let stored = self
                .tasks
                .get(task.id)
                .await?
                .ok_or(BridgeError::TaskNotFound { task_id: task.id })?;
            task.external_event_id = stored.external_event_id;
        }

        let cred = self.tokens.ensure_valid(user_id).await?;
        let event = CalendarEvent::from_task(task, Utc::now().date_naive());

        if let Some(event_id) = task.external_event_id.clone() {
            self.calendar
                .update_event(&cred.access_token, &cred.calendar_id, &event_id, &event)
                .await?;
            return Ok(SyncOutcome::Updated { event_id });
        }

        let event_id = self
            .calendar
            .insert_event(&cred.access_token, &cred.calendar_id, &event)
            .await?;
        self.tasks.set_external_event_id(task.id, &event_id).await?;
        task.external_event_id = Some(event_id.clone());
        Ok(SyncOutcome::Created { event_id })
    }

    async fn try_delete(&self, task: &Task, user_id: i64) -> Result<SyncOutcome, BridgeError> {
        let event_id = match task.external_event_id.clone() {
            Some(id) => Some(id),
            None => self
                .tasks
                .get(task.id)
                .await?
                .and_then(|stored| stored.external_event_id),
        };
        let Some(event_id) = event_id else {
            return Ok(SyncOutcome::Skipped(SkipReason::NotLinked));
        };
        if let Some(reason) = self.skip_reason(user_id).await? {
            return Ok(SyncOutcome::Skipped(reason));
        }

        let cred = self.tokens.ensure_valid(user_id).await?;
        self.calendar
            .delete_event(&cred.access_token, &cred.calendar_id, &event_id)
            .await?;
        Ok(SyncOutcome::Deleted { event_id })
    }

    fn finish(&self, op: &str, task_id: i64, user_id: i64, outcome: SyncOutcome) -> SyncOutcome {
        self.metrics.record(&outcome);
        match &outcome {
            SyncOutcome::Skipped(reason) => {
                debug!(op, task_id, user_id, ?reason, "calendar sync skipped");
            }
            SyncOutcome::Created { event_id } => {
                info!(op, task_id, user_id, event_id = %event_id, "created calendar event");
            }
            SyncOutcome::Updated { event_id } => {
                info!(op, task_id, user_id, event_id = %event_id, "updated calendar event");
            }
            SyncOutcome::Deleted { event_id } => {
                info!(op, task_id, user_id, event_id = %event_id, "deleted calendar event");
            }
            SyncOutcome::Failed(e @ BridgeError::Database(_)) => {
                error!(op, task_id, user_id, error_kind = e.kind(), error = %e, "calendar sync failed");
            }
            SyncOutcome::Failed(e) => {
                warn!(op, task_id, user_id, error_kind = e.kind(), error = %e, "calendar sync failed");
            }
        }
        outcome
    }
}
