use crate::error::BridgeError;
use crate::middleware::auth::{AuthenticatedUser, USER_ID_HEADER};
use crate::router::BridgeState;
use crate::service::task_store::Task;
use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::debug;

/// Notification from the task service, sent after the mutation is persisted.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskHookRequest {
    pub user_id: i64,
    pub task: Task,
}

impl TaskHookRequest {
    /// The body must speak for the same user the headers authenticated.
    fn for_caller(self, caller: i64) -> Result<Self, BridgeError> {
        if self.user_id != caller {
            return Err(BridgeError::Validation(format!(
                "body userId {} does not match `{USER_ID_HEADER}` {caller}",
                self.user_id
            )));
        }
        Ok(self)
    }
}

// Once authenticated and consistent, hooks answer 204: the sync outcome never
// reaches the task service.

/// POST /hooks/tasks/created
pub async fn task_created(
    State(state): State<BridgeState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Json(req): Json<TaskHookRequest>,
) -> Result<StatusCode, BridgeError> {
    let TaskHookRequest { user_id, mut task } = req.for_caller(caller)?;
    debug!(user_id, task_id = task.id, "task created hook");
    state.sync.on_task_created(&mut task, user_id).await;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /hooks/tasks/updated
pub async fn task_updated(
    State(state): State<BridgeState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Json(req): Json<TaskHookRequest>,
) -> Result<StatusCode, BridgeError> {
    let TaskHookRequest { user_id, mut task } = req.for_caller(caller)?;
    debug!(user_id, task_id = task.id, "task updated hook");
    state.sync.on_task_updated(&mut task, user_id).await;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /hooks/tasks/deleted
pub async fn task_deleted(
    State(state): State<BridgeState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    Json(req): Json<TaskHookRequest>,
) -> Result<StatusCode, BridgeError> {
    let TaskHookRequest { user_id, task } = req.for_caller(caller)?;
    debug!(user_id, task_id = task.id, "task deleted hook");
    state.sync.on_task_deleted(&task, user_id).await;
    Ok(StatusCode::NO_CONTENT)
}
