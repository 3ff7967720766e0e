pub mod calendar_sync;
pub mod task_store;

pub use calendar_sync::{CalendarSync, SkipReason, SyncMetricsSnapshot, SyncOutcome};
pub use task_store::{Task, TaskStore};
