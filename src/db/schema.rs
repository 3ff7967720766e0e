//! SQL DDL for initializing the credential and task storage.
//! SQLite-first design; can be adapted for other RDBMS.

/// SQLite schema with:
/// - `calendar_credentials`: one row per user, `user_id` UNIQUE
/// - timestamps stored as RFC3339 TEXT, booleans as INTEGER 0/1
/// - `tasks`: the task collaborator's rows; only `external_event_id` is
///   written by the sync path
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS calendar_credentials (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL UNIQUE,
    access_token TEXT NOT NULL,
    refresh_token TEXT NULL,
    token_expiry TEXT NOT NULL, -- RFC3339
    calendar_id TEXT NOT NULL,
    sync_enabled INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id INTEGER NOT NULL,
    title TEXT NOT NULL,
    description TEXT NULL,
    due_at TEXT NULL, -- RFC3339
    completed INTEGER NOT NULL DEFAULT 0,
    external_event_id TEXT NULL
);

CREATE INDEX IF NOT EXISTS idx_tasks_owner_id ON tasks(owner_id);
"#;
