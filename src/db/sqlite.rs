use crate::db::models::{DbCredential, DbTask};
use crate::db::schema::SQLITE_INIT;
use crate::error::BridgeError;
use crate::google_oauth::credentials::CalendarCredential;
use crate::service::task_store::{Task, TaskStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;

pub type SqlitePool = Pool<Sqlite>;

/// Open (creating if missing) the database behind `database_url`.
pub async fn connect(database_url: &str) -> Result<SqlitePool, BridgeError> {
    let connect_opts = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(connect_opts).await?;
    Ok(pool)
}

/// Initialize the schema by executing the bundled DDL.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), BridgeError> {
    // sqlx::query runs one statement at a time
    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }
    Ok(())
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

/// Credential Store: one `calendar_credentials` row per user.
#[derive(Clone)]
pub struct CredentialsStorage {
    pool: SqlitePool,
}

impl CredentialsStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, user_id: i64) -> Result<Option<CalendarCredential>, BridgeError> {
        let row = sqlx::query(
            r#"SELECT id, user_id, access_token, refresh_token, token_expiry,
               calendar_id, sync_enabled, created_at, updated_at
               FROM calendar_credentials WHERE user_id = ?"#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => Ok(Some(Self::row_to_model(row)?.into())),
            None => Ok(None),
        }
    }

    /// Upsert by unique user_id and return the stored record.
    /// `created_at` survives updates; `updated_at` is stamped on every save.
    pub async fn save(&self, cred: CalendarCredential) -> Result<CalendarCredential, BridgeError> {
        let now = Utc::now().to_rfc3339();
        let sync_i = if cred.sync_enabled { 1 } else { 0 };
        sqlx::query(
            r#"
            INSERT INTO calendar_credentials (
                user_id, access_token, refresh_token, token_expiry,
                calendar_id, sync_enabled, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                access_token=excluded.access_token,
                refresh_token=excluded.refresh_token,
                token_expiry=excluded.token_expiry,
                calendar_id=excluded.calendar_id,
                sync_enabled=excluded.sync_enabled,
                updated_at=excluded.updated_at
            "#,
        )
        .bind(cred.user_id)
        .bind(cred.access_token)
        .bind(cred.refresh_token)
        .bind(cred.token_expiry.to_rfc3339())
        .bind(cred.calendar_id)
        .bind(sync_i)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.get(cred.user_id)
            .await?
            .ok_or(BridgeError::NotConnected {
                user_id: cred.user_id,
            })
    }

    pub async fn exists(&self, user_id: i64) -> Result<bool, BridgeError> {
        let rec: (i64,) =
            sqlx::query_as("SELECT COUNT(1) FROM calendar_credentials WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(rec.0 > 0)
    }

    /// Hard delete. Deleting an absent row is not an error.
    pub async fn delete(&self, user_id: i64) -> Result<(), BridgeError> {
        sqlx::query("DELETE FROM calendar_credentials WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    fn row_to_model(row: SqliteRow) -> Result<DbCredential, BridgeError> {
        let id: i64 = row.try_get("id")?;
        let user_id: i64 = row.try_get("user_id")?;
        let access_token: String = row.try_get("access_token")?;
        let refresh_token: Option<String> = row.try_get("refresh_token")?;
        let expiry_str: String = row.try_get("token_expiry")?;
        let calendar_id: String = row.try_get("calendar_id")?;
        let sync_i: i64 = row.try_get("sync_enabled")?;
        let created_str: String = row.try_get("created_at")?;
        let updated_str: String = row.try_get("updated_at")?;

        Ok(DbCredential {
            id,
            user_id,
            access_token,
            refresh_token,
            token_expiry: parse_ts(&expiry_str)?,
            calendar_id,
            sync_enabled: sync_i != 0,
            created_at: parse_ts(&created_str)?,
            updated_at: parse_ts(&updated_str)?,
        })
    }
}

/// SQLite-backed task collaborator.
#[derive(Clone)]
pub struct TaskStorage {
    pool: SqlitePool,
}

impl TaskStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a task row; `id` and `external_event_id` on the input are ignored.
    pub async fn insert(&self, task: &Task) -> Result<Task, BridgeError> {
        let completed_i = if task.completed { 1 } else { 0 };
        let rec: (i64,) = sqlx::query_as(
            r#"INSERT INTO tasks (owner_id, title, description, due_at, completed)
               VALUES (?, ?, ?, ?, ?) RETURNING id"#,
        )
        .bind(task.owner_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.due_at.map(|d| d.to_rfc3339()))
        .bind(completed_i)
        .fetch_one(&self.pool)
        .await?;

        Ok(Task {
            id: rec.0,
            external_event_id: None,
            ..task.clone()
        })
    }

    fn row_to_model(row: SqliteRow) -> Result<DbTask, BridgeError> {
        let due_str: Option<String> = row.try_get("due_at")?;
        let completed_i: i64 = row.try_get("completed")?;
        Ok(DbTask {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            due_at: due_str.as_deref().map(parse_ts).transpose()?,
            completed: completed_i != 0,
            external_event_id: row.try_get("external_event_id")?,
        })
    }
}

#[async_trait]
impl TaskStore for TaskStorage {
    async fn get(&self, task_id: i64) -> Result<Option<Task>, BridgeError> {
        let row = sqlx::query(
            r#"SELECT id, owner_id, title, description, due_at, completed, external_event_id
               FROM tasks WHERE id = ?"#,
        )
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| Self::row_to_model(r).map(Task::from)).transpose()
    }

    async fn list_by_owner(&self, owner_id: i64) -> Result<Vec<Task>, BridgeError> {
        let rows = sqlx::query(
            r#"SELECT id, owner_id, title, description, due_at, completed, external_event_id
               FROM tasks WHERE owner_id = ? ORDER BY id"#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|r| Self::row_to_model(r).map(Task::from))
            .collect()
    }

    /// The link is written at most once; an already-linked task keeps its id
    /// and the call fails.
    async fn set_external_event_id(&self, task_id: i64, event_id: &str) -> Result<(), BridgeError> {
        let res = sqlx::query(
            "UPDATE tasks SET external_event_id = ? WHERE id = ? AND external_event_id IS NULL",
        )
        .bind(event_id)
        .bind(task_id)
        .execute(&self.pool)
        .await?;
        if res.rows_affected() == 0 {
            return Err(BridgeError::EventLinkRejected { task_id });
        }
        Ok(())
    }
}
