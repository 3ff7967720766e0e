//! SQLite persistence for calendar credentials and the task table.
//!
//! - `schema.rs`: DDL applied at startup
//! - `models.rs`: row structs and their domain conversions
//! - `sqlite.rs`: `CredentialsStorage` and `TaskStorage` over one pool

pub mod models;
pub mod schema;
pub mod sqlite;

pub use models::{DbCredential, DbTask};
pub use schema::SQLITE_INIT;
pub use sqlite::{CredentialsStorage, SqlitePool, TaskStorage, connect, init_schema};
