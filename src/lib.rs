pub mod calendar;
pub mod config;
pub mod db;
pub mod error;
pub mod google_oauth;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod service;

pub use error::BridgeError;
pub use google_oauth::credentials::CalendarCredential;
pub use google_oauth::service::TokenManager;
pub use service::calendar_sync::CalendarSync;
