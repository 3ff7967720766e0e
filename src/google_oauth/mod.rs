pub mod credentials;
pub mod endpoints;
pub mod service;

pub use credentials::CalendarCredential;
pub use service::TokenManager;
