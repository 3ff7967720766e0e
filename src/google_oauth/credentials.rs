use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Per-user OAuth2 token set plus calendar target and sync toggle.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarCredential {
    pub user_id: i64,
    pub access_token: String,
    /// Only returned by Google on first consent.
    pub refresh_token: Option<String>,
    pub token_expiry: DateTime<Utc>,
    pub calendar_id: String,
    pub sync_enabled: bool,
    /// Set by storage; `None` until the record has been saved.
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl CalendarCredential {
    /// Fresh record for a first successful authorization.
    pub fn connected(
        user_id: i64,
        access_token: String,
        refresh_token: Option<String>,
        token_expiry: DateTime<Utc>,
        calendar_id: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            access_token,
            refresh_token,
            token_expiry,
            calendar_id: calendar_id.into(),
            sync_enabled: true,
            created_at: None,
            updated_at: None,
        }
    }

    /// True once `now` has reached `token_expiry - skew`. A skew reaching
    /// past the earliest representable time counts as expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>, skew: TimeDelta) -> bool {
        self.token_expiry
            .checked_sub_signed(skew)
            .is_none_or(|deadline| deadline <= now)
    }
}

// Keep tokens out of logs.
impl std::fmt::Debug for CalendarCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalendarCredential")
            .field("user_id", &self.user_id)
            .field("token_expiry", &self.token_expiry)
            .field("calendar_id", &self.calendar_id)
            .field("sync_enabled", &self.sync_enabled)
            .field("has_refresh_token", &self.refresh_token.is_some())
            .finish_non_exhaustive()
    }
}
