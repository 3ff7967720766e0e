use super::endpoints::GoogleOauthEndpoints;
use crate::config::GoogleConfig;
use crate::db::CredentialsStorage;
use crate::error::BridgeError;
use crate::google_oauth::credentials::CalendarCredential;
use chrono::{DateTime, TimeDelta, Utc};
use oauth2::AuthorizationCode;
use tracing::{debug, info, warn};
use url::Url;

/// Token Lifecycle Manager: consent URL, code exchange, expiry detection and
/// refresh, all persisted through the Credential Store.
pub struct TokenManager {
    config: GoogleConfig,
    endpoints: GoogleOauthEndpoints,
    store: CredentialsStorage,
}

impl TokenManager {
    pub fn new(config: GoogleConfig, store: CredentialsStorage) -> Result<Self, BridgeError> {
        let endpoints = GoogleOauthEndpoints::new(&config)?;
        Ok(Self {
            config,
            endpoints,
            store,
        })
    }

    pub fn store(&self) -> &CredentialsStorage {
        &self.store
    }

    fn skew(&self) -> TimeDelta {
        i64::try_from(self.config.expiry_skew_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX)
    }

    /// `expires_in` comes from the provider; out-of-range values are an error.
    fn expiry_from_now(expires_in: std::time::Duration) -> Result<DateTime<Utc>, BridgeError> {
        i64::try_from(expires_in.as_secs())
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|delta| Utc::now().checked_add_signed(delta))
            .ok_or_else(|| {
                BridgeError::TokenEndpoint(format!(
                    "expires_in out of range: {}s",
                    expires_in.as_secs()
                ))
            })
    }

    /// Provider consent URL with `user_id` round-tripped as `state`.
    pub fn authorization_url(&self, user_id: i64) -> Result<Url, BridgeError> {
        if !self.config.is_client_configured() {
            return Err(BridgeError::Validation(
                "google oauth client is not configured".to_string(),
            ));
        }
        let url = self.endpoints.build_authorize_url(user_id.to_string());
        info!(user_id, "generated calendar authorization url");
        Ok(url)
    }

    /// Exchange an authorization code and create or update the user's
    /// credential.
    pub async fn exchange_code(
        &self,
        code: &str,
        user_id: i64,
    ) -> Result<CalendarCredential, BridgeError> {
        let grant = self
            .endpoints
            .exchange_authorization_code(AuthorizationCode::new(code.to_owned()))
            .await?;
        let token_expiry = Self::expiry_from_now(grant.expires_in)?;

        let credential = match self.store.get(user_id).await? {
            Some(mut existing) => {
                existing.access_token = grant.access_token;
                existing.token_expiry = token_expiry;
                // Google omits the refresh token on re-consent.
                if let Some(rt) = grant.refresh_token {
                    existing.refresh_token = Some(rt);
                }
                existing
            }
            None => {
                if grant.refresh_token.is_none() {
                    warn!(user_id, "first authorization returned no refresh token");
                }
                CalendarCredential::connected(
                    user_id,
                    grant.access_token,
                    grant.refresh_token,
                    token_expiry,
                    self.config.default_calendar_id.clone(),
                )
            }
        };

        let saved = self.store.save(credential).await?;
        info!(user_id, calendar_id = %saved.calendar_id, "saved calendar credential");
        Ok(saved)
    }

    /// The only way to obtain a credential that is safe to use: refreshes
    /// first when the stored token has expired.
    pub async fn ensure_valid(&self, user_id: i64) -> Result<CalendarCredential, BridgeError> {
        let cred = self
            .store
            .get(user_id)
            .await?
            .ok_or(BridgeError::NotConnected { user_id })?;

        if !cred.is_expired_at(Utc::now(), self.skew()) {
            return Ok(cred);
        }

        debug!(user_id, token_expiry = %cred.token_expiry, "access token expired; refreshing");
        self.refresh(user_id).await?;
        self.store
            .get(user_id)
            .await?
            .ok_or(BridgeError::NotConnected { user_id })
    }

    /// Mint a new access token from the stored refresh token. The refresh
    /// token itself is kept as is.
    pub async fn refresh(&self, user_id: i64) -> Result<CalendarCredential, BridgeError> {
        let mut cred = self
            .store
            .get(user_id)
            .await?
            .ok_or(BridgeError::NotConnected { user_id })?;

        let refresh_token = cred
            .refresh_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| BridgeError::RefreshFailed("no refresh token stored".to_string()))?;

        let grant = self.endpoints.refresh_access_token(refresh_token).await?;
        cred.access_token = grant.access_token;
        cred.token_expiry = Self::expiry_from_now(grant.expires_in)?;

        let saved = self.store.save(cred).await?;
        info!(user_id, "refreshed calendar access token");
        Ok(saved)
    }

    pub async fn toggle_sync(
        &self,
        user_id: i64,
        enabled: bool,
    ) -> Result<CalendarCredential, BridgeError> {
        let mut cred = self
            .store
            .get(user_id)
            .await?
            .ok_or(BridgeError::NotConnected { user_id })?;
        cred.sync_enabled = enabled;
        let saved = self.store.save(cred).await?;
        info!(user_id, enabled, "updated calendar sync setting");
        Ok(saved)
    }

    /// Hard delete; reconnecting requires a full authorization again.
    pub async fn disconnect(&self, user_id: i64) -> Result<(), BridgeError> {
        self.store.delete(user_id).await?;
        info!(user_id, "disconnected google calendar");
        Ok(())
    }

    pub async fn status(&self, user_id: i64) -> Result<Option<CalendarCredential>, BridgeError> {
        self.store.get(user_id).await
    }

    pub async fn is_connected(&self, user_id: i64) -> Result<bool, BridgeError> {
        self.store.exists(user_id).await
    }
}
