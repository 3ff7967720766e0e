use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
pub const CALENDAR_EVENTS_SCOPE: &str = "https://www.googleapis.com/auth/calendar.events";

const ENV_PREFIX: &str = "CALBRIDGE_";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub basic: BasicConfig,
    pub google: GoogleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicConfig {
    pub listen_addr: String,
    pub database_url: String,
    pub loglevel: String,
    /// Shared secret presented by the fronting task service.
    pub api_key: String,
    /// Base URL of the browser frontend; OAuth callbacks redirect under it.
    pub frontend_url: String,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
            database_url: "sqlite://calbridge.db".to_string(),
            loglevel: "info".to_string(),
            api_key: String::new(),
            frontend_url: "http://localhost:5173".to_string(),
        }
    }
}

/// Provider-side OAuth client and Calendar API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scope: String,
    pub auth_uri: String,
    pub token_uri: String,
    pub calendar_api_base: String,
    pub default_calendar_id: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    /// Treat tokens as expired this many seconds before `token_expiry`.
    pub expiry_skew_secs: u64,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: String::new(),
            scope: CALENDAR_EVENTS_SCOPE.to_string(),
            auth_uri: GOOGLE_AUTH_URL.to_string(),
            token_uri: GOOGLE_TOKEN_URI.to_string(),
            calendar_api_base: GOOGLE_CALENDAR_API_BASE.to_string(),
            default_calendar_id: "primary".to_string(),
            connect_timeout_secs: 5,
            request_timeout_secs: 15,
            expiry_skew_secs: 0,
        }
    }
}

impl GoogleConfig {
    pub fn is_client_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty() && !self.redirect_uri.is_empty()
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Config {
    /// Defaults, then `config.toml`, then `CALBRIDGE_*` environment variables.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }
}
