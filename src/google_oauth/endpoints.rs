use crate::config::GoogleConfig;
use crate::error::BridgeError;

use oauth2::{
    AuthUrl, AuthorizationCode, Client as OAuth2Client, ClientId, ClientSecret, CsrfToken,
    EndpointNotSet, EndpointSet, RedirectUrl, RefreshToken, Scope, StandardRevocableToken,
    TokenResponse, TokenUrl,
    basic::{
        BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
        BasicTokenResponse,
    },
};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Used when Google omits `expires_in`.
const DEFAULT_EXPIRES_IN: Duration = Duration::from_secs(3600);

/// Token material returned by either grant.
#[derive(Clone)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Duration,
}

impl From<BasicTokenResponse> for TokenGrant {
    fn from(resp: BasicTokenResponse) -> Self {
        Self {
            access_token: resp.access_token().secret().to_string(),
            refresh_token: resp
                .refresh_token()
                .map(|t| t.secret().to_string())
                .filter(|t| !t.is_empty()),
            expires_in: resp.expires_in().unwrap_or(DEFAULT_EXPIRES_IN),
        }
    }
}

/// Google OAuth endpoints bound to one configured client.
pub struct GoogleOauthEndpoints {
    client: GoogleOauth2Client,
    scope: String,
    http: reqwest::Client,
}

impl GoogleOauthEndpoints {
    pub fn new(cfg: &GoogleConfig) -> Result<Self, BridgeError> {
        let client = build_oauth2_client(cfg)?;
        // oauth2 requires redirects to be disabled on the token client.
        let http = reqwest::Client::builder()
            .user_agent("calbridge-oauth/1.0")
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(cfg.connect_timeout())
            .timeout(cfg.request_timeout())
            .build()
            .map_err(|e| BridgeError::TokenEndpoint(format!("http client init failed: {e}")))?;
        Ok(Self {
            client,
            scope: cfg.scope.clone(),
            http,
        })
    }

    /// Consent URL carrying `state` verbatim; offline access so Google returns
    /// a refresh token.
    pub fn build_authorize_url(&self, state: String) -> Url {
        let (url, _csrf) = self
            .client
            .authorize_url(move || CsrfToken::new(state))
            .add_scope(Scope::new(self.scope.clone()))
            .add_extra_param("access_type", "offline")
            .url();
        url
    }

    pub async fn exchange_authorization_code(
        &self,
        code: AuthorizationCode,
    ) -> Result<TokenGrant, BridgeError> {
        let resp = self
            .client
            .exchange_code(code)
            .request_async(&self.http)
            .await
            .map_err(BridgeError::from_exchange)?;
        debug!("authorization code exchanged");
        Ok(resp.into())
    }

    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenGrant, BridgeError> {
        let resp = self
            .client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(&self.http)
            .await
            .map_err(BridgeError::from_refresh)?;
        debug!("refresh grant completed");
        Ok(resp.into())
    }
}

/// Build the Google OAuth2 client from configuration.
fn build_oauth2_client(cfg: &GoogleConfig) -> Result<GoogleOauth2Client, BridgeError> {
    let mut client = OAuth2Client::new(ClientId::new(cfg.client_id.clone()))
        .set_client_secret(ClientSecret::new(cfg.client_secret.clone()))
        .set_auth_uri(AuthUrl::new(cfg.auth_uri.clone())?)
        .set_token_uri(TokenUrl::new(cfg.token_uri.clone())?);
    if !cfg.redirect_uri.is_empty() {
        client = client.set_redirect_uri(RedirectUrl::new(cfg.redirect_uri.clone())?);
    }
    Ok(client)
}

pub(super) type GoogleOauth2Client = OAuth2Client<
    BasicErrorResponse,
    BasicTokenResponse,
    BasicTokenIntrospectionResponse,
    StandardRevocableToken,
    BasicRevocationErrorResponse,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;
