//! Google Calendar API client.
//!
//! `CalendarClient` is the capability set the sync path needs. The network
//! implementation performs exactly one request per call; retries are the
//! caller's decision.

use crate::calendar::event::CalendarEvent;
use crate::config::GoogleConfig;
use crate::error::BridgeError;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

/// Event operations against one calendar using a valid access token.
#[async_trait]
pub trait CalendarClient: Send + Sync {
    /// Returns the provider's id for the created event.
    async fn insert_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event: &CalendarEvent,
    ) -> Result<String, BridgeError>;

    async fn update_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event_id: &str,
        event: &CalendarEvent,
    ) -> Result<(), BridgeError>;

    async fn delete_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event_id: &str,
    ) -> Result<(), BridgeError>;
}

#[derive(Debug, Deserialize)]
struct InsertedEvent {
    id: String,
}

pub struct GoogleCalendarClient {
    http: reqwest::Client,
    api_base: String,
}

impl GoogleCalendarClient {
    pub fn new(cfg: &GoogleConfig) -> Result<Self, BridgeError> {
        let http = reqwest::Client::builder()
            .user_agent("calbridge/1.0")
            .connect_timeout(cfg.connect_timeout())
            .timeout(cfg.request_timeout())
            .build()
            .map_err(|e| BridgeError::Provider {
                status: None,
                message: format!("http client init failed: {e}"),
            })?;
        Ok(Self {
            http,
            api_base: cfg.calendar_api_base.trim_end_matches('/').to_string(),
        })
    }

    fn events_url(&self, calendar_id: &str) -> Result<url::Url, BridgeError> {
        let mut url = url::Url::parse(&self.api_base)?;
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(["calendars", calendar_id, "events"]);
        Ok(url)
    }

    fn event_url(&self, calendar_id: &str, event_id: &str) -> Result<url::Url, BridgeError> {
        let mut url = self.events_url(calendar_id)?;
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .push(event_id);
        Ok(url)
    }
}

/// Timeouts and connection failures take the same path as non-2xx replies.
fn transport_error(e: reqwest::Error) -> BridgeError {
    let message = if e.is_timeout() {
        "request timeout".to_string()
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else {
        format!("request failed: {e}")
    };
    BridgeError::Provider {
        status: e.status().map(|s| s.as_u16()),
        message,
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, BridgeError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(BridgeError::Provider {
        status: Some(status.as_u16()),
        message: format!("API error ({status}): {body}"),
    })
}

#[async_trait]
impl CalendarClient for GoogleCalendarClient {
    async fn insert_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event: &CalendarEvent,
    ) -> Result<String, BridgeError> {
        let resp = self
            .http
            .post(self.events_url(calendar_id)?)
            .bearer_auth(access_token)
            .json(event)
            .send()
            .await
            .map_err(transport_error)?;
        let created: InsertedEvent = check_status(resp)
            .await?
            .json()
            .await
            .map_err(transport_error)?;
        debug!(calendar_id, event_id = %created.id, "inserted calendar event");
        Ok(created.id)
    }

    async fn update_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event_id: &str,
        event: &CalendarEvent,
    ) -> Result<(), BridgeError> {
        let resp = self
            .http
            .put(self.event_url(calendar_id, event_id)?)
            .bearer_auth(access_token)
            .json(event)
            .send()
            .await
            .map_err(transport_error)?;
        check_status(resp).await?;
        debug!(calendar_id, event_id, "updated calendar event");
        Ok(())
    }

    async fn delete_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event_id: &str,
    ) -> Result<(), BridgeError> {
        let resp = self
            .http
            .delete(self.event_url(calendar_id, event_id)?)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(transport_error)?;
        check_status(resp).await?;
        debug!(calendar_id, event_id, "deleted calendar event");
        Ok(())
    }
}
