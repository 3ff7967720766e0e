mod common;

use calbridge::BridgeError;
use calbridge::config::GoogleConfig;
use calbridge::google_oauth::{CalendarCredential, TokenManager};
use chrono::{TimeDelta, Utc};
use common::{Harness, invalid_grant, mount_code_exchange, mount_refresh, token_ok};
use serde_json::json;
use wiremock::ResponseTemplate;

#[tokio::test]
async fn first_exchange_creates_enabled_credential_on_primary_calendar() {
    let h = Harness::new().await;
    mount_code_exchange(&h.server, token_ok("new-access", Some("new-refresh"))).await;

    let before = Utc::now();
    let cred = h.tokens.exchange_code("auth-code", 7).await.expect("exchange");

    assert_eq!(cred.user_id, 7);
    assert_eq!(cred.access_token, "new-access");
    assert_eq!(cred.refresh_token.as_deref(), Some("new-refresh"));
    assert_eq!(cred.calendar_id, "primary");
    assert!(cred.sync_enabled);
    assert!(cred.token_expiry >= before + TimeDelta::seconds(3599));
    assert!(cred.token_expiry <= Utc::now() + TimeDelta::seconds(3599));
    assert!(cred.created_at.is_some());
    assert!(h.credentials.exists(7).await.unwrap());
}

#[tokio::test]
async fn re_consent_without_refresh_token_keeps_the_stored_one() {
    let h = Harness::new().await;
    let mut seeded = CalendarCredential::connected(
        7,
        "old-access".into(),
        Some("old-refresh".into()),
        Utc::now() - TimeDelta::hours(2),
        "team@group.calendar.google.com",
    );
    seeded.sync_enabled = false;
    h.credentials.save(seeded).await.unwrap();
    mount_code_exchange(&h.server, token_ok("second-access", None)).await;

    let cred = h.tokens.exchange_code("auth-code", 7).await.expect("exchange");

    assert_eq!(cred.access_token, "second-access");
    assert_eq!(cred.refresh_token.as_deref(), Some("old-refresh"));
    assert_eq!(cred.calendar_id, "team@group.calendar.google.com");
    assert!(!cred.sync_enabled);
    assert!(cred.token_expiry > Utc::now());
}

#[tokio::test]
async fn re_consent_with_refresh_token_overwrites_it() {
    let h = Harness::new().await;
    h.seed_credential(7, Utc::now() - TimeDelta::hours(2)).await;
    mount_code_exchange(&h.server, token_ok("second-access", Some("rotated-refresh"))).await;

    let cred = h.tokens.exchange_code("auth-code", 7).await.unwrap();
    assert_eq!(cred.refresh_token.as_deref(), Some("rotated-refresh"));
}

#[tokio::test]
async fn rejected_code_is_an_exchange_error_and_stores_nothing() {
    let h = Harness::new().await;
    mount_code_exchange(&h.server, invalid_grant()).await;

    let err = h.tokens.exchange_code("bad-code", 7).await.unwrap_err();

    assert!(matches!(err, BridgeError::Exchange(_)), "got {err:?}");
    assert!(!h.credentials.exists(7).await.unwrap());
}

#[tokio::test]
async fn ensure_valid_does_not_refresh_a_live_token() {
    let h = Harness::new().await;
    h.seed_credential(3, Utc::now() + TimeDelta::hours(1)).await;
    mount_refresh(&h.server, token_ok("unexpected", None), 0).await;

    let cred = h.tokens.ensure_valid(3).await.expect("valid credential");

    assert_eq!(cred.access_token, "stored-access");
    h.server.verify().await;
}

#[tokio::test]
async fn ensure_valid_refreshes_an_expired_token_exactly_once() {
    let h = Harness::new().await;
    h.seed_credential(3, Utc::now() - TimeDelta::seconds(1)).await;
    mount_refresh(&h.server, token_ok("fresh-access", None), 1).await;

    let cred = h.tokens.ensure_valid(3).await.expect("refreshed credential");

    assert_eq!(cred.access_token, "fresh-access");
    assert_eq!(cred.refresh_token.as_deref(), Some("stored-refresh"));
    assert!(cred.token_expiry > Utc::now());
    h.server.verify().await;
}

#[tokio::test]
async fn revoked_refresh_token_surfaces_refresh_failed() {
    let h = Harness::new().await;
    let seeded = h.seed_credential(3, Utc::now() - TimeDelta::minutes(5)).await;
    mount_refresh(&h.server, invalid_grant(), 1).await;

    let err = h.tokens.ensure_valid(3).await.unwrap_err();

    assert!(matches!(err, BridgeError::RefreshFailed(_)), "got {err:?}");
    let stored = h.credentials.get(3).await.unwrap().unwrap();
    assert_eq!(stored.access_token, seeded.access_token);
}

#[tokio::test]
async fn missing_refresh_token_cannot_refresh() {
    let h = Harness::new().await;
    let cred = CalendarCredential::connected(
        5,
        "access".into(),
        None,
        Utc::now() - TimeDelta::seconds(10),
        "primary",
    );
    h.credentials.save(cred).await.unwrap();
    mount_refresh(&h.server, token_ok("never", None), 0).await;

    let err = h.tokens.refresh(5).await.unwrap_err();
    assert!(matches!(err, BridgeError::RefreshFailed(_)));
}

#[tokio::test]
async fn skew_refreshes_tokens_that_are_about_to_expire() {
    let h = Harness::new().await;
    let cfg = GoogleConfig {
        expiry_skew_secs: 30,
        ..common::google_config(&h.server)
    };
    let tokens = TokenManager::new(cfg, h.credentials.clone()).unwrap();
    h.seed_credential(4, Utc::now() + TimeDelta::seconds(10)).await;
    mount_refresh(&h.server, token_ok("early-access", None), 1).await;

    let cred = tokens.ensure_valid(4).await.unwrap();
    assert_eq!(cred.access_token, "early-access");
}

#[tokio::test]
async fn unknown_user_is_not_connected() {
    let h = Harness::new().await;
    let err = h.tokens.ensure_valid(404).await.unwrap_err();
    assert!(matches!(err, BridgeError::NotConnected { user_id: 404 }));

    let err = h.tokens.toggle_sync(404, true).await.unwrap_err();
    assert!(matches!(err, BridgeError::NotConnected { .. }));
}

#[tokio::test]
async fn toggle_and_disconnect_mutate_the_stored_record() {
    let h = Harness::new().await;
    h.seed_credential(9, Utc::now() + TimeDelta::hours(1)).await;

    let cred = h.tokens.toggle_sync(9, false).await.unwrap();
    assert!(!cred.sync_enabled);
    assert!(!h.credentials.get(9).await.unwrap().unwrap().sync_enabled);

    h.tokens.disconnect(9).await.unwrap();
    assert!(h.credentials.get(9).await.unwrap().is_none());
    assert!(!h.tokens.is_connected(9).await.unwrap());
    // disconnecting twice is fine
    h.tokens.disconnect(9).await.unwrap();
}

#[tokio::test]
async fn authorization_url_requires_configured_client() {
    let h = Harness::new().await;
    let url = h.tokens.authorization_url(12).unwrap();
    assert!(url.query_pairs().any(|(k, v)| k == "state" && v == "12"));
    assert!(url.query_pairs().any(|(k, v)| k == "access_type" && v == "offline"));

    let unconfigured = TokenManager::new(GoogleConfig::default(), h.credentials.clone()).unwrap();
    assert!(matches!(
        unconfigured.authorization_url(12),
        Err(BridgeError::Validation(_))
    ));
}

#[tokio::test]
async fn out_of_range_expires_in_is_a_token_endpoint_error() {
    let h = Harness::new().await;
    mount_code_exchange(
        &h.server,
        ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "far-future",
            "token_type": "Bearer",
            "expires_in": 10_000_000_000_000u64,
        })),
    )
    .await;

    let err = h.tokens.exchange_code("code", 7).await.unwrap_err();

    assert!(matches!(err, BridgeError::TokenEndpoint(_)), "got {err:?}");
    assert!(!h.credentials.exists(7).await.unwrap());
}

#[tokio::test]
async fn oversized_skew_always_refreshes() {
    let h = Harness::new().await;
    let cfg = GoogleConfig {
        expiry_skew_secs: u64::MAX,
        ..common::google_config(&h.server)
    };
    let tokens = TokenManager::new(cfg, h.credentials.clone()).unwrap();
    h.seed_credential(4, Utc::now() + TimeDelta::hours(1)).await;
    mount_refresh(&h.server, token_ok("skewed-access", None), 1).await;

    let cred = tokens.ensure_valid(4).await.unwrap();
    assert_eq!(cred.access_token, "skewed-access");
}
