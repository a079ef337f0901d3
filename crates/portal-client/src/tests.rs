//! Client behavior against a mocked BFF.

use std::sync::Arc;
use std::time::Duration;

use portal_core::Role;
use serde_json::json;

use crate::session_cache::{classify, Freshness};
use crate::{ClientError, Credentials, Lookup, PortalClient, SessionCache};

const SESSION_BODY: &str =
    r#"{"ok":true,"data":{"email":"kid@school.edu","role":"STUDENT","adminCapable":false}}"#;

fn client(url: &str, credentials: Credentials) -> PortalClient {
    PortalClient::new(url, credentials).expect("valid base url")
}

// ─── PortalClient ─────────────────────────────────────────────────────────

#[tokio::test]
async fn bearer_token_is_sent() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/session")
        .match_header("authorization", "Bearer tok-1")
        .with_header("content-type", "application/json")
        .with_body(SESSION_BODY)
        .create_async()
        .await;

    let session = client(&server.url(), Credentials::Bearer("tok-1".into()))
        .session()
        .await
        .unwrap();
    assert_eq!(session.email, "kid@school.edu");
    assert_eq!(session.role, Role::Student);
    mock.assert_async().await;
}

#[tokio::test]
async fn dev_credentials_send_impersonation_headers() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/admin/broadcast")
        .match_header("x-portal-email", "boss@school.edu")
        .match_header("x-portal-role", "ADMIN")
        .match_body(mockito::Matcher::Json(json!({ "message": "hi" })))
        .with_body(r#"{"ok":true,"data":{"sent":3}}"#)
        .create_async()
        .await;

    let c = client(
        &server.url(),
        Credentials::Dev {
            email: "boss@school.edu".into(),
            role: Some(Role::Admin),
        },
    );
    let body = c
        .post("/api/admin/broadcast", &json!({ "message": "hi" }))
        .await
        .unwrap();
    assert_eq!(body, json!({ "ok": true, "data": { "sent": 3 } }));
    mock.assert_async().await;
}

#[tokio::test]
async fn non_2xx_raises_with_error_field() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/raffles/r1/entries")
        .with_status(500)
        .with_body(r#"{"error":"This raffle is closed","code":"ACTION_FAILED"}"#)
        .create_async()
        .await;

    let err = client(&server.url(), Credentials::Anonymous)
        .post("/api/raffles/r1/entries", &json!({}))
        .await
        .unwrap_err();
    match err {
        ClientError::Api {
            status,
            code,
            message,
        } => {
            assert_eq!(status, 500);
            assert_eq!(code, "ACTION_FAILED");
            assert_eq!(message, "This raffle is closed");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn non_json_error_body_gets_generic_message() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/dashboard")
        .with_status(502)
        .with_body("<html>bad gateway</html>")
        .create_async()
        .await;

    let err = client(&server.url(), Credentials::Anonymous)
        .get("/api/dashboard")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Request failed (502) (502 UNKNOWN)");
}

#[tokio::test]
async fn data_unwraps_success_body() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/mastery")
        .with_body(r#"{"ok":true,"data":{"x":1}}"#)
        .create_async()
        .await;

    let data = client(&server.url(), Credentials::Anonymous)
        .data(reqwest::Method::GET, "api/mastery", None)
        .await
        .unwrap();
    assert_eq!(data, json!({ "x": 1 }));
}

#[test]
fn base_url_must_be_http() {
    assert!(matches!(
        PortalClient::new("localhost:8080", Credentials::Anonymous),
        Err(ClientError::InvalidBaseUrl(_))
    ));
    let c = PortalClient::new("http://localhost:8080/", Credentials::Anonymous).unwrap();
    assert_eq!(c.base_url(), "http://localhost:8080");
}

// ─── SessionCache ─────────────────────────────────────────────────────────

#[test]
fn freshness_windows() {
    let fresh = Duration::from_secs(30);
    let stale = Duration::from_secs(300);
    assert_eq!(classify(Duration::from_secs(5), fresh, stale), Freshness::Fresh);
    assert_eq!(classify(Duration::from_secs(30), fresh, stale), Freshness::Stale);
    assert_eq!(classify(Duration::from_secs(299), fresh, stale), Freshness::Stale);
    assert_eq!(classify(Duration::from_secs(300), fresh, stale), Freshness::Expired);
}

#[tokio::test]
async fn fresh_entry_skips_the_network() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/session")
        .with_body(SESSION_BODY)
        .expect(1)
        .create_async()
        .await;

    let cache = SessionCache::new(Arc::new(client(&server.url(), Credentials::Anonymous)));
    assert_eq!(cache.lookup().await, Lookup::Miss);
    let first = cache.get().await.unwrap();
    let second = cache.get().await.unwrap();
    assert_eq!(first, second);
    assert!(matches!(cache.lookup().await, Lookup::Fresh(_)));
    mock.assert_async().await;
}

#[tokio::test]
async fn expired_entry_forces_recheck() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/session")
        .with_body(SESSION_BODY)
        .expect(2)
        .create_async()
        .await;

    let cache = SessionCache::with_windows(
        Arc::new(client(&server.url(), Credentials::Anonymous)),
        Duration::ZERO,
        Duration::ZERO,
    );
    cache.get().await.unwrap();
    cache.get().await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn stale_entry_is_served_and_revalidated() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/session")
        .with_body(SESSION_BODY)
        .expect(2)
        .create_async()
        .await;

    let cache = SessionCache::with_windows(
        Arc::new(client(&server.url(), Credentials::Anonymous)),
        Duration::ZERO,
        Duration::from_secs(60),
    );
    cache.get().await.unwrap();
    assert!(matches!(cache.lookup().await, Lookup::Stale(_)));
    let served = cache.get().await.unwrap();
    assert_eq!(served.email, "kid@school.edu");

    for _ in 0..100 {
        if mock.matched_async().await {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn unauthenticated_refresh_clears_entry() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/session")
        .with_status(401)
        .with_body(r#"{"error":"Unauthorized","code":"UNAUTHENTICATED"}"#)
        .create_async()
        .await;

    let cache = SessionCache::new(Arc::new(client(&server.url(), Credentials::Anonymous)));
    let err = cache.get().await.unwrap_err();
    assert!(err.is_unauthenticated());
    assert_eq!(cache.lookup().await, Lookup::Miss);
}

#[tokio::test]
async fn server_error_on_refresh_keeps_the_session() {
    let mut server = mockito::Server::new_async().await;
    let ok = server
        .mock("GET", "/api/session")
        .with_body(SESSION_BODY)
        .create_async()
        .await;

    let cache = SessionCache::new(Arc::new(client(&server.url(), Credentials::Anonymous)));
    cache.get().await.unwrap();
    ok.remove_async().await;

    server
        .mock("GET", "/api/session")
        .with_status(500)
        .with_body(r#"{"error":"identity provider unavailable: HTTP 503","code":"IDENTITY_FAILED"}"#)
        .create_async()
        .await;

    let err = cache.refresh().await.unwrap_err();
    assert!(!err.is_unauthenticated());
    assert!(matches!(cache.lookup().await, Lookup::Fresh(_)));
}
