//! Integration tests for the request gateway
//!
//! Runs a full `SessionClient` (cookie-carrying session transport, credential
//! store, refresh coordinator, terminator) against wiremock servers standing
//! in for the Bookdesk API.

use std::sync::Arc;
use std::time::Duration;

use bookdesk_common::{CredentialVault, EphemeralVault, FileVault, RefreshDenied};
use bookdesk_domain::{ApiConfig, Config, EndReason, SessionConfig, SessionEvent, SessionState};
use bookdesk_infra::{ApiError, SessionClient};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> Config {
    Config {
        api: ApiConfig { base_url: server.uri(), max_attempts: 1, ..Default::default() },
        ..Default::default()
    }
}

async fn mount_login(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "refreshToken=proof-1; Path=/; HttpOnly")
                .set_body_json(json!({ "accessToken": token })),
        )
        .mount(server)
        .await;
}

fn session_without_persistence(config: &Config) -> SessionClient {
    SessionClient::with_vault(config, Arc::new(EphemeralVault)).expect("session client")
}

fn file_vault(dir: &tempfile::TempDir) -> Arc<FileVault> {
    Arc::new(FileVault::new(dir.path().join("session.json")))
}

/// Validates the concurrent-expiry scenario end to end.
///
/// # Test Steps
/// 1. Log in; credential A is stored
/// 2. Three calls run at once; the API rejects A as expired
/// 3. The refresh endpoint (slow, proof cookie required) issues B
/// 4. Verify exactly one refresh call and all three calls succeed with B
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_expiry_triggers_single_refresh() {
    let server = MockServer::start().await;
    mount_login(&server, "A").await;
    Mock::given(method("GET"))
        .and(path("/books"))
        .and(header("authorization", "Bearer A"))
        .respond_with(ResponseTemplate::new(401))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/books"))
        .and(header("authorization", "Bearer B"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1 }])))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .and(header("cookie", "refreshToken=proof-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(200))
                .set_body_json(json!({ "accessToken": "B" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let session = Arc::new(session_without_persistence(&config_for(&server)));
    session.login("admin", "secret").await.unwrap();
    let mut events = session.subscribe();

    let calls: Vec<_> = (0..3)
        .map(|_| {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.api().get::<Vec<Value>>("/books").await })
        })
        .collect();

    for call in futures::future::join_all(calls).await {
        let books = call.expect("task panicked").expect("call succeeds after refresh");
        assert_eq!(books.len(), 1);
    }

    assert_eq!(session.state(), SessionState::Authenticated);
    assert!(matches!(events.recv().await.unwrap(), SessionEvent::Refreshed { .. }));
    assert!(events.try_recv().is_err(), "exactly one refresh episode");
}

/// Validates that a replay rejected as expired is not retried again.
///
/// # Test Steps
/// 1. The API rejects every credential for `/reviews` as expired
/// 2. One refresh succeeds; the replay is rejected again
/// 3. Verify `RetryExhausted`, one refresh, and that `/books` still works
///    with the refreshed credential
#[tokio::test]
async fn test_second_expiry_is_terminal_for_that_call_only() {
    let server = MockServer::start().await;
    mount_login(&server, "A").await;
    Mock::given(method("GET"))
        .and(path("/reviews"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/books"))
        .and(header("authorization", "Bearer B"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "B" })))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_without_persistence(&config_for(&server));
    session.login("admin", "secret").await.unwrap();

    let err = session.api().get::<Value>("/reviews").await.unwrap_err();
    assert!(matches!(err, ApiError::RetryExhausted { status: 401 }));
    assert!(!err.requires_login());

    let books: Vec<Value> = session.api().get("/books").await.unwrap();
    assert!(books.is_empty());
    assert_eq!(session.state(), SessionState::Authenticated);
}

/// Validates termination when the refresh transport fails.
///
/// # Test Steps
/// 1. Start with an empty store and a file vault
/// 2. The API answers 401; the refresh endpoint hangs past the request
///    timeout, producing a network error
/// 3. Verify `RefreshDenied::Network`, an empty store and vault, and
///    exactly one `Ended` event
#[tokio::test]
async fn test_refresh_network_error_ends_session_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/wishlist"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.api.request_timeout_ms = 200;
    let dir = tempfile::tempdir().unwrap();
    let vault = file_vault(&dir);
    let session = SessionClient::with_vault(&config, vault.clone()).unwrap();
    assert!(!session.initialize().unwrap());
    let mut events = session.subscribe();

    let err = session.api().get::<Value>("/wishlist").await.unwrap_err();

    assert!(matches!(err, ApiError::RefreshDenied(RefreshDenied::Network(_))), "got {err:?}");
    assert!(err.requires_login());
    assert_eq!(session.state(), SessionState::Unauthenticated);
    assert_eq!(vault.load("access_token").unwrap(), None);
    match events.recv().await.unwrap() {
        SessionEvent::Ended { reason, .. } => assert_eq!(reason, EndReason::RefreshDenied),
        other => panic!("unexpected event: {other:?}"),
    }
    assert!(events.try_recv().is_err(), "session ended more than once");
}

/// Validates that a denied refresh clears durable storage.
///
/// # Test Steps
/// 1. Persist credential A in a file vault and restore it
/// 2. The API rejects A; the refresh endpoint rejects the proof
/// 3. Verify the vault file no longer holds a credential
#[tokio::test]
async fn test_refresh_rejection_clears_durable_storage() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "proof expired" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let vault = file_vault(&dir);
    vault.save("access_token", "A").unwrap();

    let session = SessionClient::with_vault(&config_for(&server), vault.clone()).unwrap();
    assert!(session.initialize().unwrap());

    let err = session.api().get::<Value>("/accounts").await.unwrap_err();

    match err {
        ApiError::RefreshDenied(RefreshDenied::Rejected { status, detail }) => {
            assert_eq!(status, 401);
            assert_eq!(detail, "proof expired");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(vault.load("access_token").unwrap(), None);
    assert!(!dir.path().join("session.json").exists());
}

/// Validates that the refresh episode is bounded by the refresh timeout.
#[tokio::test]
async fn test_slow_refresh_times_out() {
    let server = MockServer::start().await;
    mount_login(&server, "A").await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(2))
                .set_body_json(json!({ "accessToken": "B" })),
        )
        .mount(&server)
        .await;

    let config = Config {
        session: SessionConfig { refresh_timeout_ms: 100, ..Default::default() },
        ..config_for(&server)
    };
    let session = session_without_persistence(&config);
    session.login("admin", "secret").await.unwrap();

    let err = session.api().get::<Value>("/categories").await.unwrap_err();

    assert!(matches!(err, ApiError::RefreshDenied(RefreshDenied::Timeout(_))), "got {err:?}");
    assert_eq!(session.state(), SessionState::Unauthenticated);
}

/// Validates that requests after a refresh attach the new credential
/// without refreshing again.
#[tokio::test]
async fn test_later_requests_use_refreshed_credential() {
    let server = MockServer::start().await;
    mount_login(&server, "A").await;
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer A"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer B"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(4)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "B" })))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_without_persistence(&config_for(&server));
    session.login("admin", "secret").await.unwrap();

    for _ in 0..4 {
        let _: Value = session.api().get("/books/1").await.unwrap();
    }
}

/// Validates that an expired response after logout does not sign the user
/// back in, even when the server failed to process the logout.
///
/// # Test Steps
/// 1. Log in; the server sets the proof cookie
/// 2. Log out while the logout endpoint answers 500
/// 3. An unauthenticated call gets 401; the refresh endpoint would issue B
/// 4. Verify the call fails with `SessionEnded`, no refresh was sent, the
///    session stays unauthenticated and no `Started` event follows `Ended`
#[tokio::test]
async fn test_expired_response_after_logout_does_not_revive_session() {
    let server = MockServer::start().await;
    mount_login(&server, "A").await;
    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/accounts"))
        .and(header("authorization", "Bearer B"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "secret": 1 })))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/accounts"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accessToken": "B" })))
        .expect(0)
        .mount(&server)
        .await;

    let session = session_without_persistence(&config_for(&server));
    session.login("admin", "secret").await.unwrap();
    let mut events = session.subscribe();

    session.logout().await;
    assert_eq!(session.state(), SessionState::Unauthenticated);

    let err = session.api().get::<Value>("/accounts").await.unwrap_err();

    assert!(matches!(err, ApiError::RefreshDenied(RefreshDenied::SessionEnded)), "got {err:?}");
    assert!(err.requires_login());
    assert_eq!(session.state(), SessionState::Unauthenticated);
    match events.recv().await.unwrap() {
        SessionEvent::Ended { reason, .. } => assert_eq!(reason, EndReason::LoggedOut),
        other => panic!("unexpected event: {other:?}"),
    }
    assert!(events.try_recv().is_err(), "session restarted after logout");
}

/// Validates that a late expiry after a denied refresh does not refresh
/// again.
///
/// # Test Steps
/// 1. Log in; the API rejects A and the first refresh is denied
/// 2. A second call reports expiry while the refresh endpoint would now
///    succeed
/// 3. Verify it fails with `SessionEnded` and only one refresh was sent
#[tokio::test]
async fn test_late_expiry_after_denied_refresh_is_refused() {
    let server = MockServer::start().await;
    mount_login(&server, "A").await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "revoked" })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accessToken": "B" })))
        .expect(0)
        .mount(&server)
        .await;

    let session = session_without_persistence(&config_for(&server));
    session.login("admin", "secret").await.unwrap();

    let first = session.api().get::<Value>("/books").await.unwrap_err();
    let late = session.api().get::<Value>("/books").await.unwrap_err();

    assert!(matches!(first, ApiError::RefreshDenied(RefreshDenied::Rejected { .. })), "got {first:?}");
    assert!(matches!(late, ApiError::RefreshDenied(RefreshDenied::SessionEnded)), "got {late:?}");
    assert_eq!(session.state(), SessionState::Unauthenticated);
}
