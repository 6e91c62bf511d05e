// ABOUTME: Integration tests for the interactive authorization flow
// ABOUTME: Covers callback vs manual races, timeout cleanup, exchange and identity failures

mod common;

use common::{RedirectingBrowser, TestContext, TOKEN_PATH};
use gcal_auth::{AuthError, NoBrowser, TokenStore};
use std::{net::TcpListener, sync::Arc, time::Duration};
use tokio::io::{AsyncWriteExt, BufReader};
use wiremock::{
    matchers::{method, path},
    Mock, ResponseTemplate,
};

/// Operator input that never arrives; the writer must be kept alive
fn silent_operator() -> (tokio::io::DuplexStream, BufReader<tokio::io::DuplexStream>) {
    let (writer, reader) = tokio::io::duplex(64);
    (writer, BufReader::new(reader))
}

fn port_is_free(port: u16) -> bool {
    TcpListener::bind(("127.0.0.1", port)).is_ok()
}

#[tokio::test]
async fn test_callback_code_is_exchanged_and_persisted() {
    let ctx = TestContext::new().await;
    ctx.mock_exchange("abc123", "access-1").await;
    ctx.mock_identity("access-1", "me@work.example").await;

    let coordinator = ctx.coordinator(
        Duration::from_secs(10),
        RedirectingBrowser::with_code("abc123", Duration::from_millis(100)),
    );
    let (_operator, input) = silent_operator();

    let email = coordinator
        .authorize_with_input("work", input)
        .await
        .unwrap();
    assert_eq!(email, "me@work.example");

    let credential = TokenStore::new(ctx.dir.clone()).load("work").unwrap();
    assert_eq!(credential.token.access_token, "access-1");
    assert_eq!(credential.token.refresh_token, "refresh-1");
    assert!(credential.token.expiry.is_some());
    assert!(port_is_free(ctx.port));
}

#[tokio::test]
async fn test_manual_code_is_exchanged() {
    let ctx = TestContext::new().await;
    ctx.mock_exchange("pasted-code", "access-m").await;
    ctx.mock_identity("access-m", "me@home.example").await;

    let coordinator = ctx.coordinator(Duration::from_secs(10), Arc::new(NoBrowser));

    let email = coordinator
        .authorize_with_input("personal", &b"\npasted-code\n"[..])
        .await
        .unwrap();
    assert_eq!(email, "me@home.example");
    assert!(port_is_free(ctx.port));
}

#[tokio::test]
async fn test_first_delivered_code_wins_manual_first() {
    let ctx = TestContext::new().await;
    // Only the manual code may reach the token endpoint
    ctx.mock_exchange("manual-code", "access-m").await;
    ctx.mock_identity("access-m", "me@example.com").await;

    let coordinator = ctx.coordinator(
        Duration::from_secs(10),
        RedirectingBrowser::with_code("callback-code", Duration::from_millis(500)),
    );

    let email = coordinator
        .authorize_with_input("work", &b"manual-code\n"[..])
        .await
        .unwrap();
    assert_eq!(email, "me@example.com");
}

#[tokio::test]
async fn test_first_delivered_code_wins_callback_first() {
    let ctx = TestContext::new().await;
    ctx.mock_exchange("callback-code", "access-c").await;
    ctx.mock_identity("access-c", "me@example.com").await;

    let coordinator = ctx.coordinator(
        Duration::from_secs(10),
        RedirectingBrowser::with_code("callback-code", Duration::from_millis(50)),
    );
    let (mut operator, input) = silent_operator();

    let typing = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1500)).await;
        let _ = operator.write_all(b"late-manual-code\n").await;
        operator
    });

    let email = coordinator
        .authorize_with_input("work", input)
        .await
        .unwrap();
    assert_eq!(email, "me@example.com");

    // The late manual code is discarded without error
    let _ = typing.await.unwrap();
}

#[tokio::test]
async fn test_timeout_releases_port() {
    let ctx = TestContext::new().await;
    let coordinator = ctx.coordinator(Duration::from_millis(300), Arc::new(NoBrowser));
    let (_operator, input) = silent_operator();

    let err = coordinator
        .authorize_with_input("work", input)
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Timeout(_)));
    assert!(port_is_free(ctx.port));
    assert!(!ctx.dir.token_path("work").exists());
}

#[tokio::test]
async fn test_callback_without_code_fails_and_releases_port() {
    let ctx = TestContext::new().await;
    let coordinator = ctx.coordinator(
        Duration::from_secs(10),
        RedirectingBrowser::without_code(Duration::from_millis(50)),
    );
    let (_operator, input) = silent_operator();

    let err = coordinator
        .authorize_with_input("work", input)
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Listener(_)));
    assert!(port_is_free(ctx.port));
    assert!(!ctx.dir.token_path("work").exists());
}

#[tokio::test]
async fn test_exchange_failure_persists_nothing() {
    let ctx = TestContext::new().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "Bad Request"
        })))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let coordinator = ctx.coordinator(Duration::from_secs(10), Arc::new(NoBrowser));

    let err = coordinator
        .authorize_with_input("work", &b"bad-code\n"[..])
        .await
        .unwrap_err();

    match err {
        AuthError::Exchange(msg) => assert!(msg.contains("invalid_grant")),
        other => panic!("expected exchange error, got {other:?}"),
    }
    assert!(!ctx.dir.token_path("work").exists());
    assert!(port_is_free(ctx.port));
}

#[tokio::test]
async fn test_identity_failure_keeps_token() {
    let ctx = TestContext::new().await;
    ctx.mock_exchange("abc123", "access-1").await;
    Mock::given(method("GET"))
        .and(path(common::PRIMARY_CALENDAR_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&ctx.server)
        .await;

    let coordinator = ctx.coordinator(Duration::from_secs(10), Arc::new(NoBrowser));

    let err = coordinator
        .authorize_with_input("work", &b"abc123\n"[..])
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::IdentityLookup(_)));
    let credential = TokenStore::new(ctx.dir.clone()).load("work").unwrap();
    assert_eq!(credential.token.access_token, "access-1");
}

#[tokio::test]
async fn test_reauthorize_overwrites_token() {
    let ctx = TestContext::new().await;
    let coordinator = ctx.coordinator(Duration::from_secs(10), Arc::new(NoBrowser));

    ctx.mock_exchange("code-1", "access-1").await;
    ctx.mock_identity("access-1", "me@work.example").await;
    coordinator
        .authorize_with_input("work", &b"code-1\n"[..])
        .await
        .unwrap();

    ctx.server.reset().await;
    ctx.mock_exchange("code-2", "access-2").await;
    ctx.mock_identity("access-2", "me@work.example").await;
    coordinator
        .authorize_with_input("work", &b"code-2\n"[..])
        .await
        .unwrap();

    let credential = TokenStore::new(ctx.dir.clone()).load("work").unwrap();
    assert_eq!(credential.token.access_token, "access-2");
}

#[tokio::test]
async fn test_missing_credentials_is_config_error_without_side_effects() {
    let ctx = TestContext::empty().await;
    let coordinator = ctx.coordinator(Duration::from_secs(10), Arc::new(NoBrowser));

    let err = coordinator
        .authorize_with_input("x", &b"code\n"[..])
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Config(_)));
    assert!(!ctx.dir.root().exists());
    assert!(port_is_free(ctx.port));
}

#[tokio::test]
async fn test_port_in_use_is_listener_error() {
    let ctx = TestContext::new().await;
    let _occupied = TcpListener::bind(("127.0.0.1", ctx.port)).unwrap();
    let coordinator = ctx.coordinator(Duration::from_secs(10), Arc::new(NoBrowser));

    let err = coordinator
        .authorize_with_input("work", &b"code\n"[..])
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::Listener(_)));
}

#[tokio::test]
async fn test_invalid_account_name_rejected_before_anything() {
    let ctx = TestContext::new().await;
    let coordinator = ctx.coordinator(Duration::from_secs(10), Arc::new(NoBrowser));

    let err = coordinator
        .authorize_with_input("../escape", &b"code\n"[..])
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::InvalidAccountName(_)));
}

#[test]
fn test_stdin_flow_does_not_hold_runtime_open_after_callback() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap();

    runtime.block_on(async {
        let ctx = TestContext::new().await;
        ctx.mock_exchange("abc123", "access-1").await;
        ctx.mock_identity("access-1", "me@work.example").await;

        let coordinator = ctx.coordinator(
            Duration::from_secs(10),
            RedirectingBrowser::with_code("abc123", Duration::from_millis(100)),
        );

        let email = coordinator.authorize("work").await.unwrap();
        assert_eq!(email, "me@work.example");
    });

    // Nothing was typed; a reader still blocked on stdin must not delay shutdown
    let started = std::time::Instant::now();
    drop(runtime);
    assert!(started.elapsed() < Duration::from_secs(1));
}
