//! Loopback callback listener integration tests
//!
//! Verifies the behaviour of `src/auth/callback.rs` against real sockets:
//!
//! - A redirect carrying `code` wakes a pending `await_code`.
//! - A redirect without `code` fails instead of hanging.
//! - Only the first redirect is delivered.
//! - Timeouts and cancellation end the wait with distinct errors.
//! - The port stops accepting connections after `close()` and after drop.

mod common;

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use mcp_oauth::auth::callback::{CallbackListener, COMPLETION_PAGE};
use mcp_oauth::error::McpOAuthError;

use common::{port_is_closed, test_http_client};

const WAIT: Duration = Duration::from_secs(10);

/// Sends a GET to `url` from a background task and returns its body.
fn redirect(url: String) -> tokio::task::JoinHandle<(reqwest::StatusCode, String)> {
    tokio::spawn(async move {
        let resp = test_http_client()
            .get(&url)
            .send()
            .await
            .expect("callback request must succeed");
        let status = resp.status();
        (status, resp.text().await.unwrap_or_default())
    })
}

#[tokio::test]
async fn test_round_trip_delivers_code() {
    let mut listener = CallbackListener::bind().await.unwrap();
    let addr = listener.local_addr();
    assert!(addr.ip().is_loopback());
    assert_ne!(addr.port(), 0);

    let browser = redirect(format!("{}?code=XYZ&state=ignored", listener.redirect_uri()));

    let code = listener
        .await_code(WAIT, &CancellationToken::new())
        .await
        .expect("code must be delivered");
    assert_eq!(code, "XYZ");

    let (status, body) = browser.await.unwrap();
    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(body, COMPLETION_PAGE);

    listener.close().await;
    assert!(port_is_closed(addr).await, "port must be released after close");
}

#[tokio::test]
async fn test_missing_code_fails_without_hanging() {
    let mut listener = CallbackListener::bind().await.unwrap();

    let browser = redirect(listener.redirect_uri().to_string());

    let err = listener
        .await_code(WAIT, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(
        matches!(
            err.downcast_ref::<McpOAuthError>(),
            Some(McpOAuthError::MissingAuthorizationCode)
        ),
        "unexpected error: {err}"
    );

    // The page is the same whether or not a code was present.
    let (status, body) = browser.await.unwrap();
    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(body, COMPLETION_PAGE);

    listener.close().await;
}

#[tokio::test]
async fn test_oauth_error_redirect_is_denied() {
    let mut listener = CallbackListener::bind().await.unwrap();

    let _browser = redirect(format!(
        "{}?error=access_denied&error_description=User%20declined",
        listener.redirect_uri()
    ));

    let err = listener
        .await_code(WAIT, &CancellationToken::new())
        .await
        .unwrap_err();
    match err.downcast_ref::<McpOAuthError>() {
        Some(McpOAuthError::AuthorizationDenied { error, description }) => {
            assert_eq!(error, "access_denied");
            assert_eq!(description, "User declined");
        }
        other => panic!("expected AuthorizationDenied, got {other:?}"),
    }

    listener.close().await;
}

#[tokio::test]
async fn test_first_redirect_wins() {
    let mut listener = CallbackListener::bind().await.unwrap();
    let uri = listener.redirect_uri().to_string();

    let (status, _) = redirect(format!("{uri}?code=first")).await.unwrap();
    assert_eq!(status, reqwest::StatusCode::OK);
    let (status, body) = redirect(format!("{uri}?code=second")).await.unwrap();
    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(body, COMPLETION_PAGE);

    let code = listener
        .await_code(WAIT, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(code, "first");

    listener.close().await;
}

#[tokio::test]
async fn test_other_paths_are_not_found() {
    let listener = CallbackListener::bind().await.unwrap();
    let url = format!("http://{}/elsewhere?code=nope", listener.local_addr());

    let (status, _) = redirect(url).await.unwrap();
    assert_eq!(status, reqwest::StatusCode::NOT_FOUND);

    listener.close().await;
}

#[tokio::test]
async fn test_await_code_times_out() {
    let mut listener = CallbackListener::bind().await.unwrap();

    let err = listener
        .await_code(Duration::from_millis(50), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<McpOAuthError>(),
        Some(McpOAuthError::FlowTimeout { .. })
    ));

    listener.close().await;
}

#[tokio::test]
async fn test_await_code_observes_cancellation() {
    let mut listener = CallbackListener::bind().await.unwrap();
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = listener.await_code(WAIT, &cancel).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<McpOAuthError>(),
        Some(McpOAuthError::FlowCancelled)
    ));

    listener.close().await;
}

#[tokio::test]
async fn test_drop_releases_port() {
    let listener = CallbackListener::bind().await.unwrap();
    let addr = listener.local_addr();

    drop(listener);

    assert!(port_is_closed(addr).await, "port must be released after drop");
}
