//! Loopback redirect listener
//!
//! A [`CallbackListener`] is a one-shot rendezvous between the browser's
//! redirect and the authorization flow:
//!
//! - [`CallbackListener::bind`] binds `127.0.0.1:0`, reads the port the OS
//!   assigned back from the socket and starts serving before it returns, so
//!   the redirect URI is live as soon as the caller can see it.
//! - The `/callback` handler answers every request with a fixed plain-text
//!   page. The first request's query parameters are sent over a oneshot
//!   channel; later requests find the sender gone and are ignored.
//! - [`CallbackListener::await_code`] waits on that channel, bounded by a
//!   timeout and a cancellation token.
//! - [`CallbackListener::close`] shuts the server down and waits for the
//!   socket to be released. Dropping the listener aborts the serving task,
//!   so the port is released on error and cancellation paths too.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{RawQuery, State};
use axum::routing::get;
use axum::Router;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{McpOAuthError, Result};

/// Path the authorization server redirects to.
pub const CALLBACK_PATH: &str = "/callback";

/// Body returned to the browser for every callback request.
pub const COMPLETION_PAGE: &str = "Authentication complete. You may close this window.";

/// How long [`CallbackListener::close`] waits for graceful shutdown before
/// aborting the serving task.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// Query parameters captured from the first redirect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackOutcome {
    /// The authorization code, if the server issued one.
    pub code: Option<String>,
    /// OAuth error code (RFC 6749 section 4.1.2.1), if the request was denied.
    pub error: Option<String>,
    /// Human-readable error detail accompanying `error`.
    pub error_description: Option<String>,
}

impl CallbackOutcome {
    /// Parses a raw query string. The first occurrence of each parameter wins.
    fn from_query(query: &str) -> Self {
        let mut outcome = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let slot = match &*key {
                "code" => &mut outcome.code,
                "error" => &mut outcome.error,
                "error_description" => &mut outcome.error_description,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        outcome
    }

    /// Converts the captured parameters into the authorization code.
    ///
    /// # Errors
    ///
    /// - [`McpOAuthError::AuthorizationDenied`] when the redirect carries an
    ///   `error` and no code.
    /// - [`McpOAuthError::MissingAuthorizationCode`] when the code is absent
    ///   or empty.
    pub fn into_code(self) -> Result<String> {
        match (self.code, self.error) {
            (Some(code), _) if !code.is_empty() => Ok(code),
            (_, Some(error)) => Err(McpOAuthError::AuthorizationDenied {
                error,
                description: self.error_description.unwrap_or_default(),
            }
            .into()),
            _ => Err(McpOAuthError::MissingAuthorizationCode.into()),
        }
    }
}

/// Handler state: the sending half of the hand-off, taken exactly once.
struct ListenerState {
    outcome_tx: Mutex<Option<oneshot::Sender<CallbackOutcome>>>,
}

/// A running loopback listener for one authorization redirect.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// use mcp_oauth::auth::callback::CallbackListener;
///
/// # async fn example() -> mcp_oauth::error::Result<()> {
/// let mut listener = CallbackListener::bind().await?;
/// println!("redirect to {}", listener.redirect_uri());
///
/// let code = listener
///     .await_code(Duration::from_secs(300), &CancellationToken::new())
///     .await;
/// listener.close().await;
/// let _code = code?;
/// # Ok(())
/// # }
/// ```
pub struct CallbackListener {
    local_addr: SocketAddr,
    redirect_uri: String,
    outcome_rx: Option<oneshot::Receiver<CallbackOutcome>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    server: Option<JoinHandle<()>>,
}

impl CallbackListener {
    /// Binds an ephemeral loopback port and starts serving `/callback`.
    ///
    /// # Errors
    ///
    /// Returns [`McpOAuthError::CallbackListener`] if the socket cannot be
    /// bound or its address cannot be read back.
    pub async fn bind() -> Result<Self> {
        let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .map_err(|e| {
                McpOAuthError::CallbackListener(format!("failed to bind redirect listener: {e}"))
            })?;
        let local_addr = listener.local_addr().map_err(|e| {
            McpOAuthError::CallbackListener(format!("failed to read listener address: {e}"))
        })?;

        let (outcome_tx, outcome_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let state = Arc::new(ListenerState {
            outcome_tx: Mutex::new(Some(outcome_tx)),
        });
        let app = Router::new()
            .route(CALLBACK_PATH, get(handle_callback))
            .with_state(state);

        let port = local_addr.port();
        let server = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                    tracing::debug!(port, "Callback listener shutdown requested");
                })
                .await;
            if let Err(e) = result {
                tracing::error!(error = %e, "Callback listener error");
            }
        });

        let redirect_uri = format!("http://127.0.0.1:{port}{CALLBACK_PATH}");
        tracing::info!(%redirect_uri, "Callback listener started");

        Ok(Self {
            local_addr,
            redirect_uri,
            outcome_rx: Some(outcome_rx),
            shutdown_tx: Some(shutdown_tx),
            server: Some(server),
        })
    }

    /// The redirect URI to register and to send in the authorization request.
    pub fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// The socket address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Waits for the first redirect and returns its authorization code.
    ///
    /// # Errors
    ///
    /// - [`McpOAuthError::MissingAuthorizationCode`] or
    ///   [`McpOAuthError::AuthorizationDenied`] when the redirect has no code.
    /// - [`McpOAuthError::FlowTimeout`] when `timeout` elapses first.
    /// - [`McpOAuthError::FlowCancelled`] when `cancel` fires first.
    /// - [`McpOAuthError::CallbackListener`] if called twice or the server
    ///   task ended without delivering a redirect.
    pub async fn await_code(
        &mut self,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let outcome_rx = self.outcome_rx.take().ok_or_else(|| {
            McpOAuthError::CallbackListener("redirect already consumed".to_string())
        })?;

        let outcome = tokio::select! {
            received = outcome_rx => received.map_err(|_| {
                McpOAuthError::CallbackListener(
                    "listener stopped before a redirect arrived".to_string(),
                )
            })?,
            _ = tokio::time::sleep(timeout) => {
                tracing::warn!(
                    timeout_secs = timeout.as_secs(),
                    "Timed out waiting for authorization redirect"
                );
                return Err(McpOAuthError::FlowTimeout { seconds: timeout.as_secs() }.into());
            }
            _ = cancel.cancelled() => {
                tracing::info!("Authorization flow cancelled while waiting for redirect");
                return Err(McpOAuthError::FlowCancelled.into());
            }
        };

        outcome.into_code()
    }

    /// Stops the server and waits until the port is released.
    pub async fn close(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(mut server) = self.server.take() {
            if tokio::time::timeout(SHUTDOWN_GRACE, &mut server).await.is_err() {
                tracing::debug!("Callback listener did not drain in time, aborting");
                server.abort();
                let _ = server.await;
            }
        }
        tracing::debug!(addr = %self.local_addr, "Callback listener closed");
    }
}

impl Drop for CallbackListener {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(server) = self.server.take() {
            server.abort();
        }
    }
}

async fn handle_callback(
    State(state): State<Arc<ListenerState>>,
    RawQuery(query): RawQuery,
) -> &'static str {
    let outcome = CallbackOutcome::from_query(query.as_deref().unwrap_or(""));
    tracing::debug!(
        has_code = outcome.code.is_some(),
        error = outcome.error.as_deref(),
        "Received authorization redirect"
    );

    match state.outcome_tx.lock().await.take() {
        Some(tx) => {
            let _ = tx.send(outcome);
        }
        None => tracing::debug!("Ignoring repeated authorization redirect"),
    }

    COMPLETION_PAGE
}
