//! Authorization code flow with PKCE for MCP servers
//!
//! [`OAuthFlow`] sequences the other `auth` modules into a single call that
//! turns an MCP server URL into an access token.
//!
//! # Flow overview
//!
//! 1. Derive the authorization base URL (scheme + host[:port]).
//! 2. Discover the OAuth endpoints, falling back to conventional paths.
//! 3. Start the loopback callback listener.
//! 4. Register a public client for the listener's redirect URI.
//! 5. Generate a PKCE pair.
//! 6. Build the authorization URL.
//! 7. Print the URL and try to open it in a browser.
//! 8. Wait for the redirect (bounded by the callback timeout and the flow's
//!    cancellation token).
//! 9. Close the listener.
//! 10. Exchange the code and verifier for an access token.
//!
//! The listener is closed before any error from steps 4–8 leaves the flow,
//! and dropping the flow's future mid-wait aborts it.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use url::Url;

use crate::auth::browser::{BrowserLaunch, BrowserLauncher, ManualBrowser, SystemBrowser};
use crate::auth::callback::CallbackListener;
use crate::auth::discovery::{self, ServerMetadata};
use crate::auth::pkce::{self, PkcePair};
use crate::auth::registration;
use crate::auth::token::{self, TokenRequest};
use crate::config::OAuthConfig;
use crate::error::{McpOAuthError, Result};

/// What the browser leg of the flow produces.
struct Authorization {
    code: String,
    client_id: String,
    pkce: PkcePair,
}

/// Drives one authorization code + PKCE flow at a time.
///
/// # Examples
///
/// ```no_run
/// use mcp_oauth::auth::flow::OAuthFlow;
/// use mcp_oauth::config::OAuthConfig;
///
/// # async fn example() -> mcp_oauth::error::Result<()> {
/// let flow = OAuthFlow::new(OAuthConfig::default())?;
/// let token = flow.obtain_access_token("https://api.example.com/mcp").await?;
/// # let _ = token;
/// # Ok(())
/// # }
/// ```
pub struct OAuthFlow {
    http: reqwest::Client,
    config: OAuthConfig,
    browser: Arc<dyn BrowserLauncher>,
    cancel: CancellationToken,
}

impl OAuthFlow {
    /// Creates a flow from configuration.
    ///
    /// The browser launcher is [`SystemBrowser`] when `open_browser` is set,
    /// [`ManualBrowser`] otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: OAuthConfig) -> Result<Self> {
        let http = config.http_client()?;
        let browser: Arc<dyn BrowserLauncher> = if config.open_browser {
            Arc::new(SystemBrowser)
        } else {
            Arc::new(ManualBrowser)
        };

        Ok(Self {
            http,
            config,
            browser,
            cancel: CancellationToken::new(),
        })
    }

    /// Replaces the HTTP client.
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Replaces the browser launcher.
    pub fn with_browser(mut self, browser: Arc<dyn BrowserLauncher>) -> Self {
        self.browser = browser;
        self
    }

    /// Uses `cancel` to abort the wait for the redirect.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The token that aborts a running flow when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// The configuration this flow runs with.
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Resolves the OAuth endpoints for `server_url` without starting a
    /// login.
    ///
    /// # Errors
    ///
    /// See [`discovery::authorization_base_url`] and [`discovery::discover`].
    pub async fn discover(&self, server_url: &str) -> Result<ServerMetadata> {
        let base_url = discovery::authorization_base_url(server_url)?;
        discovery::discover(&self.http, &base_url, &self.config.protocol_version).await
    }

    /// Runs the full flow and returns the access token.
    ///
    /// # Errors
    ///
    /// Any fatal [`McpOAuthError`] kind, surfaced unchanged. Nothing is
    /// retried.
    pub async fn obtain_access_token(&self, server_url: &str) -> Result<String> {
        tracing::info!(server_url, "Starting OAuth authorization flow");
        let metadata = self.discover(server_url).await?;

        let mut listener = CallbackListener::bind().await?;
        let redirect_uri = listener.redirect_uri().to_string();

        let authorization = self
            .authorize(&metadata, &mut listener, &redirect_uri)
            .await;
        listener.close().await;
        let authorization = authorization?;

        let request = TokenRequest::authorization_code(
            &authorization.code,
            &redirect_uri,
            &authorization.client_id,
            &authorization.pkce.verifier,
        );
        let token = token::exchange(&self.http, &metadata.token_endpoint, &request).await?;

        tracing::info!(server_url, "OAuth authorization flow complete");
        Ok(token.access_token)
    }

    /// Steps 4–8: everything that happens while the listener is open.
    async fn authorize(
        &self,
        metadata: &ServerMetadata,
        listener: &mut CallbackListener,
        redirect_uri: &str,
    ) -> Result<Authorization> {
        let registration = registration::register(
            &self.http,
            &metadata.registration_endpoint,
            redirect_uri,
            &self.config.client_name,
        )
        .await?;

        let pkce = pkce::generate();
        let auth_url = build_authorization_url(
            &metadata.authorization_endpoint,
            &registration.client_id,
            redirect_uri,
            &pkce.challenge,
        )?;

        eprintln!("Open the following URL in your browser to authenticate:\n{auth_url}");
        match self.browser.open(&auth_url).await {
            BrowserLaunch::Launched => tracing::debug!("Opened authorization URL in browser"),
            BrowserLaunch::NotLaunched => {
                tracing::warn!("Browser not opened; open the authorization URL manually")
            }
        }

        let code = listener
            .await_code(self.config.callback_timeout(), &self.cancel)
            .await?;
        tracing::info!("Received authorization code");

        Ok(Authorization {
            code,
            client_id: registration.client_id,
            pkce,
        })
    }
}

/// Builds the authorization request URL.
///
/// Query parameters already present on the endpoint are kept; the flow's
/// parameters are appended and percent-encoded.
///
/// # Errors
///
/// Returns [`McpOAuthError::InvalidMetadata`] when the endpoint is not an
/// absolute URL.
///
/// # Examples
///
/// ```
/// use mcp_oauth::auth::flow::build_authorization_url;
///
/// let url = build_authorization_url(
///     "https://auth.example.com/authorize",
///     "client-1",
///     "http://127.0.0.1:4000/callback",
///     "challenge",
/// )
/// .unwrap();
/// assert!(url.starts_with("https://auth.example.com/authorize?response_type=code&"));
/// assert!(url.ends_with("code_challenge_method=S256"));
/// ```
pub fn build_authorization_url(
    authorization_endpoint: &str,
    client_id: &str,
    redirect_uri: &str,
    code_challenge: &str,
) -> Result<String> {
    let mut url = Url::parse(authorization_endpoint).map_err(|e| {
        McpOAuthError::InvalidMetadata(format!(
            "invalid authorization endpoint {authorization_endpoint}: {e}"
        ))
    })?;

    url.query_pairs_mut()
        .append_pair("response_type", "code")
        .append_pair("client_id", client_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("code_challenge", code_challenge)
        .append_pair("code_challenge_method", pkce::CHALLENGE_METHOD);

    Ok(url.to_string())
}

/// Obtains an access token for `server_url` with default configuration.
///
/// # Errors
///
/// See [`OAuthFlow::obtain_access_token`].
pub async fn obtain_access_token(server_url: &str) -> Result<String> {
    OAuthFlow::new(OAuthConfig::default())?
        .obtain_access_token(server_url)
        .await
}
