//! Error types for mcp-oauth
//!
//! This module defines all error types used throughout the authorization
//! flow, using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for mcp-oauth operations
///
/// Each fatal step of the authorization flow has its own variant so callers
/// can tell which step failed by downcasting the returned `anyhow::Error`:
///
/// ```
/// use mcp_oauth::error::McpOAuthError;
///
/// let err: anyhow::Error = McpOAuthError::MissingAuthorizationCode.into();
/// assert!(matches!(
///     err.downcast_ref::<McpOAuthError>(),
///     Some(McpOAuthError::MissingAuthorizationCode)
/// ));
/// ```
#[derive(Error, Debug)]
pub enum McpOAuthError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The server URL could not be turned into an authorization base URL
    #[error("Invalid server URL: {0}")]
    InvalidServerUrl(String),

    /// Network or transport failure while fetching authorization server
    /// metadata. Never triggers the fallback endpoints.
    #[error("Discovery request failed: {0}")]
    DiscoveryTransport(String),

    /// The discovery document was served but is unusable
    #[error("Invalid authorization server metadata: {0}")]
    InvalidMetadata(String),

    /// Dynamic client registration failed
    #[error("Client registration failed: {0}")]
    Registration(String),

    /// The loopback callback listener could not be started
    #[error("Callback listener error: {0}")]
    CallbackListener(String),

    /// The redirect reached the callback without a `code` parameter
    #[error("Authorization code not received")]
    MissingAuthorizationCode,

    /// The authorization server redirected back with an OAuth error
    #[error("Authorization denied: {error}: {description}")]
    AuthorizationDenied {
        /// The OAuth `error` code from the redirect
        error: String,
        /// The `error_description` from the redirect, if any
        description: String,
    },

    /// No redirect arrived before the callback timeout elapsed
    #[error("Authorization flow timed out after {seconds} seconds")]
    FlowTimeout {
        /// The configured timeout
        seconds: u64,
    },

    /// The flow was cancelled before a redirect arrived
    #[error("Authorization flow cancelled")]
    FlowCancelled,

    /// Exchanging the authorization code for a token failed
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for mcp-oauth operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
