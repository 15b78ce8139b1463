//! Authorization server endpoint discovery
//!
//! MCP servers are not required to publish RFC 8414 metadata, so discovery
//! works in two tiers:
//!
//! 1. `GET {base}/.well-known/oauth-authorization-server` with the
//!    `MCP-Protocol-Version` header. A `200` response is parsed; the
//!    authorization and token endpoints are mandatory there and the
//!    registration endpoint defaults to `{base}/register`.
//! 2. Any other status falls back to the conventional
//!    `{base}/authorize`, `{base}/token` and `{base}/register` paths.
//!
//! A transport failure is not a "missing document": it propagates as
//! [`McpOAuthError::DiscoveryTransport`] and never triggers the fallback.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{McpOAuthError, Result};

/// Header carrying the MCP protocol revision on discovery requests.
pub const PROTOCOL_VERSION_HEADER: &str = "MCP-Protocol-Version";

/// Well-known path of the RFC 8414 metadata document.
pub const WELL_KNOWN_PATH: &str = "/.well-known/oauth-authorization-server";

/// The three OAuth endpoints needed by the authorization flow.
///
/// Resolved once per flow by [`discover`] and never mutated afterwards.
///
/// # Examples
///
/// ```
/// use mcp_oauth::auth::discovery::ServerMetadata;
///
/// let meta = ServerMetadata::fallback("https://api.example.com");
/// assert_eq!(meta.token_endpoint, "https://api.example.com/token");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerMetadata {
    /// URL of the authorization endpoint (RFC 6749 section 3.1).
    pub authorization_endpoint: String,

    /// URL of the token endpoint (RFC 6749 section 3.2).
    pub token_endpoint: String,

    /// URL of the Dynamic Client Registration endpoint (RFC 7591).
    pub registration_endpoint: String,
}

impl ServerMetadata {
    /// The conventional endpoint triple used when discovery yields nothing.
    pub fn fallback(base_url: &str) -> Self {
        Self {
            authorization_endpoint: join(base_url, "/authorize"),
            token_endpoint: join(base_url, "/token"),
            registration_endpoint: join(base_url, "/register"),
        }
    }
}

/// Wire shape of the metadata document. Only the fields the flow needs are
/// modelled; everything else in the document is ignored.
#[derive(Debug, Deserialize)]
struct MetadataDocument {
    authorization_endpoint: String,
    token_endpoint: String,
    #[serde(default)]
    registration_endpoint: Option<String>,
}

/// Returns the authorization base URL (scheme + host[:port]) for an MCP
/// server URL.
///
/// Path, query and fragment are discarded. Default ports are omitted, as
/// are trailing slashes.
///
/// # Errors
///
/// Returns [`McpOAuthError::InvalidServerUrl`] when the URL does not parse
/// or has no host.
///
/// # Examples
///
/// ```
/// use mcp_oauth::auth::discovery::authorization_base_url;
///
/// let base = authorization_base_url("https://api.example.com/v1/mcp").unwrap();
/// assert_eq!(base, "https://api.example.com");
///
/// let base = authorization_base_url("http://127.0.0.1:8080/sse?x=1").unwrap();
/// assert_eq!(base, "http://127.0.0.1:8080");
/// ```
pub fn authorization_base_url(server_url: &str) -> Result<String> {
    let parsed = Url::parse(server_url)
        .map_err(|e| McpOAuthError::InvalidServerUrl(format!("{server_url}: {e}")))?;

    if parsed.host_str().is_none() {
        return Err(
            McpOAuthError::InvalidServerUrl(format!("{server_url}: URL has no host")).into(),
        );
    }

    Ok(parsed.origin().ascii_serialization())
}

/// Resolves the OAuth endpoints for the server rooted at `base_url`.
///
/// # Arguments
///
/// * `http` - Client used for the discovery request.
/// * `base_url` - Authorization base URL from [`authorization_base_url`].
/// * `protocol_version` - Value of the `MCP-Protocol-Version` header.
///
/// # Errors
///
/// - [`McpOAuthError::DiscoveryTransport`] when the request itself fails.
/// - [`McpOAuthError::InvalidMetadata`] when a `200` response lacks
///   `authorization_endpoint` / `token_endpoint` or is not JSON.
pub async fn discover(
    http: &reqwest::Client,
    base_url: &str,
    protocol_version: &str,
) -> Result<ServerMetadata> {
    let discovery_url = join(base_url, WELL_KNOWN_PATH);
    tracing::debug!(
        url = %discovery_url,
        protocol_version,
        "Fetching authorization server metadata"
    );

    let resp = http
        .get(&discovery_url)
        .header(PROTOCOL_VERSION_HEADER, protocol_version)
        .send()
        .await
        .map_err(|e| McpOAuthError::DiscoveryTransport(format!("GET {discovery_url}: {e}")))?;

    let status = resp.status();
    if status != reqwest::StatusCode::OK {
        tracing::warn!(
            %status,
            base_url,
            "Authorization server metadata unavailable, using default endpoints"
        );
        return Ok(ServerMetadata::fallback(base_url));
    }

    let document: MetadataDocument = resp
        .json()
        .await
        .map_err(|e| McpOAuthError::InvalidMetadata(format!("{discovery_url}: {e}")))?;

    let registration_endpoint = document
        .registration_endpoint
        .filter(|endpoint| !endpoint.is_empty())
        .unwrap_or_else(|| join(base_url, "/register"));

    let metadata = ServerMetadata {
        authorization_endpoint: document.authorization_endpoint,
        token_endpoint: document.token_endpoint,
        registration_endpoint,
    };
    tracing::info!(
        authorization_endpoint = %metadata.authorization_endpoint,
        token_endpoint = %metadata.token_endpoint,
        registration_endpoint = %metadata.registration_endpoint,
        "Discovered authorization server metadata"
    );

    Ok(metadata)
}

/// Joins an absolute path onto a base URL without doubling the slash.
fn join(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}
