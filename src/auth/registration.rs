//! Dynamic Client Registration (RFC 7591)
//!
//! Registers an ephemeral public client for the duration of one flow. The
//! client declares `token_endpoint_auth_method: "none"` and therefore never
//! receives or sends a secret; PKCE protects the code exchange instead.

use serde::{Deserialize, Serialize};

use crate::error::{McpOAuthError, Result};

/// Client name sent when the configuration does not override it.
pub const DEFAULT_CLIENT_NAME: &str = "mcp-proxy";

/// Request body posted to the registration endpoint.
#[derive(Debug, Serialize)]
struct RegistrationRequest<'a> {
    redirect_uris: [&'a str; 1],
    client_name: &'a str,
    token_endpoint_auth_method: &'static str,
}

/// The registered client. Discarded when the flow completes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientRegistration {
    /// Identifier issued by the authorization server.
    pub client_id: String,
}

/// Registers a public client whose only redirect URI is `redirect_uri`.
///
/// # Arguments
///
/// * `http` - Client used for the registration request.
/// * `registration_endpoint` - Endpoint resolved by discovery.
/// * `redirect_uri` - Loopback callback URI of the running listener.
/// * `client_name` - Human-readable client name.
///
/// # Errors
///
/// Returns [`McpOAuthError::Registration`] when the request cannot be sent,
/// the endpoint answers with a non-success status, or the response body has
/// no `client_id`.
pub async fn register(
    http: &reqwest::Client,
    registration_endpoint: &str,
    redirect_uri: &str,
    client_name: &str,
) -> Result<ClientRegistration> {
    let body = RegistrationRequest {
        redirect_uris: [redirect_uri],
        client_name,
        token_endpoint_auth_method: "none",
    };

    tracing::debug!(endpoint = registration_endpoint, redirect_uri, "Registering OAuth client");

    let resp = http
        .post(registration_endpoint)
        .json(&body)
        .send()
        .await
        .map_err(|e| McpOAuthError::Registration(format!("POST {registration_endpoint}: {e}")))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        return Err(McpOAuthError::Registration(format!(
            "registration endpoint returned {status}: {text}"
        ))
        .into());
    }

    let registration: ClientRegistration = resp.json().await.map_err(|e| {
        McpOAuthError::Registration(format!("failed to parse registration response: {e}"))
    })?;

    tracing::info!(client_id = %registration.client_id, "Registered OAuth client");
    Ok(registration)
}
