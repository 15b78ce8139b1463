//! Authorization code exchange
//!
//! Trades the code captured by the callback listener, together with the
//! PKCE verifier, for an access token at the token endpoint.

use serde::{Deserialize, Serialize};

use crate::error::{McpOAuthError, Result};

/// Form parameters of an `authorization_code` grant.
#[derive(Serialize)]
pub struct TokenRequest<'a> {
    grant_type: &'static str,
    /// The authorization code from the redirect.
    pub code: &'a str,
    /// The redirect URI used in the authorization request.
    pub redirect_uri: &'a str,
    /// The client identifier from registration.
    pub client_id: &'a str,
    /// The PKCE verifier matching the challenge sent earlier.
    pub code_verifier: &'a str,
}

impl<'a> TokenRequest<'a> {
    /// Builds an `authorization_code` grant request.
    pub fn authorization_code(
        code: &'a str,
        redirect_uri: &'a str,
        client_id: &'a str,
        code_verifier: &'a str,
    ) -> Self {
        Self {
            grant_type: "authorization_code",
            code,
            redirect_uri,
            client_id,
            code_verifier,
        }
    }
}

impl std::fmt::Debug for TokenRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRequest")
            .field("grant_type", &self.grant_type)
            .field("redirect_uri", &self.redirect_uri)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

/// The outcome of a successful exchange. The token is opaque to this crate.
#[derive(Clone, Deserialize)]
pub struct TokenResult {
    /// The bearer token for the resource server.
    pub access_token: String,
}

impl std::fmt::Debug for TokenResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResult")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// Exchanges an authorization code for an access token.
///
/// # Errors
///
/// Returns [`McpOAuthError::TokenExchange`] when the request cannot be sent,
/// the endpoint answers with a non-success status, or the response has no
/// `access_token`.
pub async fn exchange(
    http: &reqwest::Client,
    token_endpoint: &str,
    request: &TokenRequest<'_>,
) -> Result<TokenResult> {
    tracing::debug!(endpoint = token_endpoint, ?request, "Exchanging authorization code");

    let resp = http
        .post(token_endpoint)
        .form(request)
        .send()
        .await
        .map_err(|e| McpOAuthError::TokenExchange(format!("POST {token_endpoint}: {e}")))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(McpOAuthError::TokenExchange(format!(
            "token endpoint returned {status}: {body}"
        ))
        .into());
    }

    let token: TokenResult = resp
        .json()
        .await
        .map_err(|e| McpOAuthError::TokenExchange(format!("failed to parse token response: {e}")))?;

    tracing::info!("Obtained access token");
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_all_grant_fields() {
        let request = TokenRequest::authorization_code(
            "abc",
            "http://127.0.0.1:5000/callback",
            "client-1",
            "verifier-xyz",
        );
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["grant_type"], "authorization_code");
        assert_eq!(value["code"], "abc");
        assert_eq!(value["redirect_uri"], "http://127.0.0.1:5000/callback");
        assert_eq!(value["client_id"], "client-1");
        assert_eq!(value["code_verifier"], "verifier-xyz");
    }

    #[test]
    fn test_request_debug_hides_code_and_verifier() {
        let request = TokenRequest::authorization_code("secret-code", "uri", "cid", "secret-ver");
        let debug = format!("{request:?}");
        assert!(!debug.contains("secret-code"));
        assert!(!debug.contains("secret-ver"));
    }

    #[test]
    fn test_token_result_ignores_extra_fields() {
        let token: TokenResult = serde_json::from_str(
            r#"{"access_token":"tok","token_type":"Bearer","expires_in":3600}"#,
        )
        .unwrap();
        assert_eq!(token.access_token, "tok");
    }

    #[test]
    fn test_token_result_requires_access_token() {
        assert!(serde_json::from_str::<TokenResult>(r#"{"token_type":"Bearer"}"#).is_err());
    }
}
