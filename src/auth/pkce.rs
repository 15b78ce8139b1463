//! PKCE S256 verifier/challenge generation
//!
//! Implements the Proof Key for Code Exchange (PKCE) extension to OAuth 2.0
//! as defined in RFC 7636, restricted to the `S256` challenge method.
//!
//! 1. A high-entropy random `code_verifier` is generated.
//! 2. The `code_challenge` is the base64url-encoded (no padding) SHA-256
//!    digest of the verifier's ASCII bytes.
//! 3. The challenge goes to the authorization endpoint; the verifier goes to
//!    the token endpoint, proving both requests came from the same client.
//!
//! # References
//!
//! - RFC 7636 <https://www.rfc-editor.org/rfc/rfc7636>

use base64::Engine as _;
use sha2::{Digest, Sha256};

/// The only challenge method this crate produces.
pub const CHALLENGE_METHOD: &str = "S256";

/// A PKCE verifier and its derived S256 challenge.
///
/// Created once per authorization flow by [`generate`] and never reused.
///
/// # Examples
///
/// ```
/// use mcp_oauth::auth::pkce;
///
/// let pair = pkce::generate();
/// assert_eq!(pair.verifier.len(), 43);
/// assert_eq!(pair.challenge, pkce::challenge_for(&pair.verifier));
/// ```
#[derive(Clone)]
pub struct PkcePair {
    /// 32 random bytes encoded as base64url without padding (43 characters).
    ///
    /// Sent to the token endpoint as `code_verifier`.
    pub verifier: String,

    /// `base64url_nopad(sha256(verifier))`, sent to the authorization
    /// endpoint as `code_challenge`.
    pub challenge: String,
}

impl std::fmt::Debug for PkcePair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PkcePair")
            .field("verifier", &"<redacted>")
            .field("challenge", &self.challenge)
            .finish()
    }
}

/// Generates a fresh PKCE pair.
///
/// The verifier carries 256 bits of entropy from the thread-local CSPRNG.
pub fn generate() -> PkcePair {
    use rand::RngCore as _;

    let mut random_bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut random_bytes);

    let verifier = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(random_bytes);
    let challenge = challenge_for(&verifier);

    PkcePair {
        verifier,
        challenge,
    }
}

/// Computes the S256 challenge for `verifier`.
///
/// RFC 7636 section 4.2: `BASE64URL(SHA256(ASCII(code_verifier)))`.
pub fn challenge_for(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest.as_slice())
}
