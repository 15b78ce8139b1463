//! OAuth 2.0 authorization code + PKCE login for MCP servers
//!
//! Used when an MCP HTTP server demands a bearer token and no client
//! credentials have been provisioned ahead of time.
//!
//! # Module Layout
//!
//! - [`pkce`]         -- PKCE `S256` verifier/challenge generation
//! - [`discovery`]    -- RFC 8414 endpoint discovery with conventional fallback
//! - [`registration`] -- RFC 7591 dynamic registration of a public client
//! - [`callback`]     -- One-shot loopback redirect listener
//! - [`browser`]      -- Best-effort browser launch capability
//! - [`token`]        -- Authorization code exchange
//! - [`flow`]         -- Orchestrates the above into `obtain_access_token`

pub mod browser;
pub mod callback;
pub mod discovery;
pub mod flow;
pub mod pkce;
pub mod registration;
pub mod token;

pub use flow::{obtain_access_token, OAuthFlow};
