//! mcp-oauth - OAuth login for MCP servers
//!
//! This library obtains an access token for a remote MCP server that is
//! identified only by its URL, when no pre-registered client exists. It
//! discovers the server's OAuth endpoints, registers an ephemeral public
//! client, sends the user through browser consent with a loopback redirect
//! and exchanges the returned code (with PKCE) for a token.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `auth`: Discovery, registration, callback listener, PKCE, token exchange
//!   and the orchestrating flow
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use mcp_oauth::{Config, OAuthFlow};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     config.validate()?;
//!
//!     let flow = OAuthFlow::new(config.oauth)?;
//!     let token = flow.obtain_access_token("https://api.example.com/mcp").await?;
//!     println!("{token}");
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;

// Re-export commonly used types
pub use auth::{obtain_access_token, OAuthFlow};
pub use config::Config;
pub use error::{McpOAuthError, Result};
