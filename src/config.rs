//! Configuration management for mcp-oauth
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::auth::registration::DEFAULT_CLIENT_NAME;
use crate::error::{McpOAuthError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for mcp-oauth
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Authorization flow settings
    #[serde(default)]
    pub oauth: OAuthConfig,
}

/// Authorization flow configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    /// Value of the `MCP-Protocol-Version` header sent during discovery
    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,

    /// Client name sent during dynamic client registration
    #[serde(default = "default_client_name")]
    pub client_name: String,

    /// How long to wait for the browser redirect (seconds)
    #[serde(default = "default_callback_timeout")]
    pub callback_timeout_seconds: u64,

    /// Timeout for each outbound HTTP request (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// Whether to try opening the authorization URL in a browser
    #[serde(default = "default_open_browser")]
    pub open_browser: bool,
}

fn default_protocol_version() -> String {
    "2025-03-26".to_string()
}

fn default_client_name() -> String {
    DEFAULT_CLIENT_NAME.to_string()
}

fn default_callback_timeout() -> u64 {
    300
}

fn default_request_timeout() -> u64 {
    30
}

fn default_open_browser() -> bool {
    true
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            protocol_version: default_protocol_version(),
            client_name: default_client_name(),
            callback_timeout_seconds: default_callback_timeout(),
            request_timeout_seconds: default_request_timeout(),
            open_browser: default_open_browser(),
        }
    }
}

impl OAuthConfig {
    /// The redirect wait bound as a [`Duration`]
    pub fn callback_timeout(&self) -> Duration {
        Duration::from_secs(self.callback_timeout_seconds)
    }

    /// The per-request HTTP timeout as a [`Duration`]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Builds the HTTP client used for discovery, registration and token
    /// exchange.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        let client = reqwest::Client::builder()
            .timeout(self.request_timeout())
            .user_agent(concat!("mcp-oauth/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(McpOAuthError::Http)?;
        Ok(client)
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns [`McpOAuthError::Io`] if the file cannot be read and
    /// [`McpOAuthError::Yaml`] if it cannot be parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(McpOAuthError::Io)?;
        let config: Self = serde_yaml::from_str(&contents).map_err(McpOAuthError::Yaml)?;
        Ok(config)
    }

    fn apply_env_vars(&mut self) {
        if let Ok(version) = std::env::var("MCP_OAUTH_PROTOCOL_VERSION") {
            self.oauth.protocol_version = version;
        }

        if let Ok(name) = std::env::var("MCP_OAUTH_CLIENT_NAME") {
            self.oauth.client_name = name;
        }

        if let Ok(timeout) = std::env::var("MCP_OAUTH_CALLBACK_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.oauth.callback_timeout_seconds = value;
            } else {
                tracing::warn!("Invalid MCP_OAUTH_CALLBACK_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(timeout) = std::env::var("MCP_OAUTH_REQUEST_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.oauth.request_timeout_seconds = value;
            } else {
                tracing::warn!("Invalid MCP_OAUTH_REQUEST_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(open_browser) = std::env::var("MCP_OAUTH_OPEN_BROWSER") {
            match open_browser.parse::<bool>() {
                Ok(v) => {
                    self.oauth.open_browser = v;
                    tracing::debug!(open_browser = v, "Env override: MCP_OAUTH_OPEN_BROWSER");
                }
                Err(_) => {
                    tracing::warn!("Invalid value for MCP_OAUTH_OPEN_BROWSER: {}", open_browser);
                }
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let crate::cli::Commands::Token {
            timeout,
            no_browser,
            ..
        } = &cli.command
        {
            if let Some(seconds) = timeout {
                self.oauth.callback_timeout_seconds = *seconds;
            }
            if *no_browser {
                self.oauth.open_browser = false;
            }
        }
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid
    pub fn validate(&self) -> Result<()> {
        if self.oauth.protocol_version.trim().is_empty() {
            return Err(
                McpOAuthError::Config("Protocol version cannot be empty".to_string()).into(),
            );
        }

        if self.oauth.client_name.trim().is_empty() {
            return Err(McpOAuthError::Config("Client name cannot be empty".to_string()).into());
        }

        if self.oauth.callback_timeout_seconds == 0 {
            return Err(McpOAuthError::Config(
                "callback_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.oauth.request_timeout_seconds == 0 {
            return Err(McpOAuthError::Config(
                "request_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}
