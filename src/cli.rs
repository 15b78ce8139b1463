//! Command-line interface definition for mcp-oauth
//!
//! This module defines the CLI structure using clap's derive API.

use clap::{Parser, Subcommand};

/// mcp-oauth - OAuth login for MCP servers
///
/// Obtains an access token for an MCP server through the authorization code
/// flow with PKCE and dynamic client registration.
#[derive(Parser, Debug, Clone)]
#[command(name = "mcp-oauth")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for mcp-oauth
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the browser login and print the access token
    Token {
        /// URL of the MCP server
        server_url: String,

        /// Seconds to wait for the browser redirect (overrides config)
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Do not try to open a browser; only print the authorization URL
        #[arg(long)]
        no_browser: bool,
    },

    /// Resolve and print the server's OAuth endpoints as JSON
    Discover {
        /// URL of the MCP server
        server_url: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
