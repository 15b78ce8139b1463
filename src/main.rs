//! mcp-oauth - OAuth login for MCP servers
//!
#![doc = "Main entry point for the mcp-oauth CLI."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mcp_oauth::cli::{Cli, Commands};
use mcp_oauth::config::Config;
use mcp_oauth::{McpOAuthError, OAuthFlow};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose, cli.json_logs);

    // Load configuration
    let config = Config::load(&cli.config, &cli)?;

    // Validate configuration
    config.validate()?;

    let flow = OAuthFlow::new(config.oauth)?;

    match cli.command {
        Commands::Token { server_url, .. } => {
            tracing::info!("Starting login for {}", server_url);

            // Ctrl-C cancels the wait for the browser redirect; the flow
            // tears the callback listener down before returning.
            let cancel = flow.cancellation_token();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            });

            let token = flow.obtain_access_token(&server_url).await?;
            println!("{token}");
            Ok(())
        }
        Commands::Discover { server_url } => {
            tracing::info!("Discovering OAuth endpoints for {}", server_url);
            let metadata = flow.discover(&server_url).await?;
            let json =
                serde_json::to_string_pretty(&metadata).map_err(McpOAuthError::Serialization)?;
            println!("{json}");
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// Logs go to stderr so stdout carries only the command's result.
fn init_tracing(verbose: bool, json_logs: bool) {
    let default_filter = if verbose {
        "mcp_oauth=debug"
    } else {
        "mcp_oauth=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json_logs {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
