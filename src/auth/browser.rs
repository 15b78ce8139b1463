//! Best-effort browser navigation
//!
//! Opening a browser is a convenience, never a requirement: the flow always
//! prints the authorization URL, and a launcher only reports whether it
//! managed to hand the URL to a browser.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::task::JoinHandle;

/// Outcome of a launch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserLaunch {
    /// A browser process was started for the URL.
    Launched,
    /// No browser was started; the user must open the URL manually.
    NotLaunched,
}

/// Something that can send the user to the authorization URL.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    /// Attempts to open `url`. Must not fail the flow.
    async fn open(&self, url: &str) -> BrowserLaunch;
}

/// Opens URLs with the platform's default browser command.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBrowser;

#[async_trait]
impl BrowserLauncher for SystemBrowser {
    async fn open(&self, url: &str) -> BrowserLaunch {
        let Some(command) = platform_command() else {
            return BrowserLaunch::NotLaunched;
        };

        match spawn_reaped(command, url) {
            Ok(_) => BrowserLaunch::Launched,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to launch browser");
                BrowserLaunch::NotLaunched
            }
        }
    }
}

/// Starts `command url` and waits for it on a background task, so the
/// launcher process is reaped once it exits.
///
/// The child's stdout is discarded; stdout belongs to the CLI's result.
fn spawn_reaped(mut command: Command, url: &str) -> std::io::Result<JoinHandle<()>> {
    let mut child = command
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .spawn()?;

    Ok(tokio::spawn(async move {
        match child.wait().await {
            Ok(status) => tracing::debug!(%status, "Browser launcher exited"),
            Err(e) => tracing::debug!(error = %e, "Failed to wait for browser launcher"),
        }
    }))
}

/// A launcher that never opens anything, for headless use (`--no-browser`).
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualBrowser;

#[async_trait]
impl BrowserLauncher for ManualBrowser {
    async fn open(&self, _url: &str) -> BrowserLaunch {
        BrowserLaunch::NotLaunched
    }
}

#[cfg(target_os = "macos")]
fn platform_command() -> Option<Command> {
    Some(Command::new("open"))
}

#[cfg(target_os = "linux")]
fn platform_command() -> Option<Command> {
    Some(Command::new("xdg-open"))
}

#[cfg(target_os = "windows")]
fn platform_command() -> Option<Command> {
    let mut command = Command::new("rundll32");
    command.arg("url.dll,FileProtocolHandler");
    Some(command)
}

#[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
fn platform_command() -> Option<Command> {
    None
}
