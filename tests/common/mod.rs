use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use url::Url;

use mcp_oauth::auth::browser::{BrowserLaunch, BrowserLauncher};
use mcp_oauth::auth::pkce;

/// HTTP client that never routes loopback test traffic through a proxy.
#[allow(dead_code)]
pub fn test_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("failed to build test HTTP client")
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// A stand-in for the user's browser: instead of showing a consent page it
/// follows the authorization URL's `redirect_uri` straight back to the
/// callback listener with `redirect_query` appended.
///
/// It records the authorization URL it was given so tests can inspect the
/// parameters the flow sent.
#[allow(dead_code)]
pub struct RedirectingBrowser {
    redirect_query: String,
    authorization_url: Arc<Mutex<Option<String>>>,
}

#[allow(dead_code)]
impl RedirectingBrowser {
    pub fn new(redirect_query: &str) -> Self {
        Self {
            redirect_query: redirect_query.to_string(),
            authorization_url: Arc::new(Mutex::new(None)),
        }
    }

    /// Shared slot holding the last authorization URL opened.
    pub fn authorization_url_slot(&self) -> Arc<Mutex<Option<String>>> {
        Arc::clone(&self.authorization_url)
    }
}

#[async_trait]
impl BrowserLauncher for RedirectingBrowser {
    async fn open(&self, url: &str) -> BrowserLaunch {
        *self.authorization_url.lock().unwrap() = Some(url.to_string());

        let redirect_uri = query_param(url, "redirect_uri").expect("redirect_uri in auth URL");
        let target = if self.redirect_query.is_empty() {
            redirect_uri
        } else {
            format!("{}?{}", redirect_uri, self.redirect_query)
        };

        let resp = test_http_client()
            .get(&target)
            .send()
            .await
            .expect("callback listener must accept the redirect");
        assert!(resp.status().is_success(), "callback returned {}", resp.status());

        BrowserLaunch::Launched
    }
}

/// A browser that records the authorization URL and never follows it, so
/// the flow is left waiting for a redirect.
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingBrowser {
    authorization_url: Arc<Mutex<Option<String>>>,
}

#[allow(dead_code)]
impl RecordingBrowser {
    /// Shared slot holding the last authorization URL opened.
    pub fn authorization_url_slot(&self) -> Arc<Mutex<Option<String>>> {
        Arc::clone(&self.authorization_url)
    }
}

#[async_trait]
impl BrowserLauncher for RecordingBrowser {
    async fn open(&self, url: &str) -> BrowserLaunch {
        *self.authorization_url.lock().unwrap() = Some(url.to_string());
        BrowserLaunch::NotLaunched
    }
}

/// Socket address of the callback listener named by the `redirect_uri` of
/// the recorded authorization URL.
#[allow(dead_code)]
pub fn redirect_addr(authorization_url: &Arc<Mutex<Option<String>>>) -> SocketAddr {
    let auth_url = authorization_url
        .lock()
        .unwrap()
        .clone()
        .expect("browser was opened");
    let redirect_uri = query_param(&auth_url, "redirect_uri").expect("redirect_uri in auth URL");
    Url::parse(&redirect_uri)
        .expect("redirect_uri must parse")
        .socket_addrs(|| None)
        .expect("redirect_uri must resolve")[0]
}

/// Polls until `addr` refuses connections, for up to one second.
#[allow(dead_code)]
pub async fn port_is_closed(addr: SocketAddr) -> bool {
    for _ in 0..50 {
        if tokio::net::TcpStream::connect(addr).await.is_err() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

/// Returns the first value of `name` in the query of `url`.
#[allow(dead_code)]
pub fn query_param(url: &str, name: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

/// wiremock matcher for a token request whose `code_verifier` hashes to the
/// `code_challenge` of the authorization URL recorded in `authorization_url`
/// and whose `code` equals `expected_code`.
#[allow(dead_code)]
pub struct VerifierMatchesChallenge {
    pub authorization_url: Arc<Mutex<Option<String>>>,
    pub expected_code: String,
}

impl wiremock::Match for VerifierMatchesChallenge {
    fn matches(&self, request: &wiremock::Request) -> bool {
        let Some(auth_url) = self.authorization_url.lock().unwrap().clone() else {
            return false;
        };
        let Some(challenge) = query_param(&auth_url, "code_challenge") else {
            return false;
        };

        let form: Vec<(String, String)> = url::form_urlencoded::parse(&request.body)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let field = |name: &str| {
            form.iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        };

        field("grant_type") == Some("authorization_code")
            && field("code") == Some(self.expected_code.as_str())
            && field("code_verifier").map(pkce::challenge_for) == Some(challenge)
    }
}
