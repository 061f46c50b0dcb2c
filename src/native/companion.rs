use reqwest::Client;
use serde::Deserialize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// How long a reachability probe result stays valid. Repeated calls
/// within this window reuse the cached answer instead of hammering the
/// helper process.
const CHECK_INTERVAL: Duration = Duration::from_secs(5);

const HEALTH_TIMEOUT: Duration = Duration::from_secs(2);
const OPEN_TIMEOUT: Duration = Duration::from_secs(5);
const SELECT_TIMEOUT: Duration = Duration::from_secs(10);
const VALIDATE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Deserialize)]
struct SelectFolderResponse {
    success: bool,
    #[serde(default)]
    path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ValidateFolderResponse {
    exists: bool,
}

/// Client for the desktop companion — a helper process on a fixed
/// loopback port that opens and picks folders on behalf of a browser
/// session. Constructed explicitly and passed by reference so tests can
/// point it at a fake helper.
///
/// Every call treats a non-200 response or a timeout as "helper
/// unavailable" and reports failure through the return value.
pub struct CompanionClient {
    base_url: String,
    http: Client,
    probe: Mutex<Option<(Instant, bool)>>,
}

impl CompanionClient {
    pub fn new(port: u16) -> Self {
        Self::with_base_url(format!("http://127.0.0.1:{}", port))
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
            probe: Mutex::new(None),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Probe the helper's health endpoint. Results are cached for a few
    /// seconds.
    pub async fn check_connection(&self) -> bool {
        if let Some((when, ok)) = *self.probe.lock().unwrap() {
            if when.elapsed() < CHECK_INTERVAL {
                return ok;
            }
        }

        let ok = match self
            .http
            .get(format!("{}/health", self.base_url))
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        };

        *self.probe.lock().unwrap() = Some((Instant::now(), ok));
        if ok {
            log::debug!("Desktop companion reachable at {}", self.base_url);
        } else {
            log::debug!("Desktop companion unreachable at {}", self.base_url);
        }
        ok
    }

    /// Ask the helper to open a folder in the system file manager.
    pub async fn open_folder(&self, path: &str) -> bool {
        if !self.check_connection().await {
            return false;
        }

        match self
            .http
            .post(format!("{}/open-folder", self.base_url))
            .timeout(OPEN_TIMEOUT)
            .json(&serde_json::json!({ "path": path }))
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => {
                log::info!("Companion opened folder: {}", path);
                true
            }
            Ok(resp) => {
                log::warn!("Companion open-folder returned {}", resp.status());
                false
            }
            Err(e) => {
                log::warn!("Companion open-folder failed: {}", e);
                false
            }
        }
    }

    /// Ask the helper to show a folder picker; returns the chosen path.
    pub async fn select_folder(&self) -> Option<String> {
        if !self.check_connection().await {
            return None;
        }

        let resp = self
            .http
            .post(format!("{}/select-folder", self.base_url))
            .timeout(SELECT_TIMEOUT)
            .send()
            .await
            .ok()?;
        if !resp.status().is_success() {
            return None;
        }

        let body: SelectFolderResponse = resp.json().await.ok()?;
        if body.success { body.path } else { None }
    }

    /// Ask the helper whether a folder path exists.
    pub async fn validate_folder(&self, path: &str) -> bool {
        if !self.check_connection().await {
            return false;
        }

        match self
            .http
            .post(format!("{}/validate-folder", self.base_url))
            .timeout(VALIDATE_TIMEOUT)
            .json(&serde_json::json!({ "path": path }))
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => resp
                .json::<ValidateFolderResponse>()
                .await
                .map(|r| r.exists)
                .unwrap_or(false),
            _ => false,
        }
    }

    #[cfg(test)]
    fn seed_probe(&self, ok: bool) {
        *self.probe.lock().unwrap() = Some((Instant::now(), ok));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_loopback_with_port() {
        let client = CompanionClient::new(7777);
        assert_eq!(client.base_url(), "http://127.0.0.1:7777");
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = CompanionClient::with_base_url("http://127.0.0.1:9999/");
        assert_eq!(client.base_url(), "http://127.0.0.1:9999");
    }

    #[tokio::test]
    async fn fresh_probe_result_is_reused() {
        // Port 1 would refuse immediately; a cached healthy probe must
        // short-circuit before any request is made.
        let client = CompanionClient::with_base_url("http://127.0.0.1:1");
        client.seed_probe(true);
        assert!(client.check_connection().await);
    }

    #[tokio::test]
    async fn unreachable_helper_reports_unavailable() {
        let client = CompanionClient::with_base_url("http://127.0.0.1:1");
        assert!(!client.check_connection().await);
        assert!(!client.open_folder("/tmp").await);
        assert!(client.select_folder().await.is_none());
        assert!(!client.validate_folder("/tmp").await);
    }
}
