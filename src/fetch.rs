use crate::common::constants::{
    FETCH_BACKOFF_SECS, FETCH_CONNECT_TIMEOUT_SECS, FETCH_READ_TIMEOUT_SECS, FETCH_RETRIES,
    USER_AGENT,
};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, warn};

/// Seam for anything that can turn a URL into an HTML body. The crawler and
/// orchestrator only see this trait, which keeps them testable offline.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    /// Returns the page body, or `None` when the URL is unavailable right
    /// now. Fetch problems never propagate as errors: a dead page is a
    /// skipped unit of work, not a failed run.
    async fn fetch(&self, url: &str) -> Option<String>;
}

/// HTTP fetcher with a browser-like identity, bounded timeouts and a small
/// retry budget for transient server overload (429/503).
pub struct Fetcher {
    client: reqwest::Client,
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(FETCH_CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(FETCH_READ_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

#[async_trait::async_trait]
impl PageFetcher for Fetcher {
    async fn fetch(&self, url: &str) -> Option<String> {
        for attempt in 0..=FETCH_RETRIES {
            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        match response.text().await {
                            Ok(body) if !body.trim().is_empty() => return Some(body),
                            Ok(_) => {
                                debug!(url, "fetch returned an empty body");
                                return None;
                            }
                            Err(e) => {
                                debug!(url, error = %e, "failed to read response body");
                                return None;
                            }
                        }
                    }
                    if status == StatusCode::TOO_MANY_REQUESTS
                        || status == StatusCode::SERVICE_UNAVAILABLE
                    {
                        if attempt < FETCH_RETRIES {
                            let wait = FETCH_BACKOFF_SECS * (attempt as u64 + 1);
                            debug!(url, status = status.as_u16(), wait_secs = wait, "retrying fetch");
                            tokio::time::sleep(Duration::from_secs(wait)).await;
                            continue;
                        }
                        warn!(url, status = status.as_u16(), "fetch gave up after retries");
                        return None;
                    }
                    debug!(url, status = status.as_u16(), "fetch skipped on status");
                    return None;
                }
                Err(e) => {
                    if attempt < FETCH_RETRIES {
                        let wait = FETCH_BACKOFF_SECS * (attempt as u64 + 1);
                        debug!(url, error = %e, wait_secs = wait, "retrying fetch after network error");
                        tokio::time::sleep(Duration::from_secs(wait)).await;
                        continue;
                    }
                    warn!(url, error = %e, "fetch failed after retries");
                    return None;
                }
            }
        }
        None
    }
}
