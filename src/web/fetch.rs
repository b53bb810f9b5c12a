//! Document fetching with timeout and retry.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tokio::time::sleep;

use crate::error::{Error, Result};

/// Page fetch seam.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the raw body of a URL.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// HTTP fetcher with a hard per-request timeout and fixed-backoff retry.
pub struct HttpFetcher {
    http: Client,
    attempts: u32,
    backoff: Duration,
}

impl HttpFetcher {
    const USER_AGENT: &'static str = "vera-research-agent/1.0";
    const DEFAULT_TIMEOUT_SECS: u64 = 8;
    const DEFAULT_ATTEMPTS: u32 = 3;
    const DEFAULT_BACKOFF_SECS: u64 = 2;

    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(Self::USER_AGENT)
            .build()
            .map_err(|e| Error::fetch("", format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            attempts: Self::DEFAULT_ATTEMPTS,
            backoff: Duration::from_secs(Self::DEFAULT_BACKOFF_SECS),
        })
    }

    /// Override the retry count (tests use 1 to avoid waiting out backoff).
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// Override the fixed backoff between attempts.
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    async fn fetch_once(&self, url: &str) -> Result<String> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::fetch(url, e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::fetch(url, e.to_string()))?;

        response
            .text()
            .await
            .map_err(|e| Error::fetch(url, e.to_string()))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let mut last_err = Error::fetch(url, "no attempts made");

        for attempt in 1..=self.attempts {
            match self.fetch_once(url).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    tracing::debug!(url, attempt, error = %e, "fetch attempt failed");
                    last_err = e;
                    if attempt < self.attempts {
                        sleep(self.backoff).await;
                    }
                }
            }
        }

        Err(last_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempts_floor_is_one() {
        let fetcher = HttpFetcher::new().unwrap().with_attempts(0);
        assert_eq!(fetcher.attempts, 1);
    }

    #[tokio::test]
    async fn test_unreachable_host_errors_after_retries() {
        let fetcher = HttpFetcher::with_timeout(Duration::from_millis(200))
            .unwrap()
            .with_attempts(2)
            .with_backoff(Duration::from_millis(1));

        let err = fetcher.fetch("http://127.0.0.1:1/never").await.unwrap_err();
        assert!(matches!(err, Error::Fetch { .. }));
    }
}
