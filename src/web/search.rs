//! Web search adapters.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::config::SearchConfig;
use crate::error::{Error, Result};

/// One search hit: a URL and its display title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub url: String,
    pub title: String,
}

/// Search adapter seam.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Return up to `limit` results for a query.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>>;
}

/// Google Custom Search adapter with a Wikipedia OpenSearch fallback.
///
/// When API credentials are missing or the Google call fails, the
/// adapter degrades to the Wikipedia JSON API so dev runs keep
/// producing documents instead of going dark.
pub struct GoogleSearch {
    config: SearchConfig,
    http: Client,
}

impl GoogleSearch {
    const WIKIPEDIA_ENDPOINT: &'static str = "https://en.wikipedia.org/w/api.php";

    pub fn new(config: SearchConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Search(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { config, http })
    }

    async fn google_search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let response = self
            .http
            .get(&self.config.endpoint)
            .query(&[
                ("key", self.config.api_key.as_str()),
                ("cx", self.config.cx.as_str()),
                ("q", query),
                ("num", &limit.to_string()),
            ])
            .send()
            .await
            .map_err(|e| Error::Search(format!("search request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| Error::Search(format!("search returned error status: {}", e)))?;

        let data: Value = response
            .json()
            .await
            .map_err(|e| Error::Search(format!("search response was not JSON: {}", e)))?;

        let results = data["items"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        let url = item["link"].as_str()?.to_string();
                        let title = item["title"].as_str().unwrap_or_default().to_string();
                        Some(SearchResult { url, title })
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        tracing::debug!(count = results.len(), "google search returned results");
        Ok(results)
    }

    async fn wikipedia_search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let response = self
            .http
            .get(Self::WIKIPEDIA_ENDPOINT)
            .query(&[
                ("action", "opensearch"),
                ("search", query),
                ("limit", &limit.to_string()),
                ("namespace", "0"),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(|e| Error::Search(format!("wikipedia request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| Error::Search(format!("wikipedia returned error status: {}", e)))?;

        let data: Value = response
            .json()
            .await
            .map_err(|e| Error::Search(format!("wikipedia response was not JSON: {}", e)))?;

        // OpenSearch payload is [query, [titles], [descriptions], [urls]].
        let titles = data.get(1).and_then(Value::as_array).cloned().unwrap_or_default();
        let urls = data.get(3).and_then(Value::as_array).cloned().unwrap_or_default();

        let results = titles
            .iter()
            .zip(urls.iter())
            .filter_map(|(title, url)| {
                Some(SearchResult {
                    url: url.as_str()?.to_string(),
                    title: title.as_str().unwrap_or_default().to_string(),
                })
            })
            .collect::<Vec<_>>();

        tracing::debug!(count = results.len(), "wikipedia fallback returned results");
        Ok(results)
    }
}

#[async_trait]
impl SearchClient for GoogleSearch {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        if self.config.api_key.is_empty() || self.config.cx.is_empty() {
            tracing::warn!("search credentials missing, using wikipedia fallback");
            return self.wikipedia_search(query, limit).await;
        }

        match self.google_search(query, limit).await {
            Ok(results) => Ok(results),
            Err(e) => {
                tracing::warn!(error = %e, "google search failed, using wikipedia fallback");
                self.wikipedia_search(query, limit).await
            }
        }
    }
}
