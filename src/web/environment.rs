//! Bounded per-run web environment.
//!
//! A run observes the web through the search and fetch seams and
//! accumulates documents. Adapter failures of any kind are recorded in
//! the run's error list and never reach the caller: the run returns
//! whatever documents it managed to gather, possibly none.

use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

use crate::web::extract::extract_text;
use crate::web::fetch::PageFetcher;
use crate::web::search::SearchClient;

/// Hard cap on pages fetched per run.
pub const MAX_PAGES: usize = 5;

/// Documents with less extracted text than this are dropped.
pub const MIN_TEXT_LENGTH: usize = 200;

/// Hosts skipped during retrieval. Matched as substrings of the URL
/// host, so subdomains are covered.
const BLOCKED_DOMAINS: &[&str] = &[
    "facebook.com",
    "twitter.com",
    "x.com",
    "instagram.com",
    "pinterest.com",
    "tiktok.com",
    "youtube.com",
    "linkedin.com",
    "quora.com",
    "reddit.com",
];

/// One retrieved document.
#[derive(Debug, Clone)]
pub struct WebDocument {
    pub url: String,
    pub title: Option<String>,
    pub text: String,
    pub metadata: HashMap<String, String>,
}

/// State accumulated over a single run.
#[derive(Debug, Clone, Default)]
pub struct WebRunState {
    pub query: String,
    pub visited_urls: Vec<String>,
    pub documents: Vec<WebDocument>,
    pub errors: Vec<String>,
}

/// Search → fetch → extract pipeline with per-run state.
pub struct WebEnvironment {
    search_client: Arc<dyn SearchClient>,
    fetcher: Arc<dyn PageFetcher>,
}

impl WebEnvironment {
    pub fn new(search_client: Arc<dyn SearchClient>, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            search_client,
            fetcher,
        }
    }

    fn is_blocked_domain(url: &str) -> bool {
        let host = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_lowercase()));
        match host {
            Some(host) => BLOCKED_DOMAINS.iter().any(|blocked| host.contains(blocked)),
            // Unparseable URLs are treated as blocked rather than fetched blind.
            None => true,
        }
    }

    /// Run one search-and-gather pass.
    ///
    /// `num_docs` is clamped into `[1, MAX_PAGES]`.
    pub async fn run(&self, query: &str, num_docs: usize) -> WebRunState {
        let mut state = WebRunState {
            query: query.to_string(),
            ..WebRunState::default()
        };

        let limit = num_docs.clamp(1, MAX_PAGES);

        let results = match self.search_client.search(query, limit).await {
            Ok(results) => results,
            Err(e) => {
                state.errors.push(e.to_string());
                return state;
            }
        };

        for result in results {
            let url = result.url;

            if Self::is_blocked_domain(&url) {
                continue;
            }
            if state.visited_urls.contains(&url) {
                continue;
            }

            match self.fetcher.fetch(&url).await {
                Ok(html) => {
                    let (text, metadata) = extract_text(&html);

                    if text.len() < MIN_TEXT_LENGTH {
                        continue;
                    }

                    let title = metadata.get("title").cloned();
                    state.visited_urls.push(url.clone());
                    state.documents.push(WebDocument {
                        url,
                        title,
                        text,
                        metadata,
                    });
                }
                Err(e) => {
                    state.errors.push(format!("{}: {}", url, e));
                }
            }
        }

        tracing::debug!(
            query,
            documents = state.documents.len(),
            errors = state.errors.len(),
            "web environment run complete"
        );

        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::web::search::SearchResult;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct CannedSearch {
        results: Result<Vec<SearchResult>>,
    }

    #[async_trait]
    impl SearchClient for CannedSearch {
        async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<SearchResult>> {
            match &self.results {
                Ok(r) => Ok(r.clone()),
                Err(_) => Err(Error::Search("search backend down".to_string())),
            }
        }
    }

    struct CannedFetcher {
        pages: Vec<(String, Result<String>)>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PageFetcher for CannedFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.calls.lock().unwrap().push(url.to_string());
            for (candidate, body) in &self.pages {
                if candidate == url {
                    return match body {
                        Ok(html) => Ok(html.clone()),
                        Err(_) => Err(Error::fetch(url, "refused")),
                    };
                }
            }
            Err(Error::fetch(url, "unknown url"))
        }
    }

    fn long_page(text: &str) -> String {
        format!(
            "<html><head><title>T</title></head><body><p>{} {}</p></body></html>",
            text,
            "filler ".repeat(60)
        )
    }

    fn hit(url: &str) -> SearchResult {
        SearchResult {
            url: url.to_string(),
            title: "t".to_string(),
        }
    }

    #[tokio::test]
    async fn test_search_failure_yields_empty_run_with_one_error() {
        let env = WebEnvironment::new(
            Arc::new(CannedSearch {
                results: Err(Error::Search("down".to_string())),
            }),
            Arc::new(CannedFetcher {
                pages: vec![],
                calls: Mutex::new(vec![]),
            }),
        );

        let state = env.run("anything", 5).await;
        assert!(state.documents.is_empty());
        assert_eq!(state.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_blocked_and_duplicate_urls_are_skipped() {
        let good = "https://example.org/a";
        let fetcher = CannedFetcher {
            pages: vec![(good.to_string(), Ok(long_page("useful content here")))],
            calls: Mutex::new(vec![]),
        };
        let env = WebEnvironment::new(
            Arc::new(CannedSearch {
                results: Ok(vec![
                    hit("https://www.facebook.com/page"),
                    hit(good),
                    hit(good),
                ]),
            }),
            Arc::new(fetcher),
        );

        let state = env.run("q", 5).await;
        assert_eq!(state.documents.len(), 1);
        assert_eq!(state.visited_urls, vec![good.to_string()]);
    }

    #[tokio::test]
    async fn test_short_documents_are_dropped() {
        let url = "https://example.org/short";
        let env = WebEnvironment::new(
            Arc::new(CannedSearch {
                results: Ok(vec![hit(url)]),
            }),
            Arc::new(CannedFetcher {
                pages: vec![(url.to_string(), Ok("<body>tiny</body>".to_string()))],
                calls: Mutex::new(vec![]),
            }),
        );

        let state = env.run("q", 5).await;
        assert!(state.documents.is_empty());
        assert!(state.errors.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_is_logged_and_run_continues() {
        let bad = "https://example.org/bad";
        let good = "https://example.org/good";
        let env = WebEnvironment::new(
            Arc::new(CannedSearch {
                results: Ok(vec![hit(bad), hit(good)]),
            }),
            Arc::new(CannedFetcher {
                pages: vec![
                    (bad.to_string(), Err(Error::fetch(bad, "refused"))),
                    (good.to_string(), Ok(long_page("real body"))),
                ],
                calls: Mutex::new(vec![]),
            }),
        );

        let state = env.run("q", 5).await;
        assert_eq!(state.documents.len(), 1);
        assert_eq!(state.errors.len(), 1);
        assert!(state.errors[0].contains(bad));
    }

    #[test]
    fn test_blocked_domain_matching() {
        assert!(WebEnvironment::is_blocked_domain("https://m.facebook.com/x"));
        assert!(WebEnvironment::is_blocked_domain("not a url"));
        assert!(!WebEnvironment::is_blocked_domain("https://example.gov/report"));
    }
}
