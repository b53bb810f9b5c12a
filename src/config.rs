//! Environment-driven configuration.
//!
//! All external credentials and endpoints come from the process
//! environment. The server binary loads a `.env` file first via
//! `dotenvy`; the library itself only reads `std::env`.

use std::env;
use std::net::SocketAddr;

use crate::error::{Error, Result};

/// Default Google Custom Search endpoint.
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// Default bind address for the API server.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8000";

/// Web search adapter configuration.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Google Custom Search API key (empty = rely on fallback search)
    pub api_key: String,
    /// Google Custom Search engine id
    pub cx: String,
    /// Search endpoint URL
    pub endpoint: String,
}

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database location. Accepts `sqlite://<path>`, a bare path, or `:memory:`.
    pub database_url: String,
    /// Web search settings
    pub search: SearchConfig,
    /// Oracle credential (Gemini API key)
    pub gemini_api_key: String,
    /// Token required by the trace endpoint; None leaves it open
    pub trace_token: Option<String>,
    /// Address the API server binds to
    pub bind_addr: SocketAddr,
}

impl Config {
    /// Load configuration from the environment.
    pub fn from_env() -> Result<Self> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://vera.db".to_string());

        let search = SearchConfig {
            api_key: env::var("GOOGLE_SEARCH_API_KEY").unwrap_or_default(),
            cx: env::var("GOOGLE_SEARCH_CX").unwrap_or_default(),
            endpoint: env::var("GOOGLE_SEARCH_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_SEARCH_ENDPOINT.to_string()),
        };

        let gemini_api_key = env::var("GEMINI_API_KEY").unwrap_or_default();

        let trace_token = env::var("INTERNAL_TRACE_TOKEN").ok().filter(|t| !t.is_empty());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| Error::config(format!("invalid BIND_ADDR: {}", e)))?;

        Ok(Self {
            database_url,
            search,
            gemini_api_key,
            trace_token,
            bind_addr,
        })
    }

    /// Resolve the SQLite path from `database_url`.
    ///
    /// Only sqlite targets are supported; other schemes are a
    /// configuration error rather than a silently degraded backend.
    pub fn sqlite_path(&self) -> Result<String> {
        let url = self.database_url.trim();
        if url == ":memory:" || url == "sqlite://:memory:" {
            return Ok(":memory:".to_string());
        }
        if let Some(rest) = url.strip_prefix("sqlite:///") {
            return Ok(format!("/{}", rest));
        }
        if let Some(rest) = url.strip_prefix("sqlite://") {
            return Ok(rest.to_string());
        }
        if let Some(rest) = url.strip_prefix("sqlite:") {
            return Ok(rest.to_string());
        }
        if url.contains("://") {
            return Err(Error::config(format!(
                "unsupported DATABASE_URL scheme: {}",
                url.split("://").next().unwrap_or("unknown")
            )));
        }
        Ok(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_url(url: &str) -> Config {
        Config {
            database_url: url.to_string(),
            search: SearchConfig {
                api_key: String::new(),
                cx: String::new(),
                endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
            },
            gemini_api_key: String::new(),
            trace_token: None,
            bind_addr: DEFAULT_BIND_ADDR.parse().unwrap(),
        }
    }

    #[test]
    fn test_sqlite_path_variants() {
        assert_eq!(config_with_url(":memory:").sqlite_path().unwrap(), ":memory:");
        assert_eq!(
            config_with_url("sqlite://vera.db").sqlite_path().unwrap(),
            "vera.db"
        );
        assert_eq!(
            config_with_url("sqlite:///var/lib/vera.db").sqlite_path().unwrap(),
            "/var/lib/vera.db"
        );
        assert_eq!(
            config_with_url("data/vera.db").sqlite_path().unwrap(),
            "data/vera.db"
        );
    }

    #[test]
    fn test_rejects_non_sqlite_scheme() {
        let err = config_with_url("postgresql://localhost/vera")
            .sqlite_path()
            .unwrap_err();
        assert!(err.to_string().contains("postgresql"));
    }
}
