//! Error types for vera-core.

use thiserror::Error;

/// Result type alias using vera-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during research-loop operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Web search adapter failure
    #[error("Search error: {0}")]
    Search(String),

    /// Document fetch failure
    #[error("Fetch error: {url} - {message}")]
    Fetch { url: String, message: String },

    /// HTML extraction failure
    #[error("Extract error: {0}")]
    Extract(String),

    /// LLM oracle failure
    #[error("LLM error: {0}")]
    Llm(String),

    /// Database storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a fetch error.
    pub fn fetch(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create an LLM oracle error.
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Self::Storage(e.to_string())
    }
}
