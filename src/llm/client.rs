//! LLM client trait and the Gemini provider implementation.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};

/// Text-completion and embedding oracle.
///
/// Implementations must be thread-safe (`Send + Sync`) so a single
/// client can be shared across concurrent pipeline tasks. Completion is
/// deterministic: providers pin temperature/top-k so repeated calls on
/// the same prompt are stable.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Complete a prompt, returning the response text.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Produce a fixed-length embedding vector for a text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Configuration for LLM clients.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API key
    pub api_key: String,
    /// Base URL override
    pub base_url: Option<String>,
    /// Completion model
    pub model: String,
    /// Embedding model
    pub embedding_model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Max output tokens per completion
    pub max_output_tokens: u32,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            model: "gemini-2.5-flash".to_string(),
            embedding_model: "text-embedding-004".to_string(),
            timeout_secs: 30,
            max_output_tokens: 1024,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

fn build_http_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Error::llm(format!("failed to create HTTP client: {}", e)))
}

/// Google Gemini client.
pub struct GeminiClient {
    config: ClientConfig,
    http: Client,
}

impl GeminiClient {
    const DEFAULT_BASE_URL: &'static str = "https://generativelanguage.googleapis.com";

    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = build_http_client(config.timeout_secs)?;
        Ok(Self { config, http })
    }

    fn base_url(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or(Self::DEFAULT_BASE_URL)
    }
}

// Gemini API types
#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f64,
    #[serde(rename = "topP")]
    top_p: f64,
    #[serde(rename = "topK")]
    top_k: u32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Serialize)]
struct EmbedRequest {
    model: String,
    content: Content,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
    #[serde(default)]
    status: String,
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        if self.config.api_key.is_empty() {
            return Err(Error::config("GEMINI_API_KEY is not set"));
        }

        let api_request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            // Deterministic sampling: phrasing only, no creativity.
            generation_config: GenerationConfig {
                temperature: 0.0,
                top_p: 1.0,
                top_k: 1,
                max_output_tokens: self.config.max_output_tokens,
            },
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url(),
            self.config.model,
            self.config.api_key
        );

        let response = self
            .http
            .post(&url)
            .json(&api_request)
            .send()
            .await
            .map_err(|e| Error::llm(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::llm(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            if let Ok(error) = serde_json::from_str::<GeminiError>(&body) {
                return Err(Error::llm(format!(
                    "Gemini API error ({}): {}",
                    error.error.status, error.error.message
                )));
            }
            return Err(Error::llm(format!("Gemini API error ({})", status)));
        }

        let api_response: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| Error::llm(format!("failed to parse response: {}", e)))?;

        let text = api_response
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .map(|p| p.text)
            .collect::<Vec<_>>()
            .join("");

        Ok(text.trim().to_string())
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self.config.api_key.is_empty() {
            return Err(Error::config("GEMINI_API_KEY is not set"));
        }

        let api_request = EmbedRequest {
            model: format!("models/{}", self.config.embedding_model),
            content: Content {
                parts: vec![Part {
                    text: text.to_string(),
                }],
            },
        };

        let url = format!(
            "{}/v1beta/models/{}:embedContent?key={}",
            self.base_url(),
            self.config.embedding_model,
            self.config.api_key
        );

        let response = self
            .http
            .post(&url)
            .json(&api_request)
            .send()
            .await
            .map_err(|e| Error::llm(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::llm(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            if let Ok(error) = serde_json::from_str::<GeminiError>(&body) {
                return Err(Error::llm(format!(
                    "Gemini embedding error ({}): {}",
                    error.error.status, error.error.message
                )));
            }
            return Err(Error::llm(format!("Gemini embedding error ({})", status)));
        }

        let api_response: EmbedResponse = serde_json::from_str(&body)
            .map_err(|e| Error::llm(format!("failed to parse embedding: {}", e)))?;

        Ok(api_response.embedding.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_defaults() {
        let config = ClientConfig::new("key");
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.embedding_model, "text-embedding-004");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_output_tokens, 1024);
    }

    #[test]
    fn test_client_config_builder() {
        let config = ClientConfig::new("key")
            .with_model("gemini-2.5-pro")
            .with_base_url("http://localhost:9999")
            .with_timeout(5);
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:9999"));
        assert_eq!(config.timeout_secs, 5);
    }

    #[tokio::test]
    async fn test_complete_without_key_is_config_error() {
        let client = GeminiClient::new(ClientConfig::new("")).unwrap();
        let err = client.complete("hello").await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_generate_response_parsing() {
        let body = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "- ONDC was launched in 2022"}]}}
            ]
        }"#;
        let parsed: GenerateResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.candidates.len(), 1);
    }

    #[test]
    fn test_embed_response_parsing() {
        let body = r#"{"embedding": {"values": [0.25, -0.5, 1.0]}}"#;
        let parsed: EmbedResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.embedding.values, vec![0.25, -0.5, 1.0]);
    }
}
