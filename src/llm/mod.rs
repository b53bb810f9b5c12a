//! LLM oracle client.
//!
//! The oracle is an opaque text-in/text-out service. Prompts and raw
//! responses live only on the stack of the calling component; they are
//! never persisted, logged, or exposed through the API.
//!
//! ## Example
//!
//! ```rust,ignore
//! use vera_core::llm::{ClientConfig, GeminiClient, LlmClient};
//!
//! let client = GeminiClient::new(ClientConfig::new("your-api-key"));
//! let answer = client.complete("Summarize the claims below ...").await?;
//! let vector = client.embed("ONDC was launched in 2022").await?;
//! ```

pub mod client;

pub use client::{ClientConfig, GeminiClient, LlmClient};
