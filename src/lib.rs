//! # vera-core
//!
//! A closed-loop verified research service: a natural-language question
//! is answered by orchestrating web retrieval, claim extraction,
//! cross-source verification, confidence scoring, and answer synthesis
//! under a strict transparency contract — only decisions and evidence
//! are exposed, never prompts or oracle output.
//!
//! ## Core Components
//!
//! - **Web environment**: search → fetch → extract with per-run state
//! - **Verification**: claim extraction, similarity grouping, polarity
//!   conflict detection, confidence grading
//! - **Agents**: the research pipeline and the ACCEPT/RETRY/STOP
//!   meta-control policy
//! - **Planner**: the state machine driving retries, strategy rotation,
//!   and the query cache
//! - **Storage**: SQLite-backed sessions, audit traces, evidence,
//!   answers, and cache
//! - **API**: submit / status / result / trace endpoints
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vera_core::{Planner, SqliteStore};
//!
//! let store = Arc::new(SqliteStore::open("vera.db")?);
//! let mut planner = Planner::new(researcher, store);
//! let outcome = planner.run("What is ONDC?").await?;
//! println!("{} ({})", outcome.answer, outcome.confidence.level);
//! ```

pub mod agents;
pub mod api;
pub mod config;
pub mod error;
pub mod llm;
pub mod planner;
pub mod storage;
pub mod synthesis;
pub mod verification;
pub mod web;

// Re-exports for convenience
pub use agents::{Decision, DecisionKind, ResearchAgent, Researcher, VerificationAgent};
pub use api::{router, ApiError, AppState};
pub use config::{Config, SearchConfig};
pub use error::{Error, Result};
pub use llm::{ClientConfig, GeminiClient, LlmClient};
pub use planner::{
    compute_fingerprint, modify_query, normalize_question, Planner, PlannerContext, PlannerState,
    SearchStrategy,
};
pub use storage::SqliteStore;
pub use synthesis::{AnswerSynthesizer, ResearchOutcome};
pub use verification::{
    cosine_similarity, polarity_score, ClaimExtractor, ClaimMatcher, Confidence, ConfidenceLevel,
    ConfidenceScorer, ExtractedClaim, VerificationEngine, VerificationStatus, VerifiedClaim,
};
pub use web::{
    GoogleSearch, HttpFetcher, PageFetcher, SearchClient, SearchResult, WebDocument,
    WebEnvironment, WebRunState,
};
