//! Claim verification pipeline.
//!
//! Documents become atomic claims, claims are grouped by embedding
//! similarity across sources, and each group is graded by distinct
//! source count and polarity agreement. The pipeline is pure
//! transformation: no decisions are made here.

pub mod claims;
pub mod confidence;
pub mod matcher;
pub mod polarity;
pub mod types;
pub mod verifier;

pub use claims::ClaimExtractor;
pub use confidence::ConfidenceScorer;
pub use matcher::{cosine_similarity, ClaimMatcher, SIMILARITY_THRESHOLD};
pub use polarity::polarity_score;
pub use types::{
    Confidence, ConfidenceLevel, ExtractedClaim, VerificationStatus, VerifiedClaim,
};
pub use verifier::VerificationEngine;
