//! Research agent: one full observe → extract → verify → score →
//! synthesize pass.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

use crate::synthesis::{AnswerSynthesizer, ResearchOutcome};
use crate::verification::claims::ClaimExtractor;
use crate::verification::confidence::ConfidenceScorer;
use crate::verification::types::ExtractedClaim;
use crate::verification::verifier::VerificationEngine;
use crate::web::environment::WebEnvironment;

/// Words ignored when comparing a claim against the question.
const STOPWORDS: &[&str] = &[
    "the", "is", "a", "an", "of", "to", "and", "in", "for", "on", "with", "by", "as", "that",
    "this", "what", "how", "why", "when", "where", "which", "does", "do", "are", "was", "were",
    "will", "would", "can", "could", "should", "must", "may", "might",
];

/// The research seam the planner drives.
///
/// Research never fails: adapter problems degrade the outcome to LOW
/// confidence instead of surfacing as errors.
#[async_trait]
pub trait Researcher: Send + Sync {
    async fn research(&self, question: &str, num_docs: usize) -> ResearchOutcome;
}

/// Production research agent over the web environment and the
/// verification pipeline.
pub struct ResearchAgent {
    web_env: Arc<WebEnvironment>,
    claim_extractor: ClaimExtractor,
    verifier: VerificationEngine,
    synthesizer: AnswerSynthesizer,
}

impl ResearchAgent {
    pub fn new(
        web_env: Arc<WebEnvironment>,
        claim_extractor: ClaimExtractor,
        verifier: VerificationEngine,
        synthesizer: AnswerSynthesizer,
    ) -> Self {
        Self {
            web_env,
            claim_extractor,
            verifier,
            synthesizer,
        }
    }
}

#[async_trait]
impl Researcher for ResearchAgent {
    async fn research(&self, question: &str, num_docs: usize) -> ResearchOutcome {
        let run = self.web_env.run(question, num_docs).await;
        tracing::debug!(
            question,
            documents = run.documents.len(),
            errors = run.errors.len(),
            "research pass retrieved documents"
        );

        let mut extracted_claims: Vec<ExtractedClaim> = Vec::new();
        for doc in &run.documents {
            let claims = self.claim_extractor.extract_claims(&doc.text, &doc.url).await;
            for claim in claims {
                if is_relevant(&claim.claim, question) {
                    extracted_claims.push(claim);
                }
            }
        }

        if extracted_claims.is_empty() {
            tracing::debug!(question, "no relevant claims extracted");
            return ResearchOutcome::insufficient_information();
        }

        let verified_claims = self.verifier.verify(&extracted_claims).await;
        let confidence = ConfidenceScorer::score(&verified_claims);

        tracing::debug!(
            claims = verified_claims.len(),
            level = %confidence.level,
            "research pass scored"
        );

        self.synthesizer
            .synthesize(question, &verified_claims, &confidence)
            .await
    }
}

fn keywords(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .filter(|w| w.len() > 2 && !STOPWORDS.contains(w))
        .map(|w| w.to_string())
        .collect()
}

/// A claim is relevant when it shares at least one significant keyword
/// with the question.
fn is_relevant(claim: &str, question: &str) -> bool {
    let claim_words = keywords(claim);
    let question_words = keywords(question);
    claim_words.intersection(&question_words).next().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_drop_stopwords_and_short_words() {
        let words = keywords("What is the ONDC api?");
        assert!(words.contains("ondc"));
        assert!(words.contains("api"));
        assert!(!words.contains("what"));
        assert!(!words.contains("is"));
    }

    #[test]
    fn test_relevance_requires_one_overlapping_keyword() {
        assert!(is_relevant(
            "ONDC was launched by the Government of India in 2022",
            "What is ONDC?"
        ));
        assert!(!is_relevant(
            "Bananas are rich in potassium and fiber",
            "What is ONDC?"
        ));
    }

    #[test]
    fn test_relevance_ignores_punctuation_and_case() {
        assert!(is_relevant(
            "The network (ONDC) is government-backed",
            "what is ondc"
        ));
    }
}
