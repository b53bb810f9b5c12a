//! Answer synthesis from verified claims.
//!
//! The oracle is used for phrasing only: the prompt lists each verified
//! claim verbatim with its status, and sampling is deterministic.
//! Synthesis returns values; persistence is the planner's job.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::llm::LlmClient;
use crate::verification::types::{Confidence, ConfidenceLevel, VerifiedClaim};

/// Fixed warning attached to LOW-confidence answers.
const LOW_CONFIDENCE_NOTE: &str = "The available evidence is limited or conflicting. \
Further independent confirmation is recommended.";

/// The research result record: answer, confidence, evidence, optional notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchOutcome {
    pub answer: String,
    pub confidence: Confidence,
    pub evidence: Vec<VerifiedClaim>,
    pub notes: Option<String>,
}

impl ResearchOutcome {
    /// Standard outcome when no relevant claims could be extracted at all.
    pub fn insufficient_information() -> Self {
        Self {
            answer: "Insufficient verified information is available to answer this question."
                .to_string(),
            confidence: Confidence::low(
                "No relevant claims could be extracted from available sources.",
            ),
            evidence: Vec::new(),
            notes: Some("Further investigation is recommended.".to_string()),
        }
    }
}

/// Builds a constrained prompt over verified claims and asks the oracle
/// to phrase the answer.
pub struct AnswerSynthesizer {
    client: Arc<dyn LlmClient>,
}

impl AnswerSynthesizer {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    /// Synthesize an answer. Evidence entries are copied verbatim from
    /// the verified claims; the empty-claims path short-circuits
    /// without an oracle call; oracle failure degrades to an empty
    /// answer with confidence and evidence preserved.
    pub async fn synthesize(
        &self,
        question: &str,
        verified_claims: &[VerifiedClaim],
        confidence: &Confidence,
    ) -> ResearchOutcome {
        if verified_claims.is_empty() {
            return ResearchOutcome {
                answer: "Insufficient verified information is available to answer this question."
                    .to_string(),
                confidence: Confidence::low("No verifiable claims were found."),
                evidence: Vec::new(),
                notes: Some("No relevant claims could be extracted.".to_string()),
            };
        }

        let prompt = build_synthesis_prompt(question, verified_claims, confidence.level);

        let answer = match self.client.complete(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!(error = %e, "synthesis oracle call failed, returning empty answer");
                String::new()
            }
        };

        ResearchOutcome {
            answer,
            confidence: confidence.clone(),
            evidence: verified_claims.to_vec(),
            notes: notes_for(confidence.level),
        }
    }
}

fn notes_for(level: ConfidenceLevel) -> Option<String> {
    match level {
        ConfidenceLevel::Low => Some(LOW_CONFIDENCE_NOTE.to_string()),
        ConfidenceLevel::High | ConfidenceLevel::Medium => None,
    }
}

fn build_synthesis_prompt(
    question: &str,
    claims: &[VerifiedClaim],
    confidence_level: ConfidenceLevel,
) -> String {
    let claims_block = claims
        .iter()
        .map(|c| format!("- {} (Status: {})", c.claim, c.status))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a professional research summarizer.

Use ONLY the claims provided. Do NOT add new facts, infer, speculate, or
change claim meaning. Be cautious and professional in tone. One short
paragraph only.

Question:
{}

Verified Claims:
{}

Overall Confidence Level: {}

Compose a clear, honest answer based ONLY on the above."#,
        question, claims_block, confidence_level
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::verification::types::VerificationStatus;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct CannedOracle {
        response: Result<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl CannedOracle {
        fn ok(text: &str) -> Self {
            Self {
                response: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                response: Err(Error::llm("down")),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LlmClient for CannedOracle {
        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.response {
                Ok(r) => Ok(r.clone()),
                Err(_) => Err(Error::llm("down")),
            }
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(Error::llm("not used"))
        }
    }

    fn claim(text: &str) -> VerifiedClaim {
        VerifiedClaim {
            claim: text.to_string(),
            sources: vec!["https://a".to_string(), "https://b".to_string()],
            status: VerificationStatus::Agreement,
        }
    }

    fn high() -> Confidence {
        Confidence {
            level: ConfidenceLevel::High,
            reason: "Strong agreement".to_string(),
        }
    }

    #[tokio::test]
    async fn test_empty_claims_short_circuits_without_oracle_call() {
        let oracle = Arc::new(CannedOracle::ok("should not be called"));
        let synthesizer = AnswerSynthesizer::new(oracle.clone());

        let outcome = synthesizer.synthesize("q", &[], &high()).await;

        assert!(oracle.prompts.lock().unwrap().is_empty());
        assert_eq!(outcome.confidence.level, ConfidenceLevel::Low);
        assert!(outcome.answer.contains("Insufficient verified information"));
        assert!(outcome.evidence.is_empty());
    }

    #[tokio::test]
    async fn test_claims_listed_verbatim_in_prompt() {
        let oracle = Arc::new(CannedOracle::ok("Paris is the capital."));
        let synthesizer = AnswerSynthesizer::new(oracle.clone());
        let claims = vec![claim("Paris is the capital of France")];

        let outcome = synthesizer.synthesize("capital?", &claims, &high()).await;

        let prompts = oracle.prompts.lock().unwrap();
        assert!(prompts[0].contains("- Paris is the capital of France (Status: AGREEMENT)"));
        assert_eq!(outcome.answer, "Paris is the capital.");
        assert_eq!(outcome.evidence, claims);
        assert!(outcome.notes.is_none());
    }

    #[tokio::test]
    async fn test_oracle_failure_yields_empty_answer_with_evidence_preserved() {
        let synthesizer = AnswerSynthesizer::new(Arc::new(CannedOracle::failing()));
        let claims = vec![claim("Some corroborated fact about the topic")];

        let outcome = synthesizer.synthesize("q", &claims, &high()).await;

        assert_eq!(outcome.answer, "");
        assert_eq!(outcome.confidence.level, ConfidenceLevel::High);
        assert_eq!(outcome.evidence, claims);
    }

    #[tokio::test]
    async fn test_low_confidence_attaches_fixed_note() {
        let synthesizer = AnswerSynthesizer::new(Arc::new(CannedOracle::ok("hedged answer")));
        let claims = vec![claim("fact")];
        let low = Confidence::low("No claims have multi-source agreement.");

        let outcome = synthesizer.synthesize("q", &claims, &low).await;
        assert_eq!(outcome.notes.as_deref(), Some(LOW_CONFIDENCE_NOTE));
    }
}
