//! Cross-source claim verification.

use std::sync::Arc;

use crate::llm::LlmClient;
use crate::verification::matcher::ClaimMatcher;
use crate::verification::polarity::polarity_score;
use crate::verification::types::{ExtractedClaim, VerificationStatus, VerifiedClaim};

/// Grades claim groups by distinct-source count and polarity agreement.
pub struct VerificationEngine {
    matcher: ClaimMatcher,
}

impl VerificationEngine {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            matcher: ClaimMatcher::new(client),
        }
    }

    pub fn with_matcher(matcher: ClaimMatcher) -> Self {
        Self { matcher }
    }

    fn is_conflicting(claim_a: &str, claim_b: &str) -> bool {
        polarity_score(claim_a) * polarity_score(claim_b) < 0
    }

    /// Verify extracted claims, emitting one verified claim per
    /// similarity group. Claim text and source lists pass through
    /// verbatim; sources are deduplicated in first-seen order.
    pub async fn verify(&self, extracted_claims: &[ExtractedClaim]) -> Vec<VerifiedClaim> {
        let groups = self.matcher.group_similar_claims(extracted_claims).await;
        let mut verified = Vec::with_capacity(groups.len());

        for group in groups {
            let mut sources: Vec<String> = Vec::new();
            for member in &group {
                if !sources.contains(&member.source_url) {
                    sources.push(member.source_url.clone());
                }
            }

            let status = if sources.len() == 1 {
                VerificationStatus::SingleSource
            } else {
                let mut conflict_found = false;
                'outer: for i in 0..group.len() {
                    for j in (i + 1)..group.len() {
                        if Self::is_conflicting(&group[i].claim, &group[j].claim) {
                            conflict_found = true;
                            break 'outer;
                        }
                    }
                }

                if conflict_found {
                    VerificationStatus::Conflict
                } else {
                    VerificationStatus::Agreement
                }
            };

            verified.push(VerifiedClaim {
                claim: group[0].claim.clone(),
                sources,
                status,
            });
        }

        verified
    }
}
