//! Confidence grading over verified claims.

use std::collections::HashSet;

use crate::verification::types::{Confidence, ConfidenceLevel, VerificationStatus, VerifiedClaim};

/// Grades a set of verified claims into {HIGH, MEDIUM, LOW} with a
/// short user-facing reason. Rules apply in order; first match wins.
pub struct ConfidenceScorer;

impl ConfidenceScorer {
    pub fn score(verified_claims: &[VerifiedClaim]) -> Confidence {
        if verified_claims.is_empty() {
            return Confidence::low("No verified claims available.");
        }

        let total_claims = verified_claims.len();
        let agreement_count = verified_claims
            .iter()
            .filter(|c| c.status == VerificationStatus::Agreement)
            .count();
        let conflict_count = verified_claims
            .iter()
            .filter(|c| c.status == VerificationStatus::Conflict)
            .count();
        let single_source_count = verified_claims
            .iter()
            .filter(|c| c.status == VerificationStatus::SingleSource)
            .count();

        let source_count = verified_claims
            .iter()
            .flat_map(|c| c.sources.iter())
            .collect::<HashSet<_>>()
            .len();

        if conflict_count > 0 {
            return Confidence::low(format!(
                "Conflicting information detected in {} claim(s).",
                conflict_count
            ));
        }

        if single_source_count == total_claims {
            return Confidence::low(format!(
                "All {} claim(s) from single sources only (no corroboration).",
                total_claims
            ));
        }

        if agreement_count == 0 {
            return Confidence::low("No claims have multi-source agreement.");
        }

        if agreement_count * 2 >= total_claims && source_count >= 2 {
            return Confidence {
                level: ConfidenceLevel::High,
                reason: format!(
                    "Strong agreement: {}/{} claims corroborated by multiple independent sources ({} total).",
                    agreement_count, total_claims, source_count
                ),
            };
        }

        Confidence {
            level: ConfidenceLevel::Medium,
            reason: format!(
                "Partial corroboration: {}/{} claims agreed upon.",
                agreement_count, total_claims
            ),
        }
    }
}
