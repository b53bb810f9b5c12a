//! Meta-control decision policy.
//!
//! A pure function of (verified claims, confidence, attempt budget)
//! deciding whether the pipeline's current evidence is good enough to
//! accept, worth another attempt, or exhausted.

use serde::{Deserialize, Serialize};

use crate::verification::types::{ConfidenceLevel, VerificationStatus, VerifiedClaim};

/// Outcome of one meta-control evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    /// Evidence is sufficient; synthesize and finish.
    Accept { reason: String },
    /// Evidence is insufficient but another attempt may help.
    Retry {
        reason: String,
        /// Hint consumed only by the planner's strategy selector.
        recommendation: Option<String>,
    },
    /// Further attempts are unlikely to help; synthesize what exists.
    Stop { reason: String },
}

/// Decision discriminant, used for audit rows and progress tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionKind {
    Accept,
    Retry,
    Stop,
}

impl std::fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accept => write!(f, "ACCEPT"),
            Self::Retry => write!(f, "RETRY"),
            Self::Stop => write!(f, "STOP"),
        }
    }
}

impl Decision {
    pub fn kind(&self) -> DecisionKind {
        match self {
            Self::Accept { .. } => DecisionKind::Accept,
            Self::Retry { .. } => DecisionKind::Retry,
            Self::Stop { .. } => DecisionKind::Stop,
        }
    }

    /// The user-facing reason carried by every variant.
    pub fn reason(&self) -> &str {
        match self {
            Self::Accept { reason } | Self::Retry { reason, .. } | Self::Stop { reason } => reason,
        }
    }

    pub fn recommendation(&self) -> Option<&str> {
        match self {
            Self::Retry { recommendation, .. } => recommendation.as_deref(),
            _ => None,
        }
    }
}

/// The meta-control agent. Stateless; the planner owns all history.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerificationAgent;

impl VerificationAgent {
    /// Decide whether to ACCEPT, RETRY, or STOP.
    ///
    /// `confidence_level` is `None` when the stored level could not be
    /// interpreted; that unreachable-in-practice branch stops with a
    /// generic reason rather than guessing.
    pub fn decide(
        &self,
        verified_claims: &[VerifiedClaim],
        confidence_level: Option<ConfidenceLevel>,
        attempt: u32,
        max_attempts: u32,
    ) -> Decision {
        let exhausted = attempt >= max_attempts;

        if verified_claims.is_empty() {
            if exhausted {
                return Decision::Stop {
                    reason: "No verifiable claims could be found after multiple attempts."
                        .to_string(),
                };
            }
            return Decision::Retry {
                reason: "No verifiable claims were found. Additional sources may help."
                    .to_string(),
                recommendation: Some("Search broader or alternative sources.".to_string()),
            };
        }

        let has_conflict = verified_claims
            .iter()
            .any(|c| c.status == VerificationStatus::Conflict);

        if has_conflict {
            if exhausted {
                return Decision::Stop {
                    reason:
                        "Conflicting evidence persists despite additional verification attempts."
                            .to_string(),
                };
            }
            return Decision::Retry {
                reason: "Sources provide conflicting evidence. Further verification may resolve discrepancies."
                    .to_string(),
                recommendation: Some("Seek additional independent sources.".to_string()),
            };
        }

        match confidence_level {
            Some(ConfidenceLevel::High) => Decision::Accept {
                reason: "Multiple independent sources agree on the same claim. \
                         Further verification is unlikely to change the conclusion."
                    .to_string(),
            },
            Some(ConfidenceLevel::Medium) => Decision::Accept {
                reason: "Evidence from multiple sources broadly supports the conclusion, \
                         though agreement is limited."
                    .to_string(),
            },
            Some(ConfidenceLevel::Low) => {
                if exhausted {
                    Decision::Stop {
                        reason: "Confidence remains low after repeated attempts. \
                                 Further verification is unlikely to improve certainty."
                            .to_string(),
                    }
                } else {
                    Decision::Retry {
                        reason: "The conclusion is based on limited evidence. \
                                 Additional independent sources may improve confidence."
                            .to_string(),
                        recommendation: Some(
                            "Search for authoritative or corroborating sources.".to_string(),
                        ),
                    }
                }
            }
            None => Decision::Stop {
                reason: "Unable to determine verification status reliably.".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim(status: VerificationStatus) -> VerifiedClaim {
        VerifiedClaim {
            claim: "c".to_string(),
            sources: vec!["https://a".to_string()],
            status,
        }
    }

    fn agent() -> VerificationAgent {
        VerificationAgent
    }

    #[test]
    fn test_no_claims_retries_then_stops() {
        let decision = agent().decide(&[], Some(ConfidenceLevel::Low), 1, 3);
        assert_eq!(decision.kind(), DecisionKind::Retry);
        assert!(decision.recommendation().unwrap().contains("broader"));

        let decision = agent().decide(&[], Some(ConfidenceLevel::Low), 3, 3);
        assert_eq!(decision.kind(), DecisionKind::Stop);
    }

    #[test]
    fn test_conflict_retries_then_stops() {
        let claims = vec![claim(VerificationStatus::Conflict)];

        let decision = agent().decide(&claims, Some(ConfidenceLevel::Low), 1, 3);
        assert_eq!(decision.kind(), DecisionKind::Retry);
        assert!(decision.recommendation().unwrap().contains("independent"));

        let decision = agent().decide(&claims, Some(ConfidenceLevel::Low), 3, 3);
        assert_eq!(decision.kind(), DecisionKind::Stop);
        assert!(decision.reason().contains("Conflicting evidence persists"));
    }

    #[test]
    fn test_conflict_outranks_high_confidence() {
        let claims = vec![
            claim(VerificationStatus::Agreement),
            claim(VerificationStatus::Conflict),
        ];
        let decision = agent().decide(&claims, Some(ConfidenceLevel::High), 1, 3);
        assert_eq!(decision.kind(), DecisionKind::Retry);
    }

    #[test]
    fn test_high_and_medium_accept_even_when_exhausted() {
        let claims = vec![claim(VerificationStatus::Agreement)];

        for level in [ConfidenceLevel::High, ConfidenceLevel::Medium] {
            for attempt in [1, 3] {
                let decision = agent().decide(&claims, Some(level), attempt, 3);
                assert_eq!(decision.kind(), DecisionKind::Accept);
            }
        }
    }

    #[test]
    fn test_low_confidence_retries_then_stops() {
        let claims = vec![claim(VerificationStatus::SingleSource)];

        let decision = agent().decide(&claims, Some(ConfidenceLevel::Low), 2, 3);
        assert_eq!(decision.kind(), DecisionKind::Retry);
        assert!(decision.recommendation().unwrap().contains("corroborating"));

        let decision = agent().decide(&claims, Some(ConfidenceLevel::Low), 3, 3);
        assert_eq!(decision.kind(), DecisionKind::Stop);
    }

    #[test]
    fn test_unknown_confidence_stops() {
        let claims = vec![claim(VerificationStatus::Agreement)];
        let decision = agent().decide(&claims, None, 1, 3);
        assert_eq!(decision.kind(), DecisionKind::Stop);
        assert!(decision.reason().contains("Unable to determine"));
    }
}
