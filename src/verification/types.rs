//! Core types for claim verification.

use serde::{Deserialize, Serialize};

/// An atomic claim attributed to one source URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedClaim {
    /// The claim text, verbatim from extraction
    pub claim: String,
    /// URL of the document the claim came from
    pub source_url: String,
}

impl ExtractedClaim {
    pub fn new(claim: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            claim: claim.into(),
            source_url: source_url.into(),
        }
    }
}

/// Verification status of a claim group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    /// Multiple sources, no polarity conflict
    Agreement,
    /// Multiple sources with opposing polarity
    Conflict,
    /// Only one distinct source
    SingleSource,
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Agreement => write!(f, "AGREEMENT"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::SingleSource => write!(f, "SINGLE_SOURCE"),
        }
    }
}

impl std::str::FromStr for VerificationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AGREEMENT" => Ok(Self::Agreement),
            "CONFLICT" => Ok(Self::Conflict),
            "SINGLE_SOURCE" => Ok(Self::SingleSource),
            other => Err(format!("unknown verification status: {}", other)),
        }
    }
}

/// A group of semantically near-identical claims aggregated across
/// sources, carrying the representative text and deduplicated source
/// list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedClaim {
    pub claim: String,
    pub sources: Vec<String>,
    pub status: VerificationStatus,
}

/// Confidence grade for a set of verified claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "HIGH"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::Low => write!(f, "LOW"),
        }
    }
}

impl std::str::FromStr for ConfidenceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HIGH" => Ok(Self::High),
            "MEDIUM" => Ok(Self::Medium),
            "LOW" => Ok(Self::Low),
            other => Err(format!("unknown confidence level: {}", other)),
        }
    }
}

/// Confidence level plus its user-facing explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confidence {
    pub level: ConfidenceLevel,
    pub reason: String,
}

impl Confidence {
    pub fn low(reason: impl Into<String>) -> Self {
        Self {
            level: ConfidenceLevel::Low,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            VerificationStatus::Agreement,
            VerificationStatus::Conflict,
            VerificationStatus::SingleSource,
        ] {
            let text = status.to_string();
            assert_eq!(text.parse::<VerificationStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_level_round_trip() {
        for level in [
            ConfidenceLevel::High,
            ConfidenceLevel::Medium,
            ConfidenceLevel::Low,
        ] {
            let text = level.to_string();
            assert_eq!(text.parse::<ConfidenceLevel>().unwrap(), level);
        }
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let claim = VerifiedClaim {
            claim: "x".to_string(),
            sources: vec!["https://a".to_string()],
            status: VerificationStatus::SingleSource,
        };
        let json = serde_json::to_string(&claim).unwrap();
        assert!(json.contains("\"SINGLE_SOURCE\""));
    }
}
