//! Row types for the persistence layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One submitted question and its lifecycle status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuerySessionRow {
    pub id: Uuid,
    pub question: String,
    /// INIT / RESEARCH / VERIFY / SYNTHESIZE / DONE / FAILED
    pub status: String,
    pub final_confidence_level: Option<String>,
    pub final_confidence_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl QuerySessionRow {
    /// DONE and FAILED are the only terminal states.
    pub fn is_terminal(&self) -> bool {
        self.status == "DONE" || self.status == "FAILED"
    }
}

/// One planner decision record, emitted per VERIFY evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerTraceRow {
    pub id: Uuid,
    pub session_id: Uuid,
    pub attempt_number: u32,
    pub planner_state: String,
    pub verification_decision: String,
    pub strategy_used: String,
    pub num_docs: u32,
    pub stop_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One search invocation record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchLogRow {
    pub id: Uuid,
    pub session_id: Uuid,
    pub attempt_number: u32,
    pub query_used: String,
    pub num_docs: u32,
    pub success: bool,
    pub created_at: DateTime<Utc>,
}

/// One verified claim persisted at synthesis, verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceRow {
    pub id: Uuid,
    pub session_id: Uuid,
    pub claim_text: String,
    /// AGREEMENT / CONFLICT / SINGLE_SOURCE
    pub verification_status: String,
    pub source_urls: Vec<String>,
}

/// One synthesized answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerSnapshotRow {
    pub id: Uuid,
    pub session_id: Uuid,
    pub answer_text: String,
    pub confidence_level: String,
    pub confidence_reason: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One cache entry pointing at a prior accepted session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryCacheRow {
    pub query_hash: String,
    pub session_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        let mut session = QuerySessionRow {
            id: Uuid::new_v4(),
            question: "q".to_string(),
            status: "RESEARCH".to_string(),
            final_confidence_level: None,
            final_confidence_reason: None,
            created_at: Utc::now(),
        };
        assert!(!session.is_terminal());

        session.status = "DONE".to_string();
        assert!(session.is_terminal());

        session.status = "FAILED".to_string();
        assert!(session.is_terminal());
    }
}
