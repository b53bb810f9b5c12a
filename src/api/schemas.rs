//! Request and response records for the API.
//!
//! Plain serde types; validation of the few hard constraints happens in
//! the handlers. Response shapes carry decisions, evidence, and
//! metadata only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct QuerySubmitRequest {
    pub question: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuerySubmitResponse {
    pub session_id: Uuid,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryStatusResponse {
    pub status: String,
}

/// External projection of a verified claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub claim: String,
    pub status: String,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryResultResponse {
    pub answer: String,
    pub confidence_level: String,
    pub confidence_reason: String,
    pub evidence: Vec<EvidenceItem>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlannerTraceItem {
    pub attempt_number: u32,
    pub planner_state: String,
    pub verification_decision: String,
    pub strategy_used: String,
    pub num_docs: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchLogItem {
    pub attempt_number: u32,
    pub query_used: String,
    pub num_docs: u32,
    pub success: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryTraceResponse {
    pub planner_traces: Vec<PlannerTraceItem>,
    pub search_logs: Vec<SearchLogItem>,
}
