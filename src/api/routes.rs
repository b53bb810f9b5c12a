//! API routes and the background pipeline task.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use uuid::Uuid;

use crate::agents::research::Researcher;
use crate::api::error::ApiError;
use crate::api::schemas::{
    EvidenceItem, PlannerTraceItem, QueryResultResponse, QueryStatusResponse, QuerySubmitRequest,
    QuerySubmitResponse, QueryTraceResponse, SearchLogItem,
};
use crate::planner::Planner;
use crate::storage::models::QuerySessionRow;
use crate::storage::store::SqliteStore;

/// Shared application state handed to every handler.
pub struct AppState {
    pub store: Arc<SqliteStore>,
    pub researcher: Arc<dyn Researcher>,
    pub trace_token: Option<String>,
    pub max_attempts: u32,
}

/// Build the API router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/query", post(submit_query))
        .route("/api/query/:session_id/status", get(poll_status))
        .route("/api/query/:session_id/result", get(fetch_result))
        .route("/api/query/:session_id/trace", get(fetch_trace))
        .with_state(state)
}

/// Malformed ids are a 404, never a 500.
fn parse_session_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound("Invalid session_id format".to_string()))
}

fn load_session(state: &AppState, session_id: &Uuid) -> Result<QuerySessionRow, ApiError> {
    state
        .store
        .get_session(session_id)?
        .ok_or_else(|| ApiError::NotFound("Unknown session_id".to_string()))
}

/// Run the planner for one session on a background task. Failures are
/// marked on the session best-effort; nothing sensitive is logged.
async fn run_pipeline(state: Arc<AppState>, session_id: Uuid, question: String) {
    let mut planner = Planner::new(state.researcher.clone(), state.store.clone())
        .with_max_attempts(state.max_attempts)
        .with_session(session_id);

    if let Err(e) = planner.run(&question).await {
        tracing::warn!(session = %session_id, error = %e, "pipeline task failed");
        let _ = state.store.update_final_status(
            &session_id,
            "FAILED",
            "LOW",
            "Planner execution failed.",
        );
    }
}

async fn submit_query(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<QuerySubmitRequest>,
) -> Result<Json<QuerySubmitResponse>, ApiError> {
    if payload.question.is_empty() {
        return Err(ApiError::Unprocessable(
            "question must not be empty".to_string(),
        ));
    }

    let session = state.store.create_session(&payload.question)?;

    tracing::info!(session = %session.id, "query submitted");
    tokio::spawn(run_pipeline(state.clone(), session.id, payload.question));

    Ok(Json(QuerySubmitResponse {
        session_id: session.id,
        status: "PROCESSING".to_string(),
    }))
}

async fn poll_status(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<QueryStatusResponse>, ApiError> {
    let session_id = parse_session_id(&session_id)?;
    let session = load_session(&state, &session_id)?;

    Ok(Json(QueryStatusResponse {
        status: session.status,
    }))
}

async fn fetch_result(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<QueryResultResponse>, ApiError> {
    let session_id = parse_session_id(&session_id)?;
    let session = load_session(&state, &session_id)?;

    if !session.is_terminal() {
        return Err(ApiError::NotReady("Result not ready".to_string()));
    }

    let snapshot = state.store.latest_answer(&session_id)?;
    let evidence_rows = state.store.list_evidence(&session_id)?;

    let (answer, confidence_level, confidence_reason, snapshot_notes) = match snapshot {
        Some(snapshot) => (
            snapshot.answer_text,
            snapshot.confidence_level,
            snapshot.confidence_reason,
            snapshot.notes,
        ),
        None => (
            String::new(),
            session
                .final_confidence_level
                .clone()
                .unwrap_or_else(|| "LOW".to_string()),
            session.final_confidence_reason.clone().unwrap_or_default(),
            None,
        ),
    };

    let notes = if session.status == "FAILED" {
        session.final_confidence_reason
    } else {
        snapshot_notes
    };

    let evidence = evidence_rows
        .into_iter()
        .map(|row| EvidenceItem {
            claim: row.claim_text,
            status: row.verification_status,
            sources: row.source_urls,
        })
        .collect();

    Ok(Json(QueryResultResponse {
        answer,
        confidence_level,
        confidence_reason,
        evidence,
        notes,
    }))
}

async fn fetch_trace(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<QueryTraceResponse>, ApiError> {
    if let Some(required) = &state.trace_token {
        let provided = headers
            .get("X-Internal-Token")
            .and_then(|v| v.to_str().ok());
        if provided != Some(required.as_str()) {
            return Err(ApiError::Forbidden);
        }
    }

    let session_id = parse_session_id(&session_id)?;
    load_session(&state, &session_id)?;

    let planner_traces = state
        .store
        .list_traces(&session_id)?
        .into_iter()
        .map(|t| PlannerTraceItem {
            attempt_number: t.attempt_number,
            planner_state: t.planner_state,
            verification_decision: t.verification_decision,
            strategy_used: t.strategy_used,
            num_docs: t.num_docs,
            created_at: t.created_at,
        })
        .collect();

    let search_logs = state
        .store
        .list_searches(&session_id)?
        .into_iter()
        .map(|l| SearchLogItem {
            attempt_number: l.attempt_number,
            query_used: l.query_used,
            num_docs: l.num_docs,
            success: l.success,
            created_at: l.created_at,
        })
        .collect();

    Ok(Json(QueryTraceResponse {
        planner_traces,
        search_logs,
    }))
}
