//! SQLite-backed session store.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::storage::models::{
    AnswerSnapshotRow, EvidenceRow, PlannerTraceRow, QueryCacheRow, QuerySessionRow, SearchLogRow,
};
use crate::storage::schema::{initialize_schema, is_initialized};
use crate::verification::types::VerifiedClaim;

/// Explicit store handle passed to the planner and API at construction.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open or create a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| Error::storage(e.to_string()))?;

        if !is_initialized(&conn) {
            initialize_schema(&conn).map_err(|e| Error::storage(e.to_string()))?;
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| Error::storage(e.to_string()))?;
        initialize_schema(&conn).map_err(|e| Error::storage(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| Error::Internal(format!("failed to lock connection: {}", e)))?;
        f(&conn).map_err(|e| Error::storage(e.to_string()))
    }

    // ==================== Sessions ====================

    /// Create a session in INIT state.
    pub fn create_session(&self, question: &str) -> Result<QuerySessionRow> {
        let row = QuerySessionRow {
            id: Uuid::new_v4(),
            question: question.to_string(),
            status: "INIT".to_string(),
            final_confidence_level: None,
            final_confidence_reason: None,
            created_at: Utc::now(),
        };

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO query_sessions (id, question, status, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    row.id.to_string(),
                    row.question,
                    row.status,
                    row.created_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })?;

        Ok(row)
    }

    /// Get a session by id.
    pub fn get_session(&self, session_id: &Uuid) -> Result<Option<QuerySessionRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, question, status, final_confidence_level,
                        final_confidence_reason, created_at
                 FROM query_sessions WHERE id = ?1",
                params![session_id.to_string()],
                Self::row_to_session,
            )
            .optional()
        })
    }

    /// Update the lifecycle status of a session.
    pub fn update_status(&self, session_id: &Uuid, status: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE query_sessions SET status = ?2 WHERE id = ?1",
                params![session_id.to_string(), status],
            )?;
            Ok(())
        })
    }

    /// Move a session to a terminal status with its final confidence.
    pub fn update_final_status(
        &self,
        session_id: &Uuid,
        status: &str,
        confidence_level: &str,
        confidence_reason: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE query_sessions
                 SET status = ?2, final_confidence_level = ?3, final_confidence_reason = ?4
                 WHERE id = ?1",
                params![
                    session_id.to_string(),
                    status,
                    confidence_level,
                    confidence_reason,
                ],
            )?;
            Ok(())
        })
    }

    /// Delete a session; audit rows cascade.
    pub fn delete_session(&self, session_id: &Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let rows = conn.execute(
                "DELETE FROM query_sessions WHERE id = ?1",
                params![session_id.to_string()],
            )?;
            Ok(rows > 0)
        })
    }

    // ==================== Planner traces ====================

    #[allow(clippy::too_many_arguments)]
    pub fn log_trace(
        &self,
        session_id: &Uuid,
        attempt_number: u32,
        planner_state: &str,
        verification_decision: &str,
        strategy_used: &str,
        num_docs: u32,
        stop_reason: Option<&str>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO planner_traces (
                    id, session_id, attempt_number, planner_state,
                    verification_decision, strategy_used, num_docs, stop_reason, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    Uuid::new_v4().to_string(),
                    session_id.to_string(),
                    attempt_number,
                    planner_state,
                    verification_decision,
                    strategy_used,
                    num_docs,
                    stop_reason,
                    Utc::now().to_rfc3339(),
                ],
            )?;
            Ok(())
        })
    }

    pub fn list_traces(&self, session_id: &Uuid) -> Result<Vec<PlannerTraceRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, session_id, attempt_number, planner_state,
                        verification_decision, strategy_used, num_docs, stop_reason, created_at
                 FROM planner_traces WHERE session_id = ?1
                 ORDER BY attempt_number ASC, rowid ASC",
            )?;
            let rows = stmt
                .query_map(params![session_id.to_string()], Self::row_to_trace)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    // ==================== Search logs ====================

    pub fn log_search(
        &self,
        session_id: &Uuid,
        attempt_number: u32,
        query_used: &str,
        num_docs: u32,
        success: bool,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO search_logs (
                    id, session_id, attempt_number, query_used, num_docs, success, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    Uuid::new_v4().to_string(),
                    session_id.to_string(),
                    attempt_number,
                    query_used,
                    num_docs,
                    success as i32,
                    Utc::now().to_rfc3339(),
                ],
            )?;
            Ok(())
        })
    }

    pub fn list_searches(&self, session_id: &Uuid) -> Result<Vec<SearchLogRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, session_id, attempt_number, query_used, num_docs, success, created_at
                 FROM search_logs WHERE session_id = ?1
                 ORDER BY attempt_number ASC, rowid ASC",
            )?;
            let rows = stmt
                .query_map(params![session_id.to_string()], Self::row_to_search)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    // ==================== Answers ====================

    pub fn create_answer(
        &self,
        session_id: &Uuid,
        answer_text: &str,
        confidence_level: &str,
        confidence_reason: &str,
        notes: Option<&str>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO answer_snapshots (
                    id, session_id, answer_text, confidence_level,
                    confidence_reason, notes, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    Uuid::new_v4().to_string(),
                    session_id.to_string(),
                    answer_text,
                    confidence_level,
                    confidence_reason,
                    notes,
                    Utc::now().to_rfc3339(),
                ],
            )?;
            Ok(())
        })
    }

    /// Latest snapshot for a session, if any.
    pub fn latest_answer(&self, session_id: &Uuid) -> Result<Option<AnswerSnapshotRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, session_id, answer_text, confidence_level,
                        confidence_reason, notes, created_at
                 FROM answer_snapshots WHERE session_id = ?1
                 ORDER BY rowid DESC LIMIT 1",
                params![session_id.to_string()],
                Self::row_to_answer,
            )
            .optional()
        })
    }

    // ==================== Evidence ====================

    /// Persist verified claims verbatim: claim text and source lists
    /// are copied exactly as the verifier produced them.
    pub fn insert_evidence(&self, session_id: &Uuid, claims: &[VerifiedClaim]) -> Result<()> {
        if claims.is_empty() {
            return Ok(());
        }

        // Serialize before taking the lock so a bad row can't poison it.
        let mut rows = Vec::with_capacity(claims.len());
        for claim in claims {
            rows.push((
                Uuid::new_v4().to_string(),
                claim.claim.clone(),
                claim.status.to_string(),
                serde_json::to_string(&claim.sources)?,
            ));
        }

        self.with_conn(|conn| {
            for (id, claim_text, status, sources_json) in &rows {
                conn.execute(
                    "INSERT INTO evidence (
                        id, session_id, claim_text, verification_status, source_urls
                    ) VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![id, session_id.to_string(), claim_text, status, sources_json],
                )?;
            }
            Ok(())
        })
    }

    pub fn list_evidence(&self, session_id: &Uuid) -> Result<Vec<EvidenceRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, session_id, claim_text, verification_status, source_urls
                 FROM evidence WHERE session_id = ?1 ORDER BY rowid ASC",
            )?;
            let rows = stmt
                .query_map(params![session_id.to_string()], Self::row_to_evidence)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    // ==================== Query cache ====================

    /// Valid cache entry for a fingerprint: `expires_at > now`, strictly.
    pub fn cache_get_valid(
        &self,
        query_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<QueryCacheRow>> {
        let row = self.with_conn(|conn| {
            conn.query_row(
                "SELECT query_hash, session_id, expires_at
                 FROM query_cache WHERE query_hash = ?1",
                params![query_hash],
                Self::row_to_cache,
            )
            .optional()
        })?;

        Ok(row.filter(|r| r.expires_at > now))
    }

    /// Upsert a cache entry; last writer wins on fingerprint conflict.
    pub fn cache_store(
        &self,
        query_hash: &str,
        session_id: &Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO query_cache (query_hash, session_id, expires_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(query_hash) DO UPDATE SET
                     session_id = excluded.session_id,
                     expires_at = excluded.expires_at",
                params![query_hash, session_id.to_string(), expires_at.to_rfc3339()],
            )?;
            Ok(())
        })
    }

    // ==================== Row mappers ====================

    fn parse_uuid(value: String) -> rusqlite::Result<Uuid> {
        Uuid::parse_str(&value).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
    }

    fn parse_timestamp(value: String) -> rusqlite::Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })
    }

    fn row_to_session(row: &rusqlite::Row) -> rusqlite::Result<QuerySessionRow> {
        Ok(QuerySessionRow {
            id: Self::parse_uuid(row.get(0)?)?,
            question: row.get(1)?,
            status: row.get(2)?,
            final_confidence_level: row.get(3)?,
            final_confidence_reason: row.get(4)?,
            created_at: Self::parse_timestamp(row.get(5)?)?,
        })
    }

    fn row_to_cache(row: &rusqlite::Row) -> rusqlite::Result<QueryCacheRow> {
        Ok(QueryCacheRow {
            query_hash: row.get(0)?,
            session_id: Self::parse_uuid(row.get(1)?)?,
            expires_at: Self::parse_timestamp(row.get(2)?)?,
        })
    }

    fn row_to_trace(row: &rusqlite::Row) -> rusqlite::Result<PlannerTraceRow> {
        Ok(PlannerTraceRow {
            id: Self::parse_uuid(row.get(0)?)?,
            session_id: Self::parse_uuid(row.get(1)?)?,
            attempt_number: row.get(2)?,
            planner_state: row.get(3)?,
            verification_decision: row.get(4)?,
            strategy_used: row.get(5)?,
            num_docs: row.get(6)?,
            stop_reason: row.get(7)?,
            created_at: Self::parse_timestamp(row.get(8)?)?,
        })
    }

    fn row_to_search(row: &rusqlite::Row) -> rusqlite::Result<SearchLogRow> {
        Ok(SearchLogRow {
            id: Self::parse_uuid(row.get(0)?)?,
            session_id: Self::parse_uuid(row.get(1)?)?,
            attempt_number: row.get(2)?,
            query_used: row.get(3)?,
            num_docs: row.get(4)?,
            success: row.get::<_, i32>(5)? != 0,
            created_at: Self::parse_timestamp(row.get(6)?)?,
        })
    }

    fn row_to_answer(row: &rusqlite::Row) -> rusqlite::Result<AnswerSnapshotRow> {
        Ok(AnswerSnapshotRow {
            id: Self::parse_uuid(row.get(0)?)?,
            session_id: Self::parse_uuid(row.get(1)?)?,
            answer_text: row.get(2)?,
            confidence_level: row.get(3)?,
            confidence_reason: row.get(4)?,
            notes: row.get(5)?,
            created_at: Self::parse_timestamp(row.get(6)?)?,
        })
    }

    fn row_to_evidence(row: &rusqlite::Row) -> rusqlite::Result<EvidenceRow> {
        let sources_json: String = row.get(4)?;
        let source_urls: Vec<String> = serde_json::from_str(&sources_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(EvidenceRow {
            id: Self::parse_uuid(row.get(0)?)?,
            session_id: Self::parse_uuid(row.get(1)?)?,
            claim_text: row.get(2)?,
            verification_status: row.get(3)?,
            source_urls,
        })
    }

    /// Run raw SQL against the store. Test-only: used to simulate
    /// backend faults (dropped tables) in API tests.
    #[cfg(test)]
    pub fn execute_raw(&self, sql: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute_batch(sql)?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verification::types::VerificationStatus;
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    fn store() -> SqliteStore {
        SqliteStore::in_memory().unwrap()
    }

    fn verified(claim: &str, sources: &[&str]) -> VerifiedClaim {
        VerifiedClaim {
            claim: claim.to_string(),
            sources: sources.iter().map(|s| s.to_string()).collect(),
            status: VerificationStatus::Agreement,
        }
    }

    #[test]
    fn test_session_lifecycle() {
        let store = store();
        let session = store.create_session("What is ONDC?").unwrap();
        assert_eq!(session.status, "INIT");

        store.update_status(&session.id, "RESEARCH").unwrap();
        let loaded = store.get_session(&session.id).unwrap().unwrap();
        assert_eq!(loaded.status, "RESEARCH");
        assert_eq!(loaded.question, "What is ONDC?");

        store
            .update_final_status(&session.id, "DONE", "HIGH", "Strong agreement")
            .unwrap();
        let loaded = store.get_session(&session.id).unwrap().unwrap();
        assert!(loaded.is_terminal());
        assert_eq!(loaded.final_confidence_level.as_deref(), Some("HIGH"));
    }

    #[test]
    fn test_unknown_session_is_none() {
        assert!(store().get_session(&Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_traces_ordered_by_attempt() {
        let store = store();
        let session = store.create_session("q").unwrap();

        for attempt in 1..=3u32 {
            store
                .log_trace(&session.id, attempt, "VERIFY", "RETRY", "BASE", 5, Some("r"))
                .unwrap();
        }

        let traces = store.list_traces(&session.id).unwrap();
        let attempts: Vec<u32> = traces.iter().map(|t| t.attempt_number).collect();
        assert_eq!(attempts, vec![1, 2, 3]);
        assert!(traces.iter().all(|t| t.planner_state == "VERIFY"));
    }

    #[test]
    fn test_search_log_round_trip() {
        let store = store();
        let session = store.create_session("q").unwrap();
        store
            .log_search(&session.id, 1, "q explanation overview", 10, true)
            .unwrap();

        let logs = store.list_searches(&session.id).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].query_used, "q explanation overview");
        assert!(logs[0].success);
    }

    #[test]
    fn test_latest_answer_wins() {
        let store = store();
        let session = store.create_session("q").unwrap();
        store
            .create_answer(&session.id, "first", "LOW", "r1", None)
            .unwrap();
        store
            .create_answer(&session.id, "second", "HIGH", "r2", Some("n"))
            .unwrap();

        let latest = store.latest_answer(&session.id).unwrap().unwrap();
        assert_eq!(latest.answer_text, "second");
        assert_eq!(latest.notes.as_deref(), Some("n"));
    }

    #[test]
    fn test_evidence_verbatim_round_trip() {
        let store = store();
        let session = store.create_session("q").unwrap();
        let claims = vec![verified(
            "Paris is the capital of France",
            &["https://a", "https://b"],
        )];

        store.insert_evidence(&session.id, &claims).unwrap();
        let rows = store.list_evidence(&session.id).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].claim_text, "Paris is the capital of France");
        assert_eq!(rows[0].verification_status, "AGREEMENT");
        assert_eq!(rows[0].source_urls, vec!["https://a", "https://b"]);
    }

    #[test]
    fn test_cache_strict_expiry() {
        let store = store();
        let session = store.create_session("q").unwrap();
        let now = Utc::now();

        // expires_at == now is a miss; strictly greater is a hit.
        store.cache_store("hash", &session.id, now).unwrap();
        assert!(store.cache_get_valid("hash", now).unwrap().is_none());

        store
            .cache_store("hash", &session.id, now + Duration::seconds(1))
            .unwrap();
        assert!(store.cache_get_valid("hash", now).unwrap().is_some());
    }

    #[test]
    fn test_cache_upsert_last_writer_wins() {
        let store = store();
        let first = store.create_session("q1").unwrap();
        let second = store.create_session("q2").unwrap();
        let expiry = Utc::now() + Duration::hours(1);

        store.cache_store("hash", &first.id, expiry).unwrap();
        store.cache_store("hash", &second.id, expiry).unwrap();

        let entry = store.cache_get_valid("hash", Utc::now()).unwrap().unwrap();
        assert_eq!(entry.session_id, second.id);
    }

    #[test]
    fn test_cascade_delete() {
        let store = store();
        let session = store.create_session("q").unwrap();
        store
            .log_trace(&session.id, 1, "VERIFY", "ACCEPT", "BASE", 5, None)
            .unwrap();
        store
            .insert_evidence(&session.id, &[verified("c", &["https://a"])])
            .unwrap();
        store
            .create_answer(&session.id, "a", "HIGH", "r", None)
            .unwrap();
        store
            .cache_store("h", &session.id, Utc::now() + Duration::hours(1))
            .unwrap();

        assert!(store.delete_session(&session.id).unwrap());
        assert!(store.list_traces(&session.id).unwrap().is_empty());
        assert!(store.list_evidence(&session.id).unwrap().is_empty());
        assert!(store.latest_answer(&session.id).unwrap().is_none());
        assert!(store.cache_get_valid("h", Utc::now()).unwrap().is_none());
    }
}
