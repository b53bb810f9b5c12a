//! Session persistence and audit storage.
//!
//! One SQLite database holds sessions, planner traces, search logs,
//! evidence, answer snapshots, and the query cache. Audit rows carry
//! decisions and metadata only; prompt text and raw oracle output are
//! never written.

pub mod models;
pub mod schema;
pub mod store;

pub use models::{
    AnswerSnapshotRow, EvidenceRow, PlannerTraceRow, QueryCacheRow, QuerySessionRow, SearchLogRow,
};
pub use store::SqliteStore;
