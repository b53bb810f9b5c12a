//! HTTP API surface.
//!
//! Four endpoints: submit, status, result, trace. Submit returns
//! immediately and schedules the pipeline on a background task; status
//! and result are pure database reads; trace is gated by the internal
//! token when one is configured.

pub mod error;
pub mod routes;
pub mod schemas;

pub use error::ApiError;
pub use routes::{router, AppState};
