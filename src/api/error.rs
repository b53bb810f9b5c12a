//! Central error-to-status adapter for the API.
//!
//! Handlers return `Result<Json<T>, ApiError>`; this is the single
//! place where error kinds become status codes and JSON bodies.
//! Backend faults surface as a fixed generic detail string so nothing
//! about the storage layer (SQL, paths, drivers) leaks to callers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::Error;

/// Fixed 503 detail; intentionally free of any backend specifics.
const UNAVAILABLE_DETAIL: &str = "Database temporarily unavailable. Please retry later.";

/// API-boundary error kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Unknown or syntactically invalid resource id
    NotFound(String),
    /// Request body failed validation
    Unprocessable(String),
    /// Resource exists but is not in a terminal state yet
    NotReady(String),
    /// Trace token missing or wrong
    Forbidden,
    /// Storage backend fault
    Unavailable,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotReady(_) => StatusCode::CONFLICT,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn detail(&self) -> &str {
        match self {
            Self::NotFound(detail) | Self::Unprocessable(detail) | Self::NotReady(detail) => detail,
            Self::Forbidden => "Forbidden",
            Self::Unavailable => UNAVAILABLE_DETAIL,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "detail": self.detail() }))).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        // Handlers only touch the store; anything that bubbles up here
        // is an infrastructure fault. Log the kind, not the content.
        tracing::warn!(error = %e, "storage fault at API boundary");
        Self::Unavailable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::NotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Unprocessable("x".into()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(ApiError::NotReady("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::Unavailable.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_unavailable_detail_leaks_nothing() {
        let detail = ApiError::Unavailable.detail();
        for fragment in ["INSERT", "SELECT", "sqlite", "Traceback", "://", "/"] {
            assert!(!detail.contains(fragment), "detail leaked {:?}", fragment);
        }
    }

    #[test]
    fn test_storage_error_maps_to_unavailable() {
        let api_error: ApiError = Error::storage("no such table: query_sessions").into();
        assert_eq!(api_error, ApiError::Unavailable);
    }
}
