//! Error types for the maintenance service
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Detector Error Enum ==
/// Unified error type for the maintenance service.
#[derive(Error, Debug)]
pub enum DetectorError {
    /// Filesystem operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding/decoding failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A backup run failed as a unit
    #[error("backup failed: {0}")]
    Backup(String),

    /// Internal service error
    #[error("internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for DetectorError {
    fn into_response(self) -> Response {
        // Maintenance failures are operational, not client errors
        let status = StatusCode::INTERNAL_SERVER_ERROR;

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the maintenance service.
pub type Result<T> = std::result::Result<T, DetectorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DetectorError::Backup("media copy failed".to_string());
        assert_eq!(err.to_string(), "backup failed: media copy failed");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: DetectorError = io.into();
        assert!(matches!(err, DetectorError::Io(_)));
    }
}
