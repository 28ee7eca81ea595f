//! Response DTOs for the maintenance service API
//!
//! Defines the structure of outgoing HTTP response bodies.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::tasks::cleanup::CleanupOutcome;

/// Status snapshot of one background task.
///
/// Every field except `running` may be null, meaning the task has not run
/// within the status retention window (or never). Callers treat null as
/// "unknown", not as a failure.
#[derive(Debug, Clone, Serialize)]
pub struct TaskStatusEntry {
    /// Whether the task is currently executing
    pub running: bool,
    /// When the task last started
    pub last_run: Option<DateTime<Utc>>,
    /// Outcome of the last completed run
    pub last_status: Option<bool>,
    /// Error message of the last failed run
    pub last_error: Option<String>,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "ok")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    /// Number of image records currently tracked
    pub records_tracked: usize,
    /// Whether the media directory exists
    pub media_root_exists: bool,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn ok(records_tracked: usize, media_root_exists: bool) -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            records_tracked,
            media_root_exists,
        }
    }
}

/// Response body for a manual cleanup run (POST /maintenance/cleanup)
#[derive(Debug, Clone, Serialize)]
pub struct CleanupResponse {
    /// Summary message
    pub message: String,
    /// Records deleted by the age-based pass
    pub aged_deleted: usize,
    /// Records deleted by the unanalyzed pass
    pub unanalyzed_deleted: usize,
}

impl CleanupResponse {
    /// Creates a new CleanupResponse from a cleanup outcome
    pub fn new(outcome: CleanupOutcome) -> Self {
        Self {
            message: format!("Deleted {} stale records", outcome.total()),
            aged_deleted: outcome.aged_deleted,
            unanalyzed_deleted: outcome.unanalyzed_deleted,
        }
    }
}

/// Response body for a manual backup run (POST /maintenance/backup)
#[derive(Debug, Clone, Serialize)]
pub struct BackupResponse {
    /// Summary message
    pub message: String,
    /// Path of the database export
    pub database_file: String,
    /// Whether media files were copied
    pub media_backed_up: bool,
    /// Old backups removed by the retention pass
    pub pruned: usize,
}

impl BackupResponse {
    /// Creates a new BackupResponse from a backup report
    pub fn new(report: &crate::tasks::backup::BackupReport) -> Self {
        Self {
            message: "Backup completed".to_string(),
            database_file: report.database_file.display().to_string(),
            media_backed_up: report.media_dir.is_some(),
            pruned: report.pruned,
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
