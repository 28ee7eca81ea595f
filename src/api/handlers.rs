//! API Handlers
//!
//! HTTP request handlers for each maintenance service endpoint.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{extract::State, Json};

use crate::config::Config;
use crate::error::Result;
use crate::models::{BackupResponse, CleanupResponse, HealthResponse, TaskStatusEntry};
use crate::records::RecordStore;
use crate::store::ExpiringStore;
use crate::tasks::backup::run_backup;
use crate::tasks::cleanup::run_cleanup;
use crate::tasks::coordinator::TaskCoordinator;

/// Application state shared across all handlers.
///
/// Holds the shared stores and the task coordinator; everything inside is
/// reference-counted, so cloning the state per request is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration
    pub config: Config,
    /// Shared status substrate
    pub status_store: ExpiringStore,
    /// Image record store
    pub records: RecordStore,
    /// Background task lifecycle owner
    pub coordinator: Arc<TaskCoordinator>,
}

impl AppState {
    /// Creates application state with fresh stores from configuration.
    ///
    /// The coordinator is constructed but not started; startup calls
    /// `coordinator.start()` once the process is ready to serve.
    pub fn new(config: Config) -> Self {
        let status_store = ExpiringStore::new();
        let records = RecordStore::new();
        let coordinator =
            TaskCoordinator::new(status_store.clone(), records.clone(), config.clone());
        Self {
            config,
            status_store,
            records,
            coordinator,
        }
    }
}

/// Handler for GET /health
///
/// Returns service liveness plus a small storage summary.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::ok(
        state.records.len(),
        state.config.media_root.is_dir(),
    ))
}

/// Handler for GET /status/tasks
///
/// Returns the coordinator's aggregate status snapshot, keyed by task name.
pub async fn tasks_status_handler(
    State(state): State<AppState>,
) -> Json<BTreeMap<String, TaskStatusEntry>> {
    Json(state.coordinator.status())
}

/// Handler for POST /maintenance/cleanup
///
/// Runs the stale-record cleanup immediately, outside the scheduled
/// cadence. Safe to invoke while the scheduled runner is active.
pub async fn run_cleanup_handler(State(state): State<AppState>) -> Result<Json<CleanupResponse>> {
    let outcome = run_cleanup(&state.records, &state.config.cleanup_policy())?;
    Ok(Json(CleanupResponse::new(outcome)))
}

/// Handler for POST /maintenance/backup
///
/// Runs a full backup immediately, outside the scheduled cadence.
pub async fn run_backup_handler(State(state): State<AppState>) -> Result<Json<BackupResponse>> {
    let report = run_backup(&state.records, &state.config.backup_policy())?;
    Ok(Json(BackupResponse::new(&report)))
}
