//! API Routes
//!
//! Configures the Axum router with all maintenance service endpoints and
//! the request-path maintenance layer.

use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    health_handler, run_backup_handler, run_cleanup_handler, tasks_status_handler, AppState,
};
use crate::tasks::maintenance;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Health check endpoint
/// - `GET /status/tasks` - Background task status snapshot
/// - `POST /maintenance/cleanup` - Run stale-record cleanup now
/// - `POST /maintenance/backup` - Run a backup now
///
/// # Middleware
/// - Maintenance: probability-gated inline cleanup on eligible requests
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router with all endpoints
    Router::new()
        .route("/health", get(health_handler))
        .route("/status/tasks", get(tasks_status_handler))
        .route("/maintenance/cleanup", post(run_cleanup_handler))
        .route("/maintenance/backup", post(run_backup_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            maintenance_layer,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Gives a small fraction of ordinary requests a chance to run cleanup
/// inline before their handler executes. Static and media asset paths are
/// excluded, and the request proceeds unchanged whether or not cleanup ran.
async fn maintenance_layer(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if maintenance::is_eligible_path(request.uri().path()) {
        maintenance::maybe_run_inline_cleanup(
            &state.records,
            state.coordinator.cleanup_tracker(),
            &state.config.cleanup_policy(),
            &state.config.inline_maintenance_policy(),
        );
    }
    next.run(request).await
}
