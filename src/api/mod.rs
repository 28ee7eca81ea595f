//! API Module
//!
//! HTTP handlers and routing for the maintenance service API.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /status/tasks` - Background task status snapshot
//! - `POST /maintenance/cleanup` - Run stale-record cleanup now
//! - `POST /maintenance/backup` - Run a backup now

pub mod handlers;
pub mod routes;

pub use handlers::AppState;
pub use routes::create_router;
