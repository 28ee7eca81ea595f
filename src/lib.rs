//! Realface - maintenance core for an AI-image detection service
//!
//! Provides the background task lifecycle: periodic cleanup of stale image
//! records, timestamped database/media backups, and per-task status reporting
//! backed by a shared expiring key-value store.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod records;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use tasks::TaskCoordinator;
