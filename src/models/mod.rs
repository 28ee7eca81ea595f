//! Response models for the maintenance service API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing HTTP response bodies and status snapshots.

pub mod responses;

// Re-export commonly used types
pub use responses::{
    BackupResponse, CleanupResponse, ErrorResponse, HealthResponse, TaskStatusEntry,
};
