//! Records Module
//!
//! Image upload records and the in-process record store the maintenance
//! tasks operate on.

mod record;
mod store;

// Re-export public types
pub use record::{Analysis, ImageRecord, Scorer, Verdict};
pub use store::RecordStore;
