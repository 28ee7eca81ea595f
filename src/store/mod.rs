//! Expiring Store Module
//!
//! Process-wide key-value store with per-key TTL expiration, used as the
//! substrate for background task status.

mod entry;
mod kv;


// Re-export public types
pub use entry::StoreEntry;
pub use kv::ExpiringStore;
