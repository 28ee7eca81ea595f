//! Expiring Key-Value Store
//!
//! Shared status substrate combining HashMap storage with per-key TTL
//! expiration. Absence of a key (never set, expired, or deleted) is a valid
//! state meaning "unknown" and is never reported as an error.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde_json::Value;

use crate::store::StoreEntry;

// == Expiring Store ==
/// Thread-safe key-value store where every entry carries a TTL.
///
/// Cloning is cheap and all clones share the same underlying map, so one
/// store instance can serve every task runner and status reader in the
/// process. Per-key operations are atomic.
#[derive(Debug, Clone, Default)]
pub struct ExpiringStore {
    entries: Arc<Mutex<HashMap<String, StoreEntry>>>,
}

impl ExpiringStore {
    // == Constructor ==
    /// Creates a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, StoreEntry>> {
        // Status bookkeeping must never panic; a poisoned lock still
        // yields usable state.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    // == Set ==
    /// Stores a value under `key`, expiring `ttl` from now.
    ///
    /// An existing entry is overwritten and its TTL reset.
    pub fn set(&self, key: impl Into<String>, value: Value, ttl: Duration) {
        self.lock().insert(key.into(), StoreEntry::new(value, ttl));
    }

    // == Get ==
    /// Retrieves the value for `key`, or `None` if absent or expired.
    ///
    /// Expired entries are removed on read.
    pub fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.is_expired() => {
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }

    // == Delete ==
    /// Removes `key` from the store. Deleting an absent key is a no-op.
    pub fn delete(&self, key: &str) {
        self.lock().remove(key);
    }

    // == Cleanup Expired ==
    /// Removes all expired entries, returning how many were dropped.
    pub fn cleanup_expired(&self) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        before - entries.len()
    }

    // == Length ==
    /// Returns the current number of entries, including not-yet-collected
    /// expired ones.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    // == Is Empty ==
    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::thread::sleep;

    const LONG_TTL: Duration = Duration::from_secs(300);

    #[test]
    fn test_store_set_and_get() {
        let store = ExpiringStore::new();

        store.set("key1", json!("value1"), LONG_TTL);

        assert_eq!(store.get("key1"), Some(json!("value1")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_absent_is_none() {
        let store = ExpiringStore::new();
        assert_eq!(store.get("nonexistent"), None);
    }

    #[test]
    fn test_store_overwrite_resets_value() {
        let store = ExpiringStore::new();

        store.set("key1", json!(1), LONG_TTL);
        store.set("key1", json!(2), LONG_TTL);

        assert_eq!(store.get("key1"), Some(json!(2)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_delete_is_idempotent() {
        let store = ExpiringStore::new();

        store.set("key1", json!(true), LONG_TTL);
        store.delete("key1");
        store.delete("key1"); // Second delete must be a silent no-op

        assert_eq!(store.get("key1"), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_ttl_expiration_reads_as_absent() {
        let store = ExpiringStore::new();

        store.set("key1", json!("value1"), Duration::from_millis(50));
        assert!(store.get("key1").is_some());

        sleep(Duration::from_millis(80));
        assert_eq!(store.get("key1"), None);
        // The expired entry was collected by the read
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_cleanup_expired() {
        let store = ExpiringStore::new();

        store.set("short", json!(1), Duration::from_millis(50));
        store.set("long", json!(2), LONG_TTL);

        sleep(Duration::from_millis(80));

        let removed = store.cleanup_expired();
        assert_eq!(removed, 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("long"), Some(json!(2)));
    }

    #[test]
    fn test_store_clones_share_state() {
        let store = ExpiringStore::new();
        let alias = store.clone();

        store.set("shared", json!("yes"), LONG_TTL);

        assert_eq!(alias.get("shared"), Some(json!("yes")));
    }
}
