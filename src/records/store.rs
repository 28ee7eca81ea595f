//! Record Store Module
//!
//! In-process store of image records, shared between request handlers and
//! the maintenance tasks. Deleting a record also removes its stored file,
//! best-effort.

use std::collections::BTreeMap;
use std::fs;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::Result;
use crate::records::{Analysis, ImageRecord, Scorer};

#[derive(Debug, Default)]
struct Inner {
    records: BTreeMap<u64, ImageRecord>,
    next_id: u64,
}

// == Record Store ==
/// Thread-safe store of image records keyed by id.
///
/// Cloning is cheap; all clones share the same record set. The stale-record
/// queries and `delete` are the surface the cleanup work runs against, and
/// both the scheduled runner and the request-path trigger may call them
/// concurrently: a record that is selected by one caller and deleted by the
/// other simply reads as already gone.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    inner: Arc<Mutex<Inner>>,
}

impl RecordStore {
    // == Constructor ==
    /// Creates a new, empty record store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    // == Insert ==
    /// Inserts a record, assigning and returning its id.
    pub fn insert(&self, mut record: ImageRecord) -> u64 {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        record.id = id;
        inner.records.insert(id, record);
        id
    }

    // == Get ==
    /// Returns a copy of the record with the given id, if present.
    pub fn get(&self, id: u64) -> Option<ImageRecord> {
        self.lock().records.get(&id).cloned()
    }

    // == Analyze ==
    /// Runs the scorer against a stored record and attaches the outcome.
    ///
    /// Returns `Ok(None)` if the record has been deleted in the meantime.
    pub fn analyze(&self, id: u64, scorer: &dyn Scorer) -> Result<Option<Analysis>> {
        let path = match self.get(id) {
            Some(record) => record.file_path,
            None => return Ok(None),
        };
        let analysis = Analysis::from_score(scorer.score(&path)?);

        let mut inner = self.lock();
        if let Some(record) = inner.records.get_mut(&id) {
            record.analysis = Some(analysis);
            Ok(Some(analysis))
        } else {
            // Deleted while the scorer ran
            Ok(None)
        }
    }

    // == Stale Queries ==
    /// Ids of records uploaded before `cutoff`.
    ///
    /// With `analyzed_only` set, only records carrying an analysis are
    /// selected.
    pub fn stale_records(&self, cutoff: DateTime<Utc>, analyzed_only: bool) -> Vec<u64> {
        self.lock()
            .records
            .values()
            .filter(|r| r.uploaded_at < cutoff)
            .filter(|r| !analyzed_only || r.is_analyzed())
            .map(|r| r.id)
            .collect()
    }

    /// Ids of unanalyzed records uploaded before `cutoff`.
    pub fn stale_unanalyzed(&self, cutoff: DateTime<Utc>) -> Vec<u64> {
        self.lock()
            .records
            .values()
            .filter(|r| r.uploaded_at < cutoff && !r.is_analyzed())
            .map(|r| r.id)
            .collect()
    }

    // == Delete ==
    /// Removes a record and attempts to remove its stored file.
    ///
    /// Returns `false` if the record was already gone; that is a normal
    /// outcome under concurrent cleanup, not an error. A failed file removal
    /// never blocks record deletion.
    pub fn delete(&self, id: u64) -> bool {
        let removed = self.lock().records.remove(&id);
        match removed {
            Some(record) => {
                if let Err(e) = fs::remove_file(&record.file_path) {
                    debug!(
                        id,
                        path = %record.file_path.display(),
                        "could not remove stored file: {e}"
                    );
                }
                true
            }
            None => false,
        }
    }

    // == Snapshot ==
    /// Returns all records ordered by id, for export.
    pub fn snapshot(&self) -> Vec<ImageRecord> {
        self.lock().records.values().cloned().collect()
    }

    // == Length ==
    /// Returns the number of tracked records.
    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    /// Returns true if no records are tracked.
    pub fn is_empty(&self) -> bool {
        self.lock().records.is_empty()
    }
}
