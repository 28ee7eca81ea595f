//! Stale Record Cleanup
//!
//! Retires old image records to bound storage growth: analyzed records past
//! a day-based retention window, unanalyzed records past a shorter
//! hour-based one. Safe to run redundantly; records already gone at delete
//! time count as nothing to do.

use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::Result;
use crate::records::RecordStore;

// == Cleanup Policy ==
/// Retention windows for the two cleanup passes.
#[derive(Debug, Clone)]
pub struct CleanupPolicy {
    /// Age in days after which analyzed records are deleted
    pub max_age_days: i64,
    /// Age in hours after which unanalyzed records are deleted
    pub unanalyzed_max_age_hours: i64,
    /// Restrict the age-based pass to analyzed records
    pub analyzed_only: bool,
}

impl Default for CleanupPolicy {
    fn default() -> Self {
        Self {
            max_age_days: 7,
            unanalyzed_max_age_hours: 24,
            analyzed_only: true,
        }
    }
}

// == Cleanup Outcome ==
/// Deletion counts of one cleanup run.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CleanupOutcome {
    /// Records deleted by the age-based pass
    pub aged_deleted: usize,
    /// Records deleted by the unanalyzed pass
    pub unanalyzed_deleted: usize,
}

impl CleanupOutcome {
    /// Total records deleted by this run.
    pub fn total(&self) -> usize {
        self.aged_deleted + self.unanalyzed_deleted
    }
}

// == Run Cleanup ==
/// Executes both cleanup passes against the record store.
///
/// The scheduled runner and the request-path trigger may run this
/// concurrently over the same records; the select-then-delete race resolves
/// through `RecordStore::delete` treating an absent record as a no-op, so a
/// record is only ever counted by whichever caller actually removed it.
pub fn run_cleanup(records: &RecordStore, policy: &CleanupPolicy) -> Result<CleanupOutcome> {
    let now = Utc::now();

    // Age-based pass
    let aged_cutoff = now - Duration::days(policy.max_age_days);
    let mut aged_deleted = 0;
    for id in records.stale_records(aged_cutoff, policy.analyzed_only) {
        if records.delete(id) {
            aged_deleted += 1;
        }
    }

    // Unanalyzed pass: uploads that never got a result
    let unanalyzed_cutoff = now - Duration::hours(policy.unanalyzed_max_age_hours);
    let mut unanalyzed_deleted = 0;
    for id in records.stale_unanalyzed(unanalyzed_cutoff) {
        if records.delete(id) {
            unanalyzed_deleted += 1;
        }
    }

    let outcome = CleanupOutcome {
        aged_deleted,
        unanalyzed_deleted,
    };

    if outcome.total() > 0 {
        info!(
            aged = aged_deleted,
            unanalyzed = unanalyzed_deleted,
            max_age_days = policy.max_age_days,
            unanalyzed_max_age_hours = policy.unanalyzed_max_age_hours,
            "cleanup removed stale records"
        );
    } else {
        debug!("cleanup found no stale records");
    }

    Ok(outcome)
}
