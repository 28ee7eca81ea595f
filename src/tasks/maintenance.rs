//! Request-Path Maintenance Trigger
//!
//! A secondary, opportunistic path to the same cleanup effect: a small
//! fraction of ordinary requests runs the stale-record cleanup inline, so
//! storage stays bounded even on deployments where the scheduled runner is
//! not active. The gate is a dead-man's-switch: a recent scheduled run
//! suppresses the inline path entirely.

use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::{thread_rng, Rng};
use tracing::{info, warn};

use crate::records::RecordStore;
use crate::tasks::cleanup::{run_cleanup, CleanupOutcome, CleanupPolicy};
use crate::tasks::status::TaskStatusTracker;

// == Inline Maintenance Policy ==
/// Gate parameters for the request-path trigger.
#[derive(Debug, Clone)]
pub struct InlineMaintenancePolicy {
    /// Probability of running cleanup on one eligible request
    pub probability: f64,
    /// How recent a scheduled run must be to count as "maintenance is
    /// alive" and suppress the inline path
    pub freshness: Duration,
}

impl Default for InlineMaintenancePolicy {
    fn default() -> Self {
        Self {
            probability: 0.01,
            freshness: Duration::from_secs(86_400),
        }
    }
}

// == Path Eligibility ==
/// Whether a request path participates in inline maintenance.
///
/// Static and media asset requests are excluded; they are high-volume and
/// latency-sensitive.
pub fn is_eligible_path(path: &str) -> bool {
    !path.starts_with("/static") && !path.starts_with("/media")
}

// == Inline Gate ==
/// Decides whether one request should run cleanup inline.
///
/// `roll` is a uniform draw from [0, 1); separating it from the RNG keeps
/// the gate deterministic under test.
pub fn should_run_inline(
    last_scheduled_run: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    policy: &InlineMaintenancePolicy,
    roll: f64,
) -> bool {
    if let Some(last) = last_scheduled_run {
        let age = now.signed_duration_since(last);
        if age
            .to_std()
            .map_or(true, |age| age < policy.freshness)
        {
            // Scheduled maintenance is alive (or the clock went backwards);
            // nothing for the inline path to do
            return false;
        }
    }
    roll < policy.probability
}

// == Maybe Run Inline Cleanup ==
/// Applies the gate for one request and runs cleanup when selected.
///
/// Reads the scheduled cleanup task's last-run time but never writes its
/// status; those fields belong to the runner. Racing the scheduled runner
/// over the same records is safe: the cleanup work treats already-deleted
/// records as done.
pub fn maybe_run_inline_cleanup(
    records: &RecordStore,
    scheduled_cleanup: &TaskStatusTracker,
    cleanup_policy: &CleanupPolicy,
    policy: &InlineMaintenancePolicy,
) -> Option<CleanupOutcome> {
    let roll = thread_rng().gen_range(0.0..1.0);
    if !should_run_inline(scheduled_cleanup.last_run(), Utc::now(), policy, roll) {
        return None;
    }

    info!("request-path maintenance selected, running cleanup inline");
    match run_cleanup(records, cleanup_policy) {
        Ok(outcome) => Some(outcome),
        Err(e) => {
            // Never surfaced to the request; operators see it in the logs
            warn!("inline cleanup failed: {e}");
            None
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{Analysis, ImageRecord};
    use crate::store::ExpiringStore;
    use chrono::Duration as ChronoDuration;

    fn policy(probability: f64) -> InlineMaintenancePolicy {
        InlineMaintenancePolicy {
            probability,
            freshness: Duration::from_secs(3600),
        }
    }

    #[test]
    fn test_gate_blocked_by_recent_scheduled_run() {
        let now = Utc::now();
        let recent = Some(now - ChronoDuration::minutes(5));
        assert!(!should_run_inline(recent, now, &policy(1.0), 0.0));
    }

    #[test]
    fn test_gate_open_when_scheduled_run_is_stale() {
        let now = Utc::now();
        let stale = Some(now - ChronoDuration::hours(2));
        assert!(should_run_inline(stale, now, &policy(1.0), 0.0));
    }

    #[test]
    fn test_gate_open_when_never_run() {
        assert!(should_run_inline(None, Utc::now(), &policy(1.0), 0.0));
    }

    #[test]
    fn test_gate_respects_probability() {
        let gate = policy(0.01);
        assert!(should_run_inline(None, Utc::now(), &gate, 0.005));
        assert!(!should_run_inline(None, Utc::now(), &gate, 0.02));
        // Probability zero never fires
        assert!(!should_run_inline(None, Utc::now(), &policy(0.0), 0.0));
    }

    #[test]
    fn test_gate_future_last_run_counts_as_recent() {
        let now = Utc::now();
        let future = Some(now + ChronoDuration::minutes(5));
        assert!(!should_run_inline(future, now, &policy(1.0), 0.0));
    }

    #[test]
    fn test_asset_paths_are_not_eligible() {
        assert!(is_eligible_path("/"));
        assert!(is_eligible_path("/health"));
        assert!(is_eligible_path("/status/tasks"));
        assert!(!is_eligible_path("/static/js/main.js"));
        assert!(!is_eligible_path("/media/uploads/abc.jpg"));
    }

    #[test]
    fn test_inline_cleanup_deletes_stale_records() {
        let records = RecordStore::new();
        let mut stale = ImageRecord::new("uploads/old.jpg", "old.jpg", 10);
        stale.uploaded_at = Utc::now() - ChronoDuration::days(10);
        stale.analysis = Some(Analysis::from_score(0.8));
        let id = records.insert(stale);

        let tracker = TaskStatusTracker::new(ExpiringStore::new(), "cleanup");
        let outcome = maybe_run_inline_cleanup(
            &records,
            &tracker,
            &CleanupPolicy::default(),
            &policy(1.0),
        )
        .expect("probability 1 with no scheduled run must fire");

        assert_eq!(outcome.aged_deleted, 1);
        assert!(records.get(id).is_none());
        // The scheduled task's status was only read, never written
        assert!(tracker.last_run().is_none());
        assert!(tracker.last_status().is_none());
    }

    #[test]
    fn test_inline_cleanup_suppressed_by_live_scheduler() {
        let records = RecordStore::new();
        let tracker = TaskStatusTracker::new(ExpiringStore::new(), "cleanup");
        tracker.start();
        tracker.complete(true, None);

        let skipped = maybe_run_inline_cleanup(
            &records,
            &tracker,
            &CleanupPolicy::default(),
            &policy(1.0),
        );
        assert!(skipped.is_none());
    }
}
