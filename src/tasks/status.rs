//! Task Status Tracker
//!
//! Publishes one task's running flag, last run time, and last outcome
//! through the shared expiring store, for external status reporting.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{error, info};

use crate::models::TaskStatusEntry;
use crate::store::ExpiringStore;

/// Safety-net TTL on the running flag. If the process dies mid-run without
/// ever calling `complete`, the flag expires instead of reporting a
/// phantom in-progress task forever.
const RUNNING_TTL: Duration = Duration::from_secs(3600);

/// TTL on last-run/last-outcome fields.
const RESULT_TTL: Duration = Duration::from_secs(86_400);

// == Task Status Tracker ==
/// Status bookkeeping for one named task.
///
/// All fields live in the shared expiring store under task-scoped keys, so
/// concurrent tasks never collide and any status reader in the process sees
/// the same snapshot. Writes belong to the owning runner; readers treat an
/// absent field as "never ran" rather than an error.
#[derive(Debug, Clone)]
pub struct TaskStatusTracker {
    store: ExpiringStore,
    task_name: String,
    key_running: String,
    key_last_run: String,
    key_last_status: String,
    key_error: String,
}

impl TaskStatusTracker {
    // == Constructor ==
    /// Creates a tracker for the task with the given name.
    pub fn new(store: ExpiringStore, task_name: impl Into<String>) -> Self {
        let task_name = task_name.into();
        Self {
            key_running: format!("task_running_{task_name}"),
            key_last_run: format!("last_run_{task_name}"),
            key_last_status: format!("last_status_{task_name}"),
            key_error: format!("last_error_{task_name}"),
            store,
            task_name,
        }
    }

    /// Name of the tracked task.
    pub fn task_name(&self) -> &str {
        &self.task_name
    }

    // == Start ==
    /// Marks the task as started: running flag up, last-run stamped, any
    /// previous error cleared.
    pub fn start(&self) {
        self.store.set(&*self.key_running, json!(true), RUNNING_TTL);
        self.store
            .set(&*self.key_last_run, json!(Utc::now()), RESULT_TTL);
        self.store.delete(&self.key_error);
        info!(task = %self.task_name, "task started");
    }

    // == Complete ==
    /// Marks the task as completed, recording the outcome.
    ///
    /// The error message, when given, is retained until the next `start`.
    pub fn complete(&self, success: bool, error: Option<String>) {
        self.store.delete(&self.key_running);
        self.store
            .set(&*self.key_last_status, json!(success), RESULT_TTL);
        match error {
            Some(message) => {
                error!(task = %self.task_name, "task failed: {message}");
                self.store.set(&*self.key_error, json!(message), RESULT_TTL);
            }
            None => info!(task = %self.task_name, "task completed successfully"),
        }
    }

    // == Snapshots ==
    /// Whether the task is currently running.
    pub fn is_running(&self) -> bool {
        self.store
            .get(&self.key_running)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    /// When the task last started, if known.
    pub fn last_run(&self) -> Option<DateTime<Utc>> {
        self.store
            .get(&self.key_last_run)
            .and_then(|v| serde_json::from_value(v).ok())
    }

    /// Outcome of the last completed run, if known.
    pub fn last_status(&self) -> Option<bool> {
        self.store
            .get(&self.key_last_status)
            .and_then(|v| v.as_bool())
    }

    /// Error message of the last failed run, if any.
    pub fn last_error(&self) -> Option<String> {
        self.store
            .get(&self.key_error)
            .and_then(|v| v.as_str().map(String::from))
    }

    /// Read-only snapshot of all status fields at this instant.
    pub fn snapshot(&self) -> TaskStatusEntry {
        TaskStatusEntry {
            running: self.is_running(),
            last_run: self.last_run(),
            last_status: self.last_status(),
            last_error: self.last_error(),
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    fn tracker() -> TaskStatusTracker {
        TaskStatusTracker::new(ExpiringStore::new(), "cleanup")
    }

    #[test]
    fn test_fresh_tracker_reads_as_never_run() {
        let tracker = tracker();
        assert!(!tracker.is_running());
        assert!(tracker.last_run().is_none());
        assert!(tracker.last_status().is_none());
        assert!(tracker.last_error().is_none());
    }

    #[test]
    fn test_running_strictly_between_start_and_complete() {
        let tracker = tracker();

        assert!(!tracker.is_running());
        tracker.start();
        assert!(tracker.is_running());
        tracker.complete(true, None);
        assert!(!tracker.is_running());
    }

    #[test]
    fn test_successful_completion_records_outcome() {
        let tracker = tracker();

        tracker.start();
        tracker.complete(true, None);

        assert_eq!(tracker.last_status(), Some(true));
        assert!(tracker.last_error().is_none());
        assert!(tracker.last_run().is_some());
    }

    #[test]
    fn test_failure_records_error_until_next_start() {
        let tracker = tracker();

        tracker.start();
        tracker.complete(false, Some("disk full".to_string()));

        assert_eq!(tracker.last_status(), Some(false));
        assert_eq!(tracker.last_error().as_deref(), Some("disk full"));

        // The next start clears the stale error
        tracker.start();
        assert!(tracker.last_error().is_none());
    }

    #[test]
    fn test_last_run_retained_across_completion() {
        let tracker = tracker();

        tracker.start();
        let stamped = tracker.last_run().unwrap();
        tracker.complete(true, None);

        assert_eq!(tracker.last_run(), Some(stamped));
    }

    #[test]
    fn test_expired_running_flag_reads_as_not_running() {
        let store = ExpiringStore::new();
        let tracker = TaskStatusTracker::new(store.clone(), "cleanup");

        // Simulate a crashed worker: the flag was written but the TTL has
        // elapsed without a complete() call.
        store.set(
            &*tracker.key_running,
            json!(true),
            Duration::from_millis(40),
        );
        assert!(tracker.is_running());

        sleep(Duration::from_millis(70));
        assert!(!tracker.is_running());
    }

    #[test]
    fn test_trackers_with_distinct_names_do_not_collide() {
        let store = ExpiringStore::new();
        let cleanup = TaskStatusTracker::new(store.clone(), "cleanup");
        let backup = TaskStatusTracker::new(store, "backup");

        cleanup.start();
        assert!(cleanup.is_running());
        assert!(!backup.is_running());
    }

    #[test]
    fn test_undecodable_value_degrades_to_unknown() {
        let store = ExpiringStore::new();
        let tracker = TaskStatusTracker::new(store.clone(), "cleanup");

        store.set(
            &*tracker.key_last_run,
            json!("not a timestamp"),
            Duration::from_secs(60),
        );
        assert!(tracker.last_run().is_none());
    }
}
