//! Task Coordinator
//!
//! Owns one periodic runner per task kind, starts and stops them together,
//! and exposes the aggregate status snapshot. Start is expected once per
//! process at warm-up; stop only on graceful shutdown. A process that dies
//! without stopping is tolerated: the running-flag TTL retires any stale
//! in-progress status.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::Config;
use crate::models::TaskStatusEntry;
use crate::records::RecordStore;
use crate::store::ExpiringStore;
use crate::tasks::backup::run_backup;
use crate::tasks::cleanup::run_cleanup;
use crate::tasks::runner::{spawn_task_runner, RunnerTiming};
use crate::tasks::status::TaskStatusTracker;

/// Task kind names, used as tracker scopes and status keys.
pub const CLEANUP_TASK: &str = "cleanup";
pub const BACKUP_TASK: &str = "backup";

#[derive(Default)]
struct RunnerHandles {
    cleanup: Option<JoinHandle<()>>,
    backup: Option<JoinHandle<()>>,
}

impl RunnerHandles {
    fn any_spawned(&self) -> bool {
        self.cleanup.is_some() || self.backup.is_some()
    }
}

// == Task Coordinator ==
/// Lifecycle owner of the background maintenance tasks.
///
/// Constructed explicitly at process startup and passed by reference to
/// anything needing status or lifecycle control; `shared` additionally
/// offers a process-wide accessor with race-free single construction.
pub struct TaskCoordinator {
    config: Config,
    timing: RunnerTiming,
    records: RecordStore,
    stop_tx: watch::Sender<bool>,
    cleanup_tracker: TaskStatusTracker,
    backup_tracker: TaskStatusTracker,
    runners: Mutex<RunnerHandles>,
}

impl TaskCoordinator {
    // == Constructors ==
    /// Creates a coordinator over the given stores.
    pub fn new(status_store: ExpiringStore, records: RecordStore, config: Config) -> Arc<Self> {
        Self::with_timing(status_store, records, config, RunnerTiming::default())
    }

    /// Creates a coordinator with explicit runner timing. Production uses
    /// the defaults; tests shrink the intervals.
    pub fn with_timing(
        status_store: ExpiringStore,
        records: RecordStore,
        config: Config,
        timing: RunnerTiming,
    ) -> Arc<Self> {
        let (stop_tx, _) = watch::channel(false);
        Arc::new(Self {
            cleanup_tracker: TaskStatusTracker::new(status_store.clone(), CLEANUP_TASK),
            backup_tracker: TaskStatusTracker::new(status_store, BACKUP_TASK),
            config,
            timing,
            records,
            stop_tx,
            runners: Mutex::new(RunnerHandles::default()),
        })
    }

    /// Process-wide coordinator instance.
    ///
    /// The first caller's stores and configuration win; every later call
    /// returns the same instance, and concurrent first access cannot
    /// construct two.
    pub fn shared(status_store: ExpiringStore, records: RecordStore, config: Config) -> Arc<Self> {
        static SHARED: OnceLock<Arc<TaskCoordinator>> = OnceLock::new();
        SHARED
            .get_or_init(|| Self::new(status_store, records, config))
            .clone()
    }

    // == Start ==
    /// Clears the stop signal and starts every runner that is not already
    /// alive. Starting an already-running coordinator is a no-op per task.
    pub async fn start(&self) {
        self.stop_tx.send_replace(false);
        let mut runners = self.runners.lock().await;

        if runners.cleanup.as_ref().map_or(true, |h| h.is_finished()) {
            let records = self.records.clone();
            let policy = self.config.cleanup_policy();
            runners.cleanup = Some(spawn_task_runner(
                CLEANUP_TASK,
                self.config.cleanup_cadence(),
                self.timing,
                self.cleanup_tracker.clone(),
                self.stop_tx.subscribe(),
                move || {
                    let records = records.clone();
                    let policy = policy.clone();
                    async move { run_cleanup(&records, &policy).map(|_| ()) }
                },
            ));
        }

        if runners.backup.as_ref().map_or(true, |h| h.is_finished()) {
            let records = self.records.clone();
            let policy = self.config.backup_policy();
            runners.backup = Some(spawn_task_runner(
                BACKUP_TASK,
                self.config.backup_cadence(),
                self.timing,
                self.backup_tracker.clone(),
                self.stop_tx.subscribe(),
                move || {
                    let records = records.clone();
                    let policy = policy.clone();
                    async move { run_backup(&records, &policy).map(|_| ()) }
                },
            ));
        }

        info!("background tasks started");
    }

    // == Stop ==
    /// Requests stop and waits for every runner to observe it and exit.
    ///
    /// Cancellation is cooperative: an in-progress work execution finishes
    /// before its runner sees the signal at the next sleep checkpoint, so
    /// this can take up to one in-flight iteration plus a sleep wake-up.
    pub async fn stop(&self) {
        let mut runners = self.runners.lock().await;
        if !runners.any_spawned() {
            return;
        }

        self.stop_tx.send_replace(true);
        if let Some(handle) = runners.cleanup.take() {
            let _ = handle.await;
        }
        if let Some(handle) = runners.backup.take() {
            let _ = handle.await;
        }

        self.cleanup_tracker.complete(true, None);
        self.backup_tracker.complete(true, None);
        info!("background tasks stopped");
    }

    // == Status ==
    /// Aggregate status snapshot of every task kind.
    pub fn status(&self) -> BTreeMap<String, TaskStatusEntry> {
        BTreeMap::from([
            (CLEANUP_TASK.to_string(), self.cleanup_tracker.snapshot()),
            (BACKUP_TASK.to_string(), self.backup_tracker.snapshot()),
        ])
    }

    /// Status tracker of the scheduled cleanup task (read-only use).
    pub fn cleanup_tracker(&self) -> &TaskStatusTracker {
        &self.cleanup_tracker
    }

    /// Status tracker of the scheduled backup task (read-only use).
    pub fn backup_tracker(&self) -> &TaskStatusTracker {
        &self.backup_tracker
    }
}
