//! Periodic Task Runner
//!
//! Drives one named unit of work in a repeat-forever loop: mark start, do
//! work, mark completion, sleep according to the task's cadence. Individual
//! failures are recorded and retried after a backoff; only the shared stop
//! signal ends the loop.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Local, Timelike};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use crate::error::Result;
use crate::tasks::status::TaskStatusTracker;

// == Cadence ==
/// When a periodic task re-executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Run, then wait a fixed duration. Used for cleanup.
    Every(Duration),
    /// Only execute while the local wall-clock hour matches. Used for
    /// backup; the post-run settle sleep skips the rest of the matching
    /// hour, so the task fires at most once per window.
    DailyAtHour(u32),
}

impl Cadence {
    /// Whether the task is due at the given local time.
    fn is_due(&self, now: DateTime<Local>) -> bool {
        match self {
            Cadence::Every(_) => true,
            Cadence::DailyAtHour(hour) => now.hour() == *hour,
        }
    }

    /// Whether the task is due right now.
    pub fn due_now(&self) -> bool {
        self.is_due(Local::now())
    }

    /// How long to sleep after a successful run.
    fn rest_after_success(&self, timing: &RunnerTiming) -> Duration {
        match self {
            Cadence::Every(interval) => *interval,
            Cadence::DailyAtHour(_) => timing.settle_after_run,
        }
    }
}

// == Runner Timing ==
/// Sleep intervals of the runner loop, separated out so tests can shrink
/// them to milliseconds.
#[derive(Debug, Clone, Copy)]
pub struct RunnerTiming {
    /// Sleep after a failed run before retrying
    pub error_backoff: Duration,
    /// Poll interval while a wall-clock-gated task is not due
    pub idle_poll: Duration,
    /// Sleep after a successful wall-clock-gated run, long enough to leave
    /// the matching hour window
    pub settle_after_run: Duration,
}

impl Default for RunnerTiming {
    fn default() -> Self {
        Self {
            error_backoff: Duration::from_secs(300),
            idle_poll: Duration::from_secs(1800),
            settle_after_run: Duration::from_secs(3600),
        }
    }
}

// == Interruptible Sleep ==
/// Sleeps for `duration` unless the stop signal fires first.
///
/// Returns `true` when the sleep ended because of a stop request. A dropped
/// sender also reads as stop. Waking on the watch channel instead of
/// polling a flag keeps shutdown latency well under any polling interval.
async fn sleep_unless_stopped(duration: Duration, stop: &mut watch::Receiver<bool>) -> bool {
    if *stop.borrow() {
        return true;
    }
    let deadline = tokio::time::Instant::now() + duration;
    loop {
        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => return *stop.borrow(),
            changed = stop.changed() => match changed {
                Err(_) => return true,
                Ok(()) => {
                    if *stop.borrow() {
                        return true;
                    }
                    // Spurious wake (e.g. the signal was re-cleared): keep
                    // sleeping toward the same deadline.
                }
            },
        }
    }
}

// == Spawn Task Runner ==
/// Spawns the repeat-forever loop for one task.
///
/// Each iteration checks the stop signal, waits out the cadence, then runs
/// `work` between `tracker.start()` and `tracker.complete(..)`. A work
/// error is recorded as the task's last error and answered with a fixed
/// backoff sleep; it never terminates the loop.
///
/// # Arguments
/// * `name` - Task name used in logs
/// * `cadence` - Fixed-interval or wall-clock-gated schedule
/// * `timing` - Backoff and poll intervals
/// * `tracker` - Status tracker owned by this runner
/// * `stop` - Shared stop signal; observed at every sleep
/// * `work` - The unit of work to repeat
///
/// # Returns
/// A JoinHandle that completes once the runner has observed the stop
/// signal and exited its loop.
pub fn spawn_task_runner<F, Fut>(
    name: &'static str,
    cadence: Cadence,
    timing: RunnerTiming,
    tracker: TaskStatusTracker,
    mut stop: watch::Receiver<bool>,
    work: F,
) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        info!(task = name, ?cadence, "task runner started");

        loop {
            if *stop.borrow() {
                break;
            }

            if !cadence.due_now() {
                if sleep_unless_stopped(timing.idle_poll, &mut stop).await {
                    break;
                }
                continue;
            }

            tracker.start();
            let rest = match work().await {
                Ok(()) => {
                    tracker.complete(true, None);
                    cadence.rest_after_success(&timing)
                }
                Err(e) => {
                    tracker.complete(false, Some(format!("Error in {name} task: {e}")));
                    timing.error_backoff
                }
            };

            if sleep_unless_stopped(rest, &mut stop).await {
                break;
            }
        }

        info!(task = name, "task runner stopped");
    })
}
