//! Observer implementations shipped with the crate.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tracing::{debug, info};

use crate::constants::PROGRESS_REPORT_THRESHOLD;
use crate::observer::{FrozenObserver, ProgressObserver};
use crate::progress::ProgressUpdate;

/// Writes progress to the `tracing` log, at most once per interval.
///
/// Completion updates always get through.
pub struct LoggingObserver {
    started: Instant,
    min_interval_ms: u64,
    /// Milliseconds since `started` of the last logged update, plus one;
    /// zero means nothing has been logged yet.
    last_logged: AtomicU64,
}

impl LoggingObserver {
    #[must_use]
    pub fn new(min_interval_ms: u64) -> Self {
        Self {
            started: Instant::now(),
            min_interval_ms,
            last_logged: AtomicU64::new(0),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// Claim the right to log now; false if the interval has not elapsed.
    fn claim(&self, now: u64) -> bool {
        let last = self.last_logged.load(Ordering::Relaxed);
        if last != 0 && now + 1 < last + self.min_interval_ms {
            return false;
        }
        self.last_logged
            .compare_exchange(last, now + 1, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
    }
}

impl ProgressObserver for LoggingObserver {
    fn on_progress(&self, update: &ProgressUpdate) {
        let now = self.elapsed_ms();
        if update.done {
            self.last_logged.store(now + 1, Ordering::Relaxed);
            info!(
                calc = update.calc_index,
                algorithm = update.algorithm,
                elapsed_ms = now,
                "calculation complete"
            );
            return;
        }
        if self.claim(now) {
            debug!(
                calc = update.calc_index,
                algorithm = update.algorithm,
                step = update.current_step,
                total = update.total_steps,
                "{:.1}% done",
                update.progress * 100.0
            );
        }
    }

    fn freeze(&self) -> FrozenObserver {
        FrozenObserver::new(PROGRESS_REPORT_THRESHOLD)
    }
}

/// Discards every update.
#[derive(Debug, Default)]
pub struct NoOpObserver;

impl NoOpObserver {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ProgressObserver for NoOpObserver {
    fn on_progress(&self, _update: &ProgressUpdate) {}

    fn freeze(&self) -> FrozenObserver {
        FrozenObserver::new(f64::INFINITY)
    }
}
