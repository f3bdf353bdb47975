//! Progress observation.
//!
//! Backends emit one [`ProgressUpdate`] per consumed index bit (or per
//! iteration for the iterative backends). Hot loops consult a
//! [`FrozenObserver`] first so that an observer only sees updates that moved
//! progress by at least its threshold.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::progress::ProgressUpdate;

/// Receiver of progress updates. Shared across worker threads.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, update: &ProgressUpdate);

    /// A throttle for the calculation about to start.
    fn freeze(&self) -> FrozenObserver;
}

/// Lock-free throttle owned by one calculation.
///
/// Remembers the last forwarded progress fraction as raw `f64` bits.
#[derive(Debug)]
pub struct FrozenObserver {
    last: AtomicU64,
    threshold: f64,
}

impl FrozenObserver {
    /// A throttle forwarding updates at least `threshold` apart. A threshold
    /// above `1.0` forwards nothing.
    #[must_use]
    pub fn new(threshold: f64) -> Self {
        Self {
            last: AtomicU64::new(0f64.to_bits()),
            threshold,
        }
    }

    #[inline]
    #[must_use]
    pub fn should_report(&self, progress: f64) -> bool {
        progress - self.current() >= self.threshold
    }

    /// Record `progress` as forwarded.
    pub fn update(&self, progress: f64) {
        self.last.store(progress.to_bits(), Ordering::Relaxed);
    }

    /// Forward `update` to `observer` if it clears the threshold.
    pub fn forward(&self, observer: &dyn ProgressObserver, update: &ProgressUpdate) {
        if self.should_report(update.progress) {
            self.update(update.progress);
            observer.on_progress(update);
        }
    }

    #[must_use]
    pub fn current(&self) -> f64 {
        f64::from_bits(self.last.load(Ordering::Relaxed))
    }
}
