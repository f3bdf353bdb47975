//! Progress reports and cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use fibntt_ntt::CancelSignal;

use crate::calculator::FibError;

/// One progress report from a running backend.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    /// Position of the backend in a multi-backend run.
    pub calc_index: usize,
    pub algorithm: &'static str,
    /// Fraction of the work done, in `[0.0, 1.0]`.
    pub progress: f64,
    pub current_step: u64,
    pub total_steps: u64,
    /// Set only on the final report.
    pub done: bool,
}

impl ProgressUpdate {
    /// Progress after `current` of `total` steps. An empty run counts as
    /// complete.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn step(calc_index: usize, algorithm: &'static str, current: u64, total: u64) -> Self {
        let progress = if total == 0 {
            1.0
        } else {
            current as f64 / total as f64
        };
        Self {
            calc_index,
            algorithm,
            progress,
            current_step: current,
            total_steps: total,
            done: false,
        }
    }

    #[must_use]
    pub fn done(calc_index: usize, algorithm: &'static str) -> Self {
        Self {
            calc_index,
            algorithm,
            progress: 1.0,
            current_step: 0,
            total_steps: 0,
            done: true,
        }
    }
}

/// Cancellation flag shared by every clone.
///
/// Backends poll it between index bits; the transform engine also polls it
/// at each task fan-out through [`CancelSignal`]. A child token cancels
/// independently of its parent, and the parent's request is forwarded by
/// whoever supervises the child.
///
/// # Example
/// ```
/// use fibntt_core::progress::CancellationToken;
///
/// let token = CancellationToken::new();
/// let worker = token.clone();
/// assert!(worker.check_cancelled().is_ok());
///
/// token.cancel();
/// assert!(worker.is_cancelled());
/// assert!(worker.check_cancelled().is_err());
/// ```
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// `Err(FibError::Cancelled)` once cancellation has been requested.
    pub fn check_cancelled(&self) -> Result<(), FibError> {
        if self.is_cancelled() {
            Err(FibError::Cancelled)
        } else {
            Ok(())
        }
    }
}

impl CancelSignal for CancellationToken {
    fn is_cancelled(&self) -> bool {
        CancellationToken::is_cancelled(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_fraction() {
        let update = ProgressUpdate::step(2, "NttFastDoubling", 3, 4);
        assert!((update.progress - 0.75).abs() < f64::EPSILON);
        assert_eq!(update.calc_index, 2);
        assert_eq!(update.current_step, 3);
        assert!(!update.done);
    }

    #[test]
    fn empty_run_is_complete() {
        let update = ProgressUpdate::step(0, "NttFastDoubling", 0, 0);
        assert!((update.progress - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn done_update() {
        let update = ProgressUpdate::done(1, "MatrixExponentiation");
        assert!(update.done);
        assert!((update.progress - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn cancel_is_shared_between_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!token.is_cancelled());
        clone.cancel();
        assert!(token.is_cancelled());
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn check_cancelled_maps_to_error() {
        let token = CancellationToken::new();
        assert!(token.check_cancelled().is_ok());
        token.cancel();
        assert_eq!(token.check_cancelled(), Err(FibError::Cancelled));
    }

    #[test]
    fn fresh_tokens_are_independent() {
        let parent = CancellationToken::new();
        let child = CancellationToken::new();
        child.cancel();
        assert!(!parent.is_cancelled());
    }

    #[test]
    fn token_is_a_cancel_signal() {
        let token = CancellationToken::new();
        let signal: &dyn CancelSignal = &token;
        assert!(!signal.is_cancelled());
        token.cancel();
        assert!(signal.is_cancelled());
    }
}
