//! Calculator traits and the `FibCalculator` decorator.
//!
//! `Calculator` is the public trait consumed by orchestration.
//! `CoreCalculator` is the internal trait implemented by backends.
//! `FibCalculator` is a decorator that adds the table fast path (n <= 93,
//! unless `Options::table_lookup` is off) and the cancellation check.

use std::sync::Arc;

use fibntt_ntt::NttError;

use crate::constants::{FIB_TABLE, MAX_FIB_U64};
use crate::number::Number;
use crate::observer::ProgressObserver;
use crate::options::Options;
use crate::progress::{CancellationToken, ProgressUpdate};

/// Error type for Fibonacci calculations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FibError {
    /// A calculation error occurred.
    #[error("calculation error: {0}")]
    Calculation(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Calculation was cancelled.
    #[error("calculation cancelled")]
    Cancelled,

    /// Calculation timed out.
    #[error("calculation timed out after {0}")]
    Timeout(String),

    /// Results from different backends don't match.
    #[error("result mismatch between algorithms")]
    Mismatch,

    /// The backend's fixed-width arithmetic cannot hold the result.
    #[error("F({0}) overflows the {1} backend")]
    Overflow(u64, &'static str),

    /// The index is outside what the backend supports.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<NttError> for FibError {
    fn from(err: NttError) -> Self {
        match err {
            NttError::Cancelled => Self::Cancelled,
            NttError::IndexOutOfRange(..) => Self::InvalidInput(err.to_string()),
            NttError::Allocation(_) | NttError::TaskFailed(_) => Self::Calculation(err.to_string()),
        }
    }
}

/// Public trait for Fibonacci calculators, consumed by orchestration.
pub trait Calculator: Send + Sync {
    /// Calculate F(n) with the given options.
    fn calculate(
        &self,
        cancel: &CancellationToken,
        observer: &dyn ProgressObserver,
        calc_index: usize,
        n: u64,
        opts: &Options,
    ) -> Result<Number, FibError>;

    /// Get the name of this calculator.
    fn name(&self) -> &'static str;
}

/// Internal trait for backend implementations.
/// Wrapped by `FibCalculator` which adds fast path and progress reporting.
pub trait CoreCalculator: Send + Sync {
    /// Perform the core calculation for large n.
    fn calculate_core(
        &self,
        cancel: &CancellationToken,
        observer: &dyn ProgressObserver,
        calc_index: usize,
        n: u64,
        opts: &Options,
    ) -> Result<Number, FibError>;

    /// Get the name of this backend.
    fn name(&self) -> &'static str;
}

/// Decorator that wraps a `CoreCalculator` with fast path and progress reporting.
pub struct FibCalculator {
    inner: Arc<dyn CoreCalculator>,
}

impl FibCalculator {
    /// Create a new `FibCalculator` wrapping the given core calculator.
    #[must_use]
    pub fn new(inner: Arc<dyn CoreCalculator>) -> Self {
        Self { inner }
    }

    /// Fast path for small n (n <= 93) using precomputed table.
    #[allow(clippy::cast_possible_truncation)]
    fn calculate_small(n: u64) -> Number {
        Number::from_u64(FIB_TABLE[n as usize])
    }
}

impl Calculator for FibCalculator {
    fn calculate(
        &self,
        cancel: &CancellationToken,
        observer: &dyn ProgressObserver,
        calc_index: usize,
        n: u64,
        opts: &Options,
    ) -> Result<Number, FibError> {
        if opts.table_lookup && n <= MAX_FIB_U64 {
            observer.on_progress(&ProgressUpdate::done(calc_index, self.inner.name()));
            return Ok(Self::calculate_small(n));
        }

        // Check cancellation before starting
        cancel.check_cancelled()?;

        self.inner
            .calculate_core(cancel, observer, calc_index, n, opts)
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observers::NoOpObserver;

    struct Unreachable;

    impl CoreCalculator for Unreachable {
        fn calculate_core(
            &self,
            _cancel: &CancellationToken,
            _observer: &dyn ProgressObserver,
            _calc_index: usize,
            _n: u64,
            _opts: &Options,
        ) -> Result<Number, FibError> {
            Err(FibError::Calculation("core path taken".into()))
        }

        fn name(&self) -> &'static str {
            "Unreachable"
        }
    }

    #[test]
    fn calculate_small_values() {
        assert_eq!(FibCalculator::calculate_small(0), Number::zero());
        assert_eq!(FibCalculator::calculate_small(1), Number::from_u64(1));
        assert_eq!(FibCalculator::calculate_small(10), Number::from_u64(55));
        assert_eq!(FibCalculator::calculate_small(20), Number::from_u64(6765));
    }

    #[test]
    fn calculate_small_max() {
        assert_eq!(
            FibCalculator::calculate_small(93),
            Number::from_u64(12_200_160_415_121_876_738)
        );
    }

    #[test]
    fn fast_path_skips_core() {
        let calc = FibCalculator::new(Arc::new(Unreachable));
        let cancel = CancellationToken::new();
        let result = calc.calculate(&cancel, &NoOpObserver::new(), 0, 93, &Options::default());
        assert!(result.is_ok());
        let result = calc.calculate(&cancel, &NoOpObserver::new(), 0, 94, &Options::default());
        assert!(matches!(result, Err(FibError::Calculation(_))));
    }

    #[test]
    fn backend_only_reaches_core_for_small_n() {
        let calc = FibCalculator::new(Arc::new(Unreachable));
        let opts = Options::default().backend_only();
        for n in [0, 1, 93] {
            let result = calc.calculate(&CancellationToken::new(), &NoOpObserver::new(), 0, n, &opts);
            assert!(matches!(result, Err(FibError::Calculation(_))), "F({n})");
        }
    }

    #[test]
    fn cancelled_before_core() {
        let calc = FibCalculator::new(Arc::new(Unreachable));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = calc.calculate(&cancel, &NoOpObserver::new(), 0, 1000, &Options::default());
        assert_eq!(result, Err(FibError::Cancelled));
    }

    #[test]
    fn fib_error_display() {
        let err = FibError::Calculation("test".into());
        assert_eq!(err.to_string(), "calculation error: test");

        let err = FibError::Cancelled;
        assert_eq!(err.to_string(), "calculation cancelled");

        let err = FibError::Overflow(94, "NaiveRecursion");
        assert_eq!(err.to_string(), "F(94) overflows the NaiveRecursion backend");
    }

    #[test]
    fn ntt_errors_convert() {
        assert_eq!(FibError::from(NttError::Cancelled), FibError::Cancelled);
        assert!(matches!(
            FibError::from(NttError::IndexOutOfRange(9, 8)),
            FibError::InvalidInput(_)
        ));
        assert!(matches!(
            FibError::from(NttError::Allocation(1)),
            FibError::Calculation(_)
        ));
    }
}
