//! Core orchestration: parallel execution and result analysis.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::iter::{IntoParallelRefIterator, IndexedParallelIterator, ParallelIterator};

use fibntt_core::calculator::{Calculator, FibError};
use fibntt_core::observer::ProgressObserver;
use fibntt_core::observers::NoOpObserver;
use fibntt_core::options::Options;
use fibntt_core::progress::CancellationToken;

use crate::interfaces::CalculationResult;
use crate::supervisor::run_supervised;

/// Execute calculations with all given calculators.
pub fn execute_calculations(
    calculators: &[Arc<dyn Calculator>],
    n: u64,
    opts: &Options,
    cancel: &CancellationToken,
    timeout: Option<Duration>,
) -> Vec<CalculationResult> {
    execute_calculations_with_observer(calculators, n, opts, cancel, timeout, &NoOpObserver::new())
}

/// Execute calculations with all given calculators and a progress observer.
///
/// The timeout is shared: every calculator must finish before the same
/// deadline, after which it is cancelled and reported as timed out. With more
/// than one calculator the table shortcut is disabled, so small indices are
/// cross-validated on the backends themselves.
pub fn execute_calculations_with_observer(
    calculators: &[Arc<dyn Calculator>],
    n: u64,
    opts: &Options,
    cancel: &CancellationToken,
    timeout: Option<Duration>,
    observer: &dyn ProgressObserver,
) -> Vec<CalculationResult> {
    let deadline = timeout.map(|t| Instant::now() + t);
    let opts = if calculators.len() > 1 {
        opts.clone().backend_only()
    } else {
        opts.clone()
    };
    let opts = &opts;

    let run_one = |calc_index: usize, calc: &Arc<dyn Calculator>| {
        let start = Instant::now();
        let outcome = run_supervised(cancel, deadline, |token| {
            calc.calculate(token, observer, calc_index, n, opts)
        });
        let duration = start.elapsed();
        match &outcome {
            Ok(value) => tracing::debug!(
                algorithm = calc.name(),
                n,
                bytes = value.byte_len(),
                ?duration,
                "calculation finished"
            ),
            Err(e) => tracing::warn!(algorithm = calc.name(), n, error = %e, "calculation failed"),
        }
        CalculationResult {
            algorithm: calc.name().to_string(),
            outcome,
            duration,
        }
    };

    if calculators.len() == 1 {
        // Single calculator: run directly
        return vec![run_one(0, &calculators[0])];
    }

    // Multiple calculators: run in parallel using rayon
    calculators
        .par_iter()
        .enumerate()
        .map(|(i, calc)| run_one(i, calc))
        .collect()
}

/// Analyze comparison results for mismatches.
///
/// Failed calculations are left out; every successful one must carry the
/// same value.
pub fn analyze_comparison_results(results: &[CalculationResult]) -> Result<(), FibError> {
    let mut values = results.iter().filter_map(CalculationResult::value);

    let Some(first_value) = values.next() else {
        return Err(FibError::Calculation("no valid results".into()));
    };

    if values.any(|value| value != first_value) {
        return Err(FibError::Mismatch);
    }

    Ok(())
}
