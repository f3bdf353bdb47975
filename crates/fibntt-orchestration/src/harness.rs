//! Timed evaluation and the largest-index search.
//!
//! `evaluate` times a single computation on a worker thread under a thread
//! timeout. `search` drives a calculator through four phases:
//!
//! 1. indices `0..=93` are checked against the 64-bit linear recurrence,
//! 2. indices up to `0x2d7` must each finish under the soft cut-off,
//! 3. the index grows geometrically while it finishes under the hard cut-off,
//! 4. about `2^sample_log` evenly spaced indices from the second checkpoint
//!    refine the best index.
//!
//! Every row that completes in phases 1, 2 and 4 goes to the reporter. The
//! result is the largest index seen to finish under the hard cut-off.
//! Indices are always computed by the backend itself, never answered from
//! the small-index table.

use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;

use fibntt_core::calculator::{Calculator, FibError};
use fibntt_core::number::Number;
use fibntt_core::observers::NoOpObserver;
use fibntt_core::options::Options;
use fibntt_core::progress::CancellationToken;

use crate::supervisor::run_supervised;

/// Last index checked against the 64-bit recurrence.
pub const FIRST_CHECKPOINT: u64 = 93;

/// Last index of the exhaustive sweep.
pub const SECOND_CHECKPOINT: u64 = 0x2d7;

/// Time limits and sampling density of a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// An exhaustive-phase or sampled index slower than this ends its phase.
    pub soft_cutoff: Duration,
    /// An index counts as best only when faster than this.
    pub hard_cutoff: Duration,
    /// A computation still running after this is cancelled.
    pub thread_timeout: Duration,
    /// Log2 of the number of refinement samples.
    pub sample_log: u32,
    /// Stop after the growth phase.
    pub brief: bool,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            soft_cutoff: Duration::from_millis(1500),
            hard_cutoff: Duration::from_secs(1),
            thread_timeout: Duration::from_secs(5),
            sample_log: 10,
            brief: false,
        }
    }
}

/// One timed computation.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub index: u64,
    pub duration: Duration,
    pub outcome: Result<Number, FibError>,
}

impl Evaluation {
    /// Whether the computation produced a value.
    #[must_use]
    pub fn completed(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Completed and strictly faster than `limit`.
    #[must_use]
    pub fn within(&self, limit: Duration) -> bool {
        self.completed() && self.duration < limit
    }

    #[must_use]
    pub fn row(&self) -> Option<ReportRow> {
        self.outcome.as_ref().ok().map(|value| ReportRow {
            index: self.index,
            duration: self.duration,
            bytes: value.byte_len(),
        })
    }
}

/// A reported search row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub index: u64,
    pub duration: Duration,
    pub bytes: usize,
}

impl fmt::Display for ReportRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>20} | {}.{:09}s | {} B",
            self.index,
            self.duration.as_secs(),
            self.duration.subsec_nanos(),
            self.bytes
        )
    }
}

/// Column header matching the `Display` form of [`ReportRow`].
pub const REPORT_HEADER: &str = "#   Fibonacci index  |   Time (s)   | Size (bytes) \n\
                                 # -------------------+--------------+--------------";

/// Compute F(n) on a worker thread, timing only the computation.
///
/// A computation still running after `timeout` is cancelled and joined, and
/// the evaluation reports `FibError::Timeout`. Cancelling `cancel` stops the
/// computation the same way but reports `FibError::Cancelled`.
pub fn evaluate(
    calculator: &dyn Calculator,
    n: u64,
    opts: &Options,
    cancel: &CancellationToken,
    timeout: Duration,
) -> Evaluation {
    let deadline = Instant::now() + timeout;
    let outcome = run_supervised(cancel, Some(deadline), |token| {
        let start = Instant::now();
        let value = calculator.calculate(token, &NoOpObserver::new(), 0, n, opts)?;
        Ok((value, start.elapsed()))
    });

    match outcome {
        Ok((value, duration)) => Evaluation {
            index: n,
            duration,
            outcome: Ok(value),
        },
        Err(err) => Evaluation {
            index: n,
            duration: Duration::ZERO,
            outcome: Err(err),
        },
    }
}

/// Find the largest index the calculator handles under the hard cut-off.
///
/// Fails with `FibError::Mismatch` when an index up to the first checkpoint
/// produces a wrong value, and with `FibError::Cancelled` once `cancel`
/// fires.
pub fn search(
    calculator: &dyn Calculator,
    opts: &Options,
    cancel: &CancellationToken,
    limits: &Limits,
    mut report: impl FnMut(&ReportRow),
) -> Result<u64, FibError> {
    let opts = opts.clone().backend_only();
    let run = |n: u64| -> Result<Evaluation, FibError> {
        cancel.check_cancelled()?;
        let eval = evaluate(calculator, n, &opts, cancel, limits.thread_timeout);
        if matches!(eval.outcome, Err(FibError::Cancelled)) && cancel.is_cancelled() {
            return Err(FibError::Cancelled);
        }
        Ok(eval)
    };
    let mut emit = |eval: &Evaluation| {
        if let Some(row) = eval.row() {
            report(&row);
        }
    };

    let mut best = 0;
    let mut cur = 0;

    // Verified against the recurrence.
    let (mut a, mut b) = (0u64, 1u64);
    while cur <= FIRST_CHECKPOINT {
        let eval = run(cur)?;
        if !eval.within(limits.soft_cutoff) {
            return Ok(best);
        }
        let got = low_limb(&eval);
        if got != Some(a) {
            tracing::error!(index = cur, expected = a, ?got, "wrong value");
            return Err(FibError::Mismatch);
        }
        emit(&eval);
        if eval.within(limits.hard_cutoff) {
            best = cur;
        }
        (a, b) = (b, a.wrapping_add(b));
        cur += 1;
    }

    // Exhaustive sweep.
    while cur <= SECOND_CHECKPOINT {
        let eval = run(cur)?;
        if !eval.within(limits.soft_cutoff) {
            return Ok(best);
        }
        emit(&eval);
        if eval.within(limits.hard_cutoff) {
            best = cur;
        }
        cur += 1;
    }

    // Upper bound by geometric growth.
    loop {
        let eval = run(cur)?;
        if !eval.within(limits.hard_cutoff) {
            break;
        }
        best = cur;
        match cur.checked_add((cur >> 1) - (cur >> 3)) {
            Some(next) => cur = next,
            None => break,
        }
    }
    tracing::debug!(best, bound = cur, "upper bound found");

    if limits.brief {
        return Ok(best);
    }

    // Sampled from the second checkpoint rather than from `best`, so the rows
    // trace the whole growth curve.
    let delta = ((cur - SECOND_CHECKPOINT) >> limits.sample_log).max(1);
    cur = SECOND_CHECKPOINT;
    while let Some(next) = cur.checked_add(delta) {
        cur = next;
        let eval = run(cur)?;
        if cur > best && !eval.within(limits.soft_cutoff) {
            break;
        }
        emit(&eval);
        if cur > best && eval.within(limits.hard_cutoff) {
            best = cur;
        }
    }

    Ok(best)
}

/// The value as a single 64-bit word, if it fits one.
fn low_limb(eval: &Evaluation) -> Option<u64> {
    let value = eval.outcome.as_ref().ok()?;
    match value.limbs().as_slice() {
        [limb] => Some(*limb),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    use fibntt_core::calculator::{CoreCalculator, FibCalculator};
    use fibntt_core::constants::FIB_TABLE;
    use fibntt_core::observer::ProgressObserver;
    use fibntt_core::ntt::NttFastDoubling;

    /// Computes normally up to `limit` and never finishes above it.
    struct Wall {
        inner: FibCalculator,
        limit: u64,
    }

    impl Wall {
        fn new(limit: u64) -> Self {
            Self {
                inner: FibCalculator::new(Arc::new(NttFastDoubling::new())),
                limit,
            }
        }
    }

    impl Calculator for Wall {
        fn calculate(
            &self,
            cancel: &CancellationToken,
            observer: &dyn ProgressObserver,
            calc_index: usize,
            n: u64,
            opts: &Options,
        ) -> Result<Number, FibError> {
            if n > self.limit {
                while !cancel.is_cancelled() {
                    thread::sleep(Duration::from_millis(1));
                }
                return Err(FibError::Cancelled);
            }
            self.inner.calculate(cancel, observer, calc_index, n, opts)
        }

        fn name(&self) -> &'static str {
            "Wall"
        }
    }

    /// A backend that always answers seven.
    struct Seven;

    impl CoreCalculator for Seven {
        fn calculate_core(
            &self,
            _cancel: &CancellationToken,
            _observer: &dyn ProgressObserver,
            _calc_index: usize,
            _n: u64,
            _opts: &Options,
        ) -> Result<Number, FibError> {
            Ok(Number::from_u64(7))
        }

        fn name(&self) -> &'static str {
            "Seven"
        }
    }

    /// Correct up to 93, then instantly answers one for any index.
    struct Instant64;

    impl Calculator for Instant64 {
        fn calculate(
            &self,
            _cancel: &CancellationToken,
            _observer: &dyn ProgressObserver,
            _calc_index: usize,
            n: u64,
            _opts: &Options,
        ) -> Result<Number, FibError> {
            let value = usize::try_from(n)
                .ok()
                .and_then(|i| FIB_TABLE.get(i))
                .copied()
                .unwrap_or(1);
            Ok(Number::from_u64(value))
        }

        fn name(&self) -> &'static str {
            "Instant64"
        }
    }

    fn test_limits() -> Limits {
        Limits {
            soft_cutoff: Duration::from_millis(750),
            hard_cutoff: Duration::from_millis(500),
            thread_timeout: Duration::from_millis(250),
            sample_log: 4,
            brief: false,
        }
    }

    #[test]
    fn evaluate_times_a_computation() {
        let calc = Wall::new(u64::MAX);
        let eval = evaluate(
            &calc,
            100,
            &Options::default(),
            &CancellationToken::new(),
            Duration::from_secs(5),
        );
        assert!(eval.completed());
        assert_eq!(eval.index, 100);
        assert_eq!(eval.row().unwrap().bytes, 16);
    }

    #[test]
    fn evaluate_cancels_on_timeout() {
        let calc = Wall::new(0);
        let start = Instant::now();
        let eval = evaluate(
            &calc,
            10,
            &Options::default(),
            &CancellationToken::new(),
            Duration::from_millis(30),
        );
        assert!(matches!(eval.outcome, Err(FibError::Timeout(_))));
        assert!(eval.row().is_none());
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn search_finds_the_wall() {
        // Growth from 728 passes 4920 and stops at 6765; the samples
        // 727 + 377k never land in (4920, 5000].
        let mut rows = Vec::new();
        let best = search(
            &Wall::new(5000),
            &Options::default(),
            &CancellationToken::new(),
            &test_limits(),
            |row| rows.push(*row),
        )
        .unwrap();
        assert_eq!(best, 4920);
        assert_eq!(rows.len(), 728 + 11);
        assert_eq!(rows[93].index, 93);
        assert_eq!(rows[728].index, 727 + 377);
    }

    #[test]
    fn brief_search_skips_sampling() {
        let mut rows = 0;
        let limits = Limits {
            brief: true,
            ..test_limits()
        };
        let best = search(
            &Wall::new(5000),
            &Options::default(),
            &CancellationToken::new(),
            &limits,
            |_| rows += 1,
        )
        .unwrap();
        assert_eq!(best, 4920);
        assert_eq!(rows, 728);
    }

    #[test]
    fn search_stops_early_when_small_indices_are_slow() {
        let mut rows = 0;
        let best = search(
            &Wall::new(50),
            &Options::default(),
            &CancellationToken::new(),
            &test_limits(),
            |_| rows += 1,
        )
        .unwrap();
        assert_eq!(best, 50);
        assert_eq!(rows, 51);
    }

    #[test]
    fn search_rejects_wrong_values() {
        let calc = FibCalculator::new(Arc::new(Seven));
        let result = search(
            &calc,
            &Options::default(),
            &CancellationToken::new(),
            &test_limits(),
            |_| {},
        );
        assert_eq!(result, Err(FibError::Mismatch));
    }

    #[test]
    fn search_verifies_small_indices_on_the_backend() {
        // Only index 7 of the checked range is right; the table would have
        // answered every one of them.
        let calc = FibCalculator::new(Arc::new(Seven));
        let mut rows = 0;
        let result = search(
            &calc,
            &Options::default(),
            &CancellationToken::new(),
            &test_limits(),
            |_| rows += 1,
        );
        assert_eq!(result, Err(FibError::Mismatch));
        assert_eq!(rows, 0);
    }

    #[test]
    fn search_stops_growing_at_the_index_limit() {
        let mut last = 0;
        let best = search(
            &Instant64,
            &Options::default(),
            &CancellationToken::new(),
            &Limits {
                sample_log: 2,
                ..test_limits()
            },
            |row| last = row.index,
        )
        .unwrap();
        assert!(best > u64::MAX / 2, "best {best}");
        assert!(last > u64::MAX / 2 && last <= best, "last row {last}");
    }

    #[test]
    fn search_honours_cancellation() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = search(&Wall::new(5000), &Options::default(), &cancel, &test_limits(), |_| {});
        assert_eq!(result, Err(FibError::Cancelled));
    }

    #[test]
    fn row_format() {
        let row = ReportRow {
            index: 727,
            duration: Duration::new(1, 5),
            bytes: 64,
        };
        assert_eq!(
            row.to_string(),
            "                 727 | 1.000000005s | 64 B"
        );
    }

    #[test]
    fn row_serializes() {
        let row = ReportRow {
            index: 10,
            duration: Duration::from_millis(2),
            bytes: 8,
        };
        let json = serde_json::to_value(row).unwrap();
        assert_eq!(json["index"], 10);
        assert_eq!(json["bytes"], 8);
        assert_eq!(json["duration"]["nanos"], 2_000_000);
    }
}
