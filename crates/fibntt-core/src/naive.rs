//! Two-branch recursion on machine words.
//!
//! Exponential time and limited to results that fit one `u64`; kept as the
//! simplest possible reference.

use crate::calculator::{CoreCalculator, FibError};
use crate::constants::MAX_FIB_U64;
use crate::number::Number;
use crate::observer::ProgressObserver;
use crate::options::Options;
use crate::progress::{CancellationToken, ProgressUpdate};

const NAME: &str = "NaiveRecursion";

/// Subtrees below this index finish in milliseconds and run unpolled.
const CANCEL_POLL_INDEX: u64 = 30;

pub struct NaiveRecursion;

impl NaiveRecursion {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn recurse(n: u64) -> u64 {
        if n <= 1 {
            n
        } else {
            Self::recurse(n - 1) + Self::recurse(n - 2)
        }
    }

    /// Like `recurse`, polling `cancel` before each subtree of index
    /// `CANCEL_POLL_INDEX` or more.
    fn recurse_cancellable(n: u64, cancel: &CancellationToken) -> Result<u64, FibError> {
        if n < CANCEL_POLL_INDEX {
            return Ok(Self::recurse(n));
        }
        cancel.check_cancelled()?;
        Ok(Self::recurse_cancellable(n - 1, cancel)? + Self::recurse_cancellable(n - 2, cancel)?)
    }
}

impl Default for NaiveRecursion {
    fn default() -> Self {
        Self::new()
    }
}

impl CoreCalculator for NaiveRecursion {
    fn calculate_core(
        &self,
        cancel: &CancellationToken,
        observer: &dyn ProgressObserver,
        calc_index: usize,
        n: u64,
        _opts: &Options,
    ) -> Result<Number, FibError> {
        if n > MAX_FIB_U64 {
            return Err(FibError::Overflow(n, NAME));
        }
        let value = Self::recurse_cancellable(n, cancel)?;
        observer.on_progress(&ProgressUpdate::done(calc_index, NAME));
        Ok(Number::from_u64(value))
    }

    fn name(&self) -> &'static str {
        NAME
    }
}
