//! GMP-based calculator using the `rug` crate.
//!
//! Only available when the `gmp` feature is enabled.

use rug::integer::Order;
use rug::Integer;

use crate::calculator::{CoreCalculator, FibError};
use crate::number::Number;
use crate::observer::ProgressObserver;
use crate::options::Options;
use crate::progress::{CancellationToken, ProgressUpdate};

const NAME: &str = "GMP";

/// Delegates to GMP's own Fibonacci routine.
pub struct GmpFibonacci;

impl GmpFibonacci {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for GmpFibonacci {
    fn default() -> Self {
        Self::new()
    }
}

impl CoreCalculator for GmpFibonacci {
    fn calculate_core(
        &self,
        cancel: &CancellationToken,
        observer: &dyn ProgressObserver,
        calc_index: usize,
        n: u64,
        _opts: &Options,
    ) -> Result<Number, FibError> {
        let index = u32::try_from(n)
            .map_err(|_| FibError::InvalidInput(format!("GMP index {n} exceeds u32")))?;
        cancel.check_cancelled()?;
        let value = Integer::from(Integer::fibonacci(index));
        observer.on_progress(&ProgressUpdate::done(calc_index, NAME));
        Ok(Number::from_limbs(&value.to_digits::<u64>(Order::Lsf)))
    }

    fn name(&self) -> &'static str {
        NAME
    }
}
