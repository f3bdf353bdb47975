//! Linear summation backend.
//!
//! Steps `F(k+1) = F(k) + F(k-1)` once per index with a ripple-carry limb
//! addition. The current and next buffers trade places by move after every
//! step, so no limb is ever copied.

use fibntt_ntt::arith::add_assign_limbs;

use crate::calculator::{CoreCalculator, FibError};
use crate::number::Number;
use crate::observer::ProgressObserver;
use crate::options::Options;
use crate::progress::{CancellationToken, ProgressUpdate};

const NAME: &str = "LinearSummation";

/// Iterations between cancellation and progress checkpoints.
const CHECKPOINT_INTERVAL: u64 = 1 << 12;

/// `O(n)` additions of growing operands.
pub struct LinearSummation;

impl LinearSummation {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for LinearSummation {
    fn default() -> Self {
        Self::new()
    }
}

impl CoreCalculator for LinearSummation {
    fn calculate_core(
        &self,
        cancel: &CancellationToken,
        observer: &dyn ProgressObserver,
        calc_index: usize,
        n: u64,
        _opts: &Options,
    ) -> Result<Number, FibError> {
        let frozen = observer.freeze();
        let mut current: Vec<u64> = vec![0];
        let mut next: Vec<u64> = vec![1];

        for k in 0..n {
            if k % CHECKPOINT_INTERVAL == 0 {
                cancel.check_cancelled()?;
                let update = ProgressUpdate::step(calc_index, NAME, k, n);
                frozen.forward(observer, &update);
            }

            // current <- current + next, then swap: (F(k+1), F(k+2)).
            current.resize(next.len(), 0);
            let carry = add_assign_limbs(&mut current, &next);
            if carry != 0 {
                current.push(carry);
            }
            std::mem::swap(&mut current, &mut next);
        }

        observer.on_progress(&ProgressUpdate::done(calc_index, NAME));
        Ok(Number::from_limbs(&current))
    }

    fn name(&self) -> &'static str {
        NAME
    }
}
