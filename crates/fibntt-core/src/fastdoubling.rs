//! Fast doubling on `num_bigint::BigUint`.
//!
//! Uses the doubling identities:
//!   F(2k)   = F(k) * (2*F(k+1) - F(k))
//!   F(2k+1) = F(k+1)^2 + F(k)^2
//!
//! Iterates from MSB to LSB. The three products of a step run under
//! `rayon::join` once the operands pass the parallel threshold.

use num_bigint::BigUint;
use num_traits::One;

use crate::calculator::{CoreCalculator, FibError};
use crate::number::Number;
use crate::observer::ProgressObserver;
use crate::options::Options;
use crate::progress::{CancellationToken, ProgressUpdate};

const NAME: &str = "FastDoubling";

/// Fast doubling backed by the external big-integer library.
pub struct BigIntFastDoubling;

impl BigIntFastDoubling {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// One doubling step: `(F(k), F(k+1)) -> (F(2k), F(2k+1))`.
    #[allow(clippy::cast_possible_truncation)]
    fn double(fk: &BigUint, fk1: &BigUint, parallel_threshold: usize) -> (BigUint, BigUint) {
        let t = (fk1 << 1u32) - fk;
        let max_bits = fk.bits().max(fk1.bits()) as usize;
        if max_bits >= parallel_threshold {
            let ((fk_sq, fk1_sq), f2k) =
                rayon::join(|| rayon::join(|| fk * fk, || fk1 * fk1), || fk * &t);
            (f2k, fk_sq + fk1_sq)
        } else {
            (fk * &t, fk * fk + fk1 * fk1)
        }
    }
}

impl Default for BigIntFastDoubling {
    fn default() -> Self {
        Self::new()
    }
}

impl CoreCalculator for BigIntFastDoubling {
    fn calculate_core(
        &self,
        cancel: &CancellationToken,
        observer: &dyn ProgressObserver,
        calc_index: usize,
        n: u64,
        opts: &Options,
    ) -> Result<Number, FibError> {
        let num_bits = 64 - n.leading_zeros();
        let frozen = observer.freeze();
        let mut fk = BigUint::ZERO;
        let mut fk1 = BigUint::one();

        for i in (0..num_bits).rev() {
            cancel.check_cancelled()?;

            let (f2k, f2k1) = Self::double(&fk, &fk1, opts.parallel_threshold);
            fk = f2k;
            fk1 = f2k1;

            if (n >> i) & 1 == 1 {
                std::mem::swap(&mut fk, &mut fk1);
                fk1 += &fk;
            }

            let update = ProgressUpdate::step(
                calc_index,
                NAME,
                u64::from(num_bits - i),
                u64::from(num_bits),
            );
            frozen.forward(observer, &update);
        }

        observer.on_progress(&ProgressUpdate::done(calc_index, NAME));
        Ok(Number::from_biguint(&fk))
    }

    fn name(&self) -> &'static str {
        NAME
    }
}
