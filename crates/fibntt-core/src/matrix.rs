//! Matrix Exponentiation algorithm for Fibonacci computation.
//!
//! Computes F(n) via Q^n where Q = [[1,1],[1,0]], using binary
//! exponentiation (square-and-multiply). Every power of Q is symmetric,
//! `Q^k = [[F(k+1), F(k)], [F(k), F(k-1)]]`, so three entries suffice.

use num_bigint::BigUint;
use num_traits::{One, Zero};

use crate::calculator::{CoreCalculator, FibError};
use crate::number::Number;
use crate::observer::ProgressObserver;
use crate::options::Options;
use crate::progress::{CancellationToken, ProgressUpdate};

const NAME: &str = "MatrixExponentiation";

/// A symmetric 2x2 matrix `[[a, b], [b, c]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SymmetricMatrix {
    a: BigUint,
    b: BigUint,
    c: BigUint,
}

impl SymmetricMatrix {
    fn identity() -> Self {
        Self {
            a: BigUint::one(),
            b: BigUint::zero(),
            c: BigUint::one(),
        }
    }

    /// `M^2`, which stays symmetric.
    fn square(&self) -> Self {
        let b_sq = &self.b * &self.b;
        Self {
            a: &self.a * &self.a + &b_sq,
            b: &self.b * (&self.a + &self.c),
            c: b_sq + &self.c * &self.c,
        }
    }

    /// `M * Q`. For a power of Q this is `[[a + b, a], [a, b]]`.
    fn step(self) -> Self {
        Self {
            c: self.b.clone(),
            a: &self.a + &self.b,
            b: self.a,
        }
    }
}

/// Matrix Exponentiation calculator.
pub struct MatrixExponentiation;

impl MatrixExponentiation {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for MatrixExponentiation {
    fn default() -> Self {
        Self::new()
    }
}

impl CoreCalculator for MatrixExponentiation {
    fn calculate_core(
        &self,
        cancel: &CancellationToken,
        observer: &dyn ProgressObserver,
        calc_index: usize,
        n: u64,
        _opts: &Options,
    ) -> Result<Number, FibError> {
        let num_bits = 64 - n.leading_zeros();
        let frozen = observer.freeze();
        let mut result = SymmetricMatrix::identity();

        for i in (0..num_bits).rev() {
            cancel.check_cancelled()?;

            result = result.square();
            if (n >> i) & 1 == 1 {
                result = result.step();
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
        Ok(Number::from_biguint(&result.b))
    }

    fn name(&self) -> &'static str {
        NAME
    }
}
