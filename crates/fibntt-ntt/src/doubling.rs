//! Fast doubling driven by transform squaring.
//!
//! The running pair `(A, B) = (F(m-1), F(m))` starts at `(1, 0)` and consumes
//! the index from its most significant bit. Every bit squares the pair,
//! `(A, B) <- (A^2 + B^2, 2AB + B^2)`, and a set bit then steps it,
//! `(A, B) <- (B, A + B)`. After the last bit `B = F(index)`.

use tracing::{debug, trace};

use crate::digits::{capacity_for_index, try_zeroed, DigitStore};
use crate::error::NttError;
use crate::field::{Modular, MAX_TRANSFORM_LOG};
use crate::scope::{fan_out_pair, CancelSignal};
use crate::transcode::{bit_reverse, fold, spread, transform_log};
use crate::transform::{transform_pair, Direction};

/// Largest index whose squaring steps fit the largest supported transform.
pub const MAX_INDEX: u64 = 1 << 34;

/// Driver configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NttConfig {
    /// At most `2^parallelism_log` tasks run at once inside one squaring
    /// step. Zero keeps everything on the calling thread.
    pub parallelism_log: u32,
}

impl NttConfig {
    #[must_use]
    pub fn sequential() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_parallelism_log(parallelism_log: u32) -> Self {
        Self { parallelism_log }
    }
}

/// Emitted after each consumed index bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    /// Bits consumed so far.
    pub step: u32,
    /// Total significant bits of the index.
    pub total_steps: u32,
    /// Significant limbs of the pair after the step.
    pub len: usize,
    /// Transform length (as a log) used by the step.
    pub transform_log: u32,
}

/// The running pair. Dropped wholesale on error, so a half-updated pair is
/// never observable.
struct FibPair {
    a: DigitStore,
    b: DigitStore,
}

/// Both channels of a transform-domain pair.
struct Spectrum {
    a: Vec<Modular>,
    b: Vec<Modular>,
    log: u32,
}

impl FibPair {
    fn new(capacity: usize) -> Result<Self, NttError> {
        Ok(Self {
            a: DigitStore::with_value(capacity, 1)?,
            b: DigitStore::with_capacity(capacity)?,
        })
    }

    fn len(&self) -> usize {
        self.a.significant_len().max(self.b.significant_len())
    }

    /// `(A, B) <- (A^2 + B^2, 2AB + B^2)`. Returns the transform log used.
    fn square(&mut self, budget: u32, signal: &dyn CancelSignal) -> Result<u32, NttError> {
        let len = self.len();
        let log = transform_log(len);
        assert!(
            log <= MAX_TRANSFORM_LOG,
            "transform of 2^{log} slots exceeds the field's exact range"
        );

        let mut current = self.spread_into(len, log, budget, signal)?;
        transform_pair(&mut current.a, &mut current.b, Direction::Forward, budget, signal)?;
        let mut next = current.combine()?;
        transform_pair(&mut next.a, &mut next.b, Direction::Inverse, budget, signal)?;
        self.fold_from(&next, budget, signal)?;
        Ok(log)
    }

    /// `(A, B) <- (B, A + B)`.
    fn increment(&mut self) {
        std::mem::swap(&mut self.a, &mut self.b);
        self.b.add_assign(&self.a);
    }

    fn spread_into(
        &mut self,
        len: usize,
        log: u32,
        budget: u32,
        signal: &dyn CancelSignal,
    ) -> Result<Spectrum, NttError> {
        let a_src = &mut self.a.storage_mut()[..len];
        let b_src = &mut self.b.storage_mut()[..len];
        let (a, b) = if budget == 0 {
            (spread(a_src, log)?, spread(b_src, log)?)
        } else {
            let (mut a, mut b) = (None, None);
            fan_out_pair(
                signal,
                |_| {
                    a = Some(spread(a_src, log)?);
                    Ok(())
                },
                |_| {
                    b = Some(spread(b_src, log)?);
                    Ok(())
                },
            )?;
            match (a, b) {
                (Some(a), Some(b)) => (a, b),
                _ => return Err(NttError::TaskFailed("spread produced no buffer".into())),
            }
        };
        Ok(Spectrum { a, b, log })
    }

    fn fold_from(
        &mut self,
        spectrum: &Spectrum,
        budget: u32,
        signal: &dyn CancelSignal,
    ) -> Result<(), NttError> {
        let log = spectrum.log;
        let (a_len, b_len) = if budget == 0 {
            (
                fold(&spectrum.a, log, self.a.storage_mut()),
                fold(&spectrum.b, log, self.b.storage_mut()),
            )
        } else {
            let (mut a_len, mut b_len) = (1, 1);
            let (a_dst, b_dst) = (self.a.storage_mut(), self.b.storage_mut());
            fan_out_pair(
                signal,
                |_| {
                    a_len = fold(&spectrum.a, log, a_dst);
                    Ok(())
                },
                |_| {
                    b_len = fold(&spectrum.b, log, b_dst);
                    Ok(())
                },
            )?;
            (a_len, b_len)
        };
        self.a.set_significant_len(a_len);
        self.b.set_significant_len(b_len);
        Ok(())
    }

    fn into_value(self) -> DigitStore {
        self.b
    }
}

impl Spectrum {
    /// Pointwise `(x^2 + y^2, y(2x + y))`, written in bit-reversed order so
    /// the result feeds the inverse transform directly. Consumes the forward
    /// spectrum; the returned one replaces it.
    fn combine(self) -> Result<Self, NttError> {
        let size = self.a.len();
        let mut a = try_zeroed(size)?;
        let mut b = try_zeroed(size)?;
        for (i, (&x, &y)) in self.a.iter().zip(&self.b).enumerate() {
            let r = bit_reverse(i, self.log);
            a[r] = x.square() + y.square();
            b[r] = y * (x.double() + y);
        }
        Ok(Self { a, b, log: self.log })
    }
}

/// Compute `F(index)` exactly.
///
/// `on_step` is called after every consumed index bit. The signal is polled
/// between bits and at every task fan-out; once it fires the computation
/// unwinds with [`NttError::Cancelled`] and the partial pair is discarded.
pub fn fibonacci(
    index: u64,
    config: &NttConfig,
    signal: &dyn CancelSignal,
    mut on_step: impl FnMut(StepReport),
) -> Result<DigitStore, NttError> {
    if index > MAX_INDEX {
        return Err(NttError::IndexOutOfRange(index, MAX_INDEX));
    }
    let capacity = capacity_for_index(index);
    let mut pair = FibPair::new(capacity)?;
    let total_steps = u64::BITS - index.leading_zeros();
    debug!(
        index,
        capacity,
        parallelism_log = config.parallelism_log,
        "starting transform fast doubling"
    );

    for step in 1..=total_steps {
        if signal.is_cancelled() {
            return Err(NttError::Cancelled);
        }
        let log = pair.square(config.parallelism_log, signal)?;
        if (index >> (total_steps - step)) & 1 == 1 {
            pair.increment();
        }
        let len = pair.len();
        trace!(step, total_steps, len, transform_log = log, "doubling step");
        on_step(StepReport {
            step,
            total_steps,
            len,
            transform_log: log,
        });
    }

    let value = pair.into_value();
    debug!(index, limbs = value.significant_len(), "fast doubling finished");
    Ok(value)
}
