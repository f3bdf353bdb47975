//! Iterative number-theoretic transform over bit-reversed buffers.
//!
//! A buffer of length `2^L` in bit-reversed order goes through `L` stages and
//! comes out in natural order. Stage `s` pairs elements `2^s` apart inside
//! blocks of `2^(s+1)` using powers of a primitive `2^(s+1)`-th root.
//!
//! Parallelism is bounded by a budget exponent: at most `2^budget` tasks are
//! live at once. Each stage spends the budget on independent blocks first and
//! hands any remainder to a split of the intra-block index range; every stage
//! joins before the next one starts.

use crate::error::NttError;
use crate::field::{Modular, ROOTS};
use crate::scope::{fan_out, fan_out_pair, CancelSignal};

/// Which root table a transform uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    /// Unnormalized: the result is scaled by the transform length.
    Inverse,
}

impl Direction {
    fn root(self, k: u32) -> Modular {
        match self {
            Self::Forward => ROOTS.forward(k),
            Self::Inverse => ROOTS.inverse(k),
        }
    }
}

/// One or two equally long channels that move through the butterfly network
/// in lockstep.
struct Lanes<'a> {
    a: &'a mut [Modular],
    b: Option<&'a mut [Modular]>,
}

impl<'a> Lanes<'a> {
    fn len(&self) -> usize {
        self.a.len()
    }

    fn is_empty(&self) -> bool {
        self.a.is_empty()
    }

    fn reborrow(&mut self) -> Lanes<'_> {
        Lanes {
            a: &mut *self.a,
            b: self.b.as_deref_mut(),
        }
    }

    fn split_at(self, mid: usize) -> (Lanes<'a>, Lanes<'a>) {
        let (a_lo, a_hi) = self.a.split_at_mut(mid);
        match self.b {
            Some(b) => {
                let (b_lo, b_hi) = b.split_at_mut(mid);
                (
                    Lanes { a: a_lo, b: Some(b_lo) },
                    Lanes { a: a_hi, b: Some(b_hi) },
                )
            }
            None => (Lanes { a: a_lo, b: None }, Lanes { a: a_hi, b: None }),
        }
    }

    /// Split into consecutive pieces of `width` elements.
    fn split_even(self, width: usize) -> Vec<Lanes<'a>> {
        let mut pieces = Vec::with_capacity(self.len().div_ceil(width.max(1)));
        let mut rest = self;
        while rest.len() > width {
            let (head, tail) = rest.split_at(width);
            pieces.push(head);
            rest = tail;
        }
        pieces.push(rest);
        pieces
    }
}

/// Transform one channel in place.
pub fn transform(
    buf: &mut [Modular],
    direction: Direction,
    budget: u32,
    signal: &dyn CancelSignal,
) -> Result<(), NttError> {
    run_stages(Lanes { a: buf, b: None }, direction, budget, signal)
}

/// Transform two equally long channels with the same stage schedule.
///
/// With a non-zero budget the channels become two concurrent tasks, each
/// splitting its own stages with what is left; otherwise they share one
/// lockstep pass.
pub fn transform_pair(
    a: &mut [Modular],
    b: &mut [Modular],
    direction: Direction,
    budget: u32,
    signal: &dyn CancelSignal,
) -> Result<(), NttError> {
    assert_eq!(a.len(), b.len(), "channel lengths differ");
    if budget == 0 {
        return run_stages(Lanes { a, b: Some(b) }, direction, 0, signal);
    }
    fan_out_pair(
        signal,
        |signal| transform(a, direction, budget - 1, signal),
        |signal| transform(b, direction, budget - 1, signal),
    )
}

fn run_stages(
    mut lanes: Lanes<'_>,
    direction: Direction,
    budget: u32,
    signal: &dyn CancelSignal,
) -> Result<(), NttError> {
    let len = lanes.len();
    debug_assert!(len.is_power_of_two());
    let log = len.trailing_zeros();
    for stage in 0..log {
        let root = direction.root(stage + 1);
        run_stage(lanes.reborrow(), log, stage, root, budget, signal)?;
    }
    Ok(())
}

/// One stage: `2^(log-stage-1)` blocks, sharded over up to `2^budget` tasks.
fn run_stage(
    lanes: Lanes<'_>,
    log: u32,
    stage: u32,
    root: Modular,
    budget: u32,
    signal: &dyn CancelSignal,
) -> Result<(), NttError> {
    let block_log = log - stage - 1;
    let shard_log = block_log.min(budget);
    let nested = budget - shard_log;
    let shard_len = lanes.len() >> shard_log;
    let block_len = 2usize << stage;

    fan_out(lanes.split_even(shard_len), signal, |_, shard, signal| {
        let mut rest = shard;
        while !rest.is_empty() {
            let (block, tail) = rest.split_at(block_len);
            butterfly_block(block, stage, root, nested, signal)?;
            rest = tail;
        }
        Ok(())
    })
}

fn butterfly_block(
    block: Lanes<'_>,
    stage: u32,
    root: Modular,
    nested: u32,
    signal: &dyn CancelSignal,
) -> Result<(), NttError> {
    let half = 1usize << stage;
    let (lo, hi) = block.split_at(half);
    let parts_log = stage.min(nested);
    if parts_log == 0 {
        butterfly_run(lo, hi, Modular::ONE, root);
        return Ok(());
    }

    let width = half >> parts_log;
    let runs: Vec<_> = lo
        .split_even(width)
        .into_iter()
        .zip(hi.split_even(width))
        .collect();
    fan_out(runs, signal, |part, (lo, hi), _| {
        let start = root.power((part * width) as u64);
        butterfly_run(lo, hi, start, root);
        Ok(())
    })
}

/// Butterflies over matching halves, starting from twiddle `start`.
fn butterfly_run(lo: Lanes<'_>, hi: Lanes<'_>, start: Modular, root: Modular) {
    let mut twiddle = start;
    match (lo.b, hi.b) {
        (Some(lo_b), Some(hi_b)) => {
            let pairs = lo.a.iter_mut().zip(hi.a.iter_mut());
            for ((xa, ya), (xb, yb)) in pairs.zip(lo_b.iter_mut().zip(hi_b.iter_mut())) {
                butterfly(xa, ya, twiddle);
                butterfly(xb, yb, twiddle);
                twiddle = twiddle * root;
            }
        }
        _ => {
            for (x, y) in lo.a.iter_mut().zip(hi.a.iter_mut()) {
                butterfly(x, y, twiddle);
                twiddle = twiddle * root;
            }
        }
    }
}

#[inline]
fn butterfly(even: &mut Modular, odd: &mut Modular, twiddle: Modular) {
    let t = twiddle * *odd;
    let e = *even;
    *even = e + t;
    *odd = e - t;
}

/// Reorder a natural-order buffer into bit-reversed order in place.
pub fn bit_reverse_permute(buf: &mut [Modular]) {
    let log = buf.len().trailing_zeros();
    for i in 0..buf.len() {
        let j = crate::transcode::bit_reverse(i, log);
        if i < j {
            buf.swap(i, j);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::MODULUS;
    use crate::scope::NeverCancel;
    use proptest::prelude::*;

    /// `O(n^2)` reference DFT of a natural-order input.
    fn naive_dft(input: &[Modular], direction: Direction) -> Vec<Modular> {
        let log = input.len().trailing_zeros();
        let root = direction.root(log);
        (0..input.len())
            .map(|k| {
                let step = root.power(k as u64);
                let mut w = Modular::ONE;
                let mut acc = Modular::ZERO;
                for &x in input {
                    acc = acc + x * w;
                    w = w * step;
                }
                acc
            })
            .collect()
    }

    fn sample(len: usize, seed: u64) -> Vec<Modular> {
        (0..len as u64)
            .map(|i| Modular::new(i.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ seed))
            .collect()
    }

    fn roundtrip(input: &[Modular], budget: u32) -> Vec<Modular> {
        let log = input.len().trailing_zeros();
        let mut buf = input.to_vec();
        bit_reverse_permute(&mut buf);
        transform(&mut buf, Direction::Forward, budget, &NeverCancel).unwrap();
        bit_reverse_permute(&mut buf);
        transform(&mut buf, Direction::Inverse, budget, &NeverCancel).unwrap();
        let scale = ROOTS.inverse_power_of_two(log);
        buf.iter().map(|&x| x * scale).collect()
    }

    #[test]
    fn forward_matches_naive_dft() {
        for log in 0..=6 {
            let input = sample(1 << log, 17);
            let mut buf = input.clone();
            bit_reverse_permute(&mut buf);
            transform(&mut buf, Direction::Forward, 0, &NeverCancel).unwrap();
            assert_eq!(buf, naive_dft(&input, Direction::Forward), "length 2^{log}");
        }
    }

    #[test]
    fn roundtrip_all_budgets() {
        for log in [1, 3, 8, 10] {
            let input = sample(1 << log, 3);
            for budget in 0..=4 {
                assert_eq!(roundtrip(&input, budget), input, "log {log} budget {budget}");
            }
        }
    }

    #[test]
    fn budget_does_not_change_result() {
        let input = sample(1 << 9, 99);
        let mut reference = input.clone();
        transform(&mut reference, Direction::Forward, 0, &NeverCancel).unwrap();
        for budget in 1..=6 {
            let mut buf = input.clone();
            transform(&mut buf, Direction::Forward, budget, &NeverCancel).unwrap();
            assert_eq!(buf, reference, "budget {budget}");
        }
    }

    #[test]
    fn pair_matches_single_channel() {
        let a = sample(256, 1);
        let b = sample(256, 2);
        let (mut ra, mut rb) = (a.clone(), b.clone());
        transform(&mut ra, Direction::Forward, 0, &NeverCancel).unwrap();
        transform(&mut rb, Direction::Forward, 0, &NeverCancel).unwrap();
        for budget in 0..=3 {
            let (mut pa, mut pb) = (a.clone(), b.clone());
            transform_pair(&mut pa, &mut pb, Direction::Forward, budget, &NeverCancel).unwrap();
            assert_eq!(pa, ra);
            assert_eq!(pb, rb);
        }
    }

    #[test]
    fn impulse_transforms_to_ones() {
        let mut buf = vec![Modular::ZERO; 16];
        buf[0] = Modular::ONE;
        transform(&mut buf, Direction::Forward, 2, &NeverCancel).unwrap();
        assert!(buf.iter().all(|&x| x == Modular::ONE));
    }

    #[test]
    fn cancelled_transform_reports_cancel() {
        struct Fired;
        impl CancelSignal for Fired {
            fn is_cancelled(&self) -> bool {
                true
            }
        }
        let mut buf = sample(64, 5);
        let err = transform(&mut buf, Direction::Forward, 3, &Fired).unwrap_err();
        assert_eq!(err, NttError::Cancelled);
    }

    proptest! {
        #[test]
        fn roundtrip_restores_input(
            values in prop::collection::vec(0..MODULUS, 1..=64usize),
            budget in 0u32..4,
        ) {
            let len = values.len().next_power_of_two();
            let mut input: Vec<Modular> = values.into_iter().map(Modular::new).collect();
            input.resize(len, Modular::ZERO);
            prop_assert_eq!(roundtrip(&input, budget), input);
        }
    }
}
