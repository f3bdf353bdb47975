//! Conversion between limbs and transform-radix slots.
//!
//! A limb is split into `2^EXPANSION_LOG` digits of `RADIX_BITS` bits each.
//! The narrow radix keeps every coefficient of a squared pair below the
//! field modulus, so the inverse transform yields exact integers.

use crate::digits::{try_zeroed, Limb, LIMB_BITS};
use crate::error::NttError;
use crate::field::{Modular, ROOTS};

/// Bits per transform digit.
pub const RADIX_BITS: u32 = 16;

/// `log2` of the number of transform digits per limb.
pub const EXPANSION_LOG: u32 = 2;

const DIGITS_PER_LIMB: usize = 1 << EXPANSION_LOG;
const RADIX_MASK: u64 = (1 << RADIX_BITS) - 1;

const _: () = assert!(RADIX_BITS << EXPANSION_LOG == LIMB_BITS);

/// Reverse the low `log` bits of `index`.
#[inline]
#[must_use]
pub fn bit_reverse(index: usize, log: u32) -> usize {
    if log == 0 {
        0
    } else {
        index.reverse_bits() >> (usize::BITS - log)
    }
}

/// Smallest `k` with `2^k >= len`.
#[must_use]
pub fn ceil_log2(len: usize) -> u32 {
    len.max(1).next_power_of_two().trailing_zeros()
}

/// Transform length (as a log) for squaring a `len`-limb operand: the next
/// power of two covering twice the operand, in transform digits.
#[must_use]
pub fn transform_log(len: usize) -> u32 {
    ceil_log2(len) + 1 + EXPANSION_LOG
}

/// Move `src` into a fresh `2^log` buffer in bit-reversed slot order,
/// zeroing the limbs as they are consumed.
pub fn spread(src: &mut [Limb], log: u32) -> Result<Vec<Modular>, NttError> {
    let size = 1usize << log;
    debug_assert!(src.len() * DIGITS_PER_LIMB * 2 <= size);
    let mut buf = try_zeroed(size)?;
    for (limb_index, limb) in src.iter_mut().enumerate() {
        let mut value = std::mem::take(limb);
        let base = limb_index << EXPANSION_LOG;
        for k in 0..DIGITS_PER_LIMB {
            buf[bit_reverse(base + k, log)] = Modular::new(value & RADIX_MASK);
            value >>= RADIX_BITS;
        }
    }
    Ok(buf)
}

/// Fold a natural-order inverse transform of length `2^log` back into limbs.
///
/// Each slot is scaled by `2^-log`, carries ripple through a 128-bit
/// accumulator, and every window of `2^EXPANSION_LOG` output digits becomes
/// one limb of `dst`. Returns the significant limb count (1 for zero).
#[allow(clippy::cast_possible_truncation)]
pub fn fold(buf: &[Modular], log: u32, dst: &mut [Limb]) -> usize {
    debug_assert_eq!(buf.len(), 1 << log);
    let scale = ROOTS.inverse_power_of_two(log);
    let mut carry = 0u128;
    let mut top = None;
    for (window_index, window) in buf.chunks(DIGITS_PER_LIMB).enumerate() {
        let mut limb = 0;
        let mut shift = 0;
        for &slot in window {
            carry += u128::from((slot * scale).value());
            limb |= ((carry as u64) & RADIX_MASK) << shift;
            carry >>= RADIX_BITS;
            shift += RADIX_BITS;
        }
        if limb != 0 {
            top = Some(window_index);
        }
        match dst.get_mut(window_index) {
            Some(slot) => *slot = limb,
            None => assert_eq!(limb, 0, "fold overran its destination"),
        }
    }
    debug_assert_eq!(carry, 0, "fold left a carry");
    top.map_or(1, |top| top + 1)
}
