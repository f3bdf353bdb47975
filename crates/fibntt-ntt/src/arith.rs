//! Portable limb arithmetic.

/// Add with carry: a + b + carry -> (sum, `new_carry`)
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn add_with_carry(a: u64, b: u64, carry: u64) -> (u64, u64) {
    let sum = u128::from(a) + u128::from(b) + u128::from(carry);
    (sum as u64, (sum >> 64) as u64)
}

/// `dst[..len] += src[..len]` as one ripple-carry pass, returning the carry
/// out of the top limb.
///
/// `src` may be shorter than `dst`; missing limbs read as zero.
pub fn add_assign_limbs(dst: &mut [u64], src: &[u64]) -> u64 {
    let mut carry = 0;
    for (i, limb) in dst.iter_mut().enumerate() {
        let rhs = src.get(i).copied().unwrap_or(0);
        if rhs == 0 && carry == 0 && i >= src.len() {
            break;
        }
        let (sum, c) = add_with_carry(*limb, rhs, carry);
        *limb = sum;
        carry = c;
    }
    carry
}

/// Number of significant limbs: trailing zeros stripped, never below one.
#[must_use]
pub fn significant_len(limbs: &[u64]) -> usize {
    limbs.iter().rposition(|&l| l != 0).map_or(1, |top| top + 1)
}
