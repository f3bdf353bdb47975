//! Fixed-capacity limb storage.

use crate::arith::{add_assign_limbs, significant_len};
use crate::error::NttError;

/// One machine-word digit.
pub type Limb = u64;

/// Bits per limb.
pub const LIMB_BITS: u32 = Limb::BITS;

/// Allocate `len` default values, reporting exhaustion instead of aborting.
pub(crate) fn try_zeroed<T: Copy + Default>(len: usize) -> Result<Vec<T>, NttError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| NttError::Allocation(len))?;
    buf.resize(len, T::default());
    Ok(buf)
}

/// Limbs reserved for `F(index)`.
///
/// `F(n) < phi^(n-1) < 2^(3(n-1)/4)`, so `ceil(3n/4)` bits always suffice;
/// two extra limbs absorb the rounding and the carry of an increment step.
#[must_use]
pub fn capacity_for_index(index: u64) -> usize {
    let bits = index.saturating_mul(3).div_ceil(4);
    usize::try_from(bits / u64::from(LIMB_BITS) + 2).unwrap_or(usize::MAX)
}

/// A non-negative integer as little-endian limbs with a capacity fixed at
/// construction.
///
/// Limbs at or beyond the significant length are always zero, so any prefix
/// of the storage can be handed to the transcoder without clearing it first.
#[derive(Clone, PartialEq, Eq)]
pub struct DigitStore {
    limbs: Vec<Limb>,
    len: usize,
}

impl DigitStore {
    /// A zero value able to hold `capacity` limbs.
    pub fn with_capacity(capacity: usize) -> Result<Self, NttError> {
        let capacity = capacity.max(1);
        Ok(Self {
            limbs: try_zeroed(capacity)?,
            len: 1,
        })
    }

    /// A single-limb value able to hold `capacity` limbs.
    pub fn with_value(capacity: usize, value: Limb) -> Result<Self, NttError> {
        let mut store = Self::with_capacity(capacity)?;
        store.limbs[0] = value;
        Ok(store)
    }

    pub fn capacity(&self) -> usize {
        self.limbs.len()
    }

    /// Number of limbs up to and including the most significant non-zero
    /// one. Zero reports 1.
    pub fn significant_len(&self) -> usize {
        self.len
    }

    /// The significant limbs, least significant first.
    pub fn limbs(&self) -> &[Limb] {
        &self.limbs[..self.len]
    }

    pub fn is_zero(&self) -> bool {
        self.len == 1 && self.limbs[0] == 0
    }

    /// Release the significant limbs to the caller.
    pub fn into_limbs(mut self) -> Vec<Limb> {
        self.limbs.truncate(self.len);
        self.limbs.shrink_to_fit();
        self.limbs
    }

    /// The whole backing storage, including the zero tail.
    pub(crate) fn storage_mut(&mut self) -> &mut [Limb] {
        &mut self.limbs
    }

    pub(crate) fn set_significant_len(&mut self, len: usize) {
        assert!(
            (1..=self.limbs.len()).contains(&len),
            "significant length {len} outside capacity {}",
            self.limbs.len()
        );
        debug_assert!(self.limbs[len..].iter().all(|&l| l == 0));
        self.len = len;
    }

    /// `self += rhs` with one ripple-carry pass.
    ///
    /// # Panics
    ///
    /// Panics if the sum does not fit the reserved capacity, which the
    /// analytic bound in [`capacity_for_index`] rules out.
    pub fn add_assign(&mut self, rhs: &Self) {
        let span = self.len.max(rhs.len);
        let end = (span + 1).min(self.limbs.len());
        let carry = add_assign_limbs(&mut self.limbs[..end], rhs.limbs());
        assert_eq!(carry, 0, "digit store capacity {} exceeded", self.limbs.len());
        self.len = significant_len(&self.limbs[..end]);
    }
}

impl std::fmt::Debug for DigitStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigitStore")
            .field("len", &self.len)
            .field("capacity", &self.limbs.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_store_is_zero() {
        let store = DigitStore::with_capacity(4).unwrap();
        assert!(store.is_zero());
        assert_eq!(store.significant_len(), 1);
        assert_eq!(store.limbs(), &[0]);
        assert_eq!(store.capacity(), 4);
    }

    #[test]
    fn zero_capacity_still_holds_one_limb() {
        let store = DigitStore::with_capacity(0).unwrap();
        assert_eq!(store.capacity(), 1);
    }

    #[test]
    fn add_assign_grows_by_carry() {
        let mut a = DigitStore::with_value(3, u64::MAX).unwrap();
        let b = DigitStore::with_value(3, 1).unwrap();
        a.add_assign(&b);
        assert_eq!(a.limbs(), &[0, 1]);
        assert_eq!(a.significant_len(), 2);
    }

    #[test]
    #[should_panic(expected = "capacity")]
    fn add_assign_overflow_is_fault() {
        let mut a = DigitStore::with_value(1, u64::MAX).unwrap();
        let b = DigitStore::with_value(1, 1).unwrap();
        a.add_assign(&b);
    }

    #[test]
    fn into_limbs_trims() {
        let store = DigitStore::with_value(8, 42).unwrap();
        assert_eq!(store.into_limbs(), vec![42]);
    }

    #[test]
    fn capacity_bound_covers_known_values() {
        // F(93) fits one limb, F(94) needs two.
        assert!(capacity_for_index(93) >= 1);
        assert!(capacity_for_index(94) >= 2);
        assert_eq!(capacity_for_index(0), 2);
        // F(1000) has 694 bits.
        assert!(capacity_for_index(1000) * 64 >= 694 + 64);
    }

    #[test]
    fn huge_allocation_reports_error() {
        let err = try_zeroed::<u64>(usize::MAX).unwrap_err();
        assert_eq!(err, NttError::Allocation(usize::MAX));
    }
}
