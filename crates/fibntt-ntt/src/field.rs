//! Arithmetic modulo the prime `p = 2^64 - 2^32 + 1` and its root tables.
//!
//! `p - 1 = 2^32 * (2^32 - 1)`, so the field holds primitive `2^k`-th roots of
//! unity for every `k <= 32`. Every operation widens to `u128` and reduces
//! once, exploiting `2^64 = 2^32 - 1 (mod p)` and `2^96 = -1 (mod p)`.
//!
//! The root tables are built at compile time and live for the whole process;
//! concurrent transform tasks read them without synchronization.

use std::fmt;
use std::ops::{Add, Mul, Sub};

/// The field modulus.
pub const MODULUS: u64 = 0xFFFF_FFFF_0000_0001;

/// `2^64 mod p`.
const EPSILON: u64 = 0xFFFF_FFFF;

/// Largest `k` such that `2^k` divides `p - 1`.
pub const TWO_ADICITY: u32 = 32;

/// Generator of the multiplicative group.
const GENERATOR: u64 = 7;

/// Largest transform length (as a log) for which a squared-pair coefficient,
/// bounded by `3 * (N / 2) * (2^16 - 1)^2`, stays below the modulus.
pub const MAX_TRANSFORM_LOG: u32 = 31;

const TABLE_LEN: usize = TWO_ADICITY as usize + 1;

/// Reduce a double-width value into `[0, p)`.
#[allow(clippy::cast_possible_truncation)]
const fn reduce(x: u128) -> u64 {
    let lo = x as u64;
    let hi = (x >> 64) as u64;
    let hi_hi = hi >> 32;
    let hi_lo = hi & EPSILON;

    let (mut t0, borrow) = lo.overflowing_sub(hi_hi);
    if borrow {
        t0 = t0.wrapping_sub(EPSILON);
    }
    let (mut t1, carry) = t0.overflowing_add(hi_lo * EPSILON);
    if carry {
        t1 = t1.wrapping_add(EPSILON);
    }
    if t1 >= MODULUS {
        t1 - MODULUS
    } else {
        t1
    }
}

/// An element of the field, always held in canonical form `[0, p)`.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modular(u64);

impl Modular {
    /// Additive identity.
    pub const ZERO: Self = Self(0);
    /// Multiplicative identity.
    pub const ONE: Self = Self(1);

    /// Reduce an arbitrary `u64` into the field.
    #[must_use]
    #[allow(clippy::cast_lossless)]
    pub const fn new(value: u64) -> Self {
        Self(reduce(value as u128))
    }

    /// Canonical representative.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    #[must_use]
    #[allow(clippy::cast_lossless)]
    pub const fn add_mod(self, rhs: Self) -> Self {
        Self(reduce(self.0 as u128 + rhs.0 as u128))
    }

    #[must_use]
    #[allow(clippy::cast_lossless)]
    pub const fn sub_mod(self, rhs: Self) -> Self {
        Self(reduce(self.0 as u128 + (MODULUS - rhs.0) as u128))
    }

    #[must_use]
    #[allow(clippy::cast_lossless)]
    pub const fn mul_mod(self, rhs: Self) -> Self {
        Self(reduce(self.0 as u128 * rhs.0 as u128))
    }

    #[must_use]
    pub const fn double(self) -> Self {
        self.add_mod(self)
    }

    #[must_use]
    pub const fn square(self) -> Self {
        self.mul_mod(self)
    }

    /// `self^exponent` by square-and-multiply.
    ///
    /// Used to seed the twiddle factor of a worker task at an arbitrary
    /// offset inside a block, so tasks never share a running multiplier.
    #[must_use]
    pub const fn power(self, mut exponent: u64) -> Self {
        let mut base = self;
        let mut acc = Self::ONE;
        while exponent > 0 {
            if exponent & 1 == 1 {
                acc = acc.mul_mod(base);
            }
            base = base.square();
            exponent >>= 1;
        }
        acc
    }

    /// Multiplicative inverse (Fermat). The inverse of zero is zero.
    #[must_use]
    pub const fn inverse(self) -> Self {
        self.power(MODULUS - 2)
    }
}

impl fmt::Debug for Modular {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl Add for Modular {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        self.add_mod(rhs)
    }
}

impl Sub for Modular {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        self.sub_mod(rhs)
    }
}

impl Mul for Modular {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        self.mul_mod(rhs)
    }
}

/// Read-only tables indexed by transform depth `k`.
pub struct RootTables {
    forward: [Modular; TABLE_LEN],
    inverse: [Modular; TABLE_LEN],
    inverse_powers_of_two: [Modular; TABLE_LEN],
}

impl RootTables {
    const fn build() -> Self {
        let top = Modular(GENERATOR).power((MODULUS - 1) >> TWO_ADICITY);

        let mut forward = [Modular::ONE; TABLE_LEN];
        let mut inverse = [Modular::ONE; TABLE_LEN];
        forward[TABLE_LEN - 1] = top;
        inverse[TABLE_LEN - 1] = top.inverse();
        let mut k = TABLE_LEN - 1;
        while k > 0 {
            forward[k - 1] = forward[k].square();
            inverse[k - 1] = inverse[k].square();
            k -= 1;
        }

        let half = Modular(2).inverse();
        let mut inverse_powers_of_two = [Modular::ONE; TABLE_LEN];
        let mut k = 1;
        while k < TABLE_LEN {
            inverse_powers_of_two[k] = inverse_powers_of_two[k - 1].mul_mod(half);
            k += 1;
        }

        Self {
            forward,
            inverse,
            inverse_powers_of_two,
        }
    }

    /// Primitive `2^k`-th root of unity.
    #[must_use]
    pub const fn forward(&self, k: u32) -> Modular {
        self.forward[k as usize]
    }

    /// Inverse of [`forward(k)`](Self::forward).
    #[must_use]
    pub const fn inverse(&self, k: u32) -> Modular {
        self.inverse[k as usize]
    }

    /// `2^-k`, the normalization applied after an inverse transform of
    /// length `2^k`.
    #[must_use]
    pub const fn inverse_power_of_two(&self, k: u32) -> Modular {
        self.inverse_powers_of_two[k as usize]
    }
}

/// Process-wide root tables.
pub static ROOTS: RootTables = RootTables::build();
