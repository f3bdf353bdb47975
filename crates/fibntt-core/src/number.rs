//! Exact result encoding shared by every backend.
//!
//! A [`Number`] owns its bytes least significant first, always a whole
//! number of 64-bit limbs, with trailing zero limbs stripped. Zero is one
//! zero limb. The byte order of the encoding never depends on the host.

use std::fmt;

use num_bigint::BigUint;
use serde::Serialize;

/// Bytes per limb of the encoding.
pub const LIMB_BYTES: usize = 8;

/// An exact non-negative integer.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Number {
    bytes: Vec<u8>,
}

impl Number {
    /// Zero, encoded as a single zero limb.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            bytes: vec![0; LIMB_BYTES],
        }
    }

    #[must_use]
    pub fn from_u64(value: u64) -> Self {
        Self {
            bytes: value.to_le_bytes().to_vec(),
        }
    }

    /// Encode little-endian limbs.
    #[must_use]
    pub fn from_limbs(limbs: &[u64]) -> Self {
        let len = limbs.iter().rposition(|&l| l != 0).map_or(1, |top| top + 1);
        let mut bytes = Vec::with_capacity(len * LIMB_BYTES);
        for limb in limbs.iter().take(len) {
            bytes.extend_from_slice(&limb.to_le_bytes());
        }
        if bytes.is_empty() {
            return Self::zero();
        }
        Self { bytes }
    }

    /// Decode any little-endian byte string, padding a partial top limb and
    /// dropping superfluous zero limbs.
    #[must_use]
    pub fn from_bytes_le(bytes: &[u8]) -> Self {
        let limbs: Vec<u64> = bytes
            .chunks(LIMB_BYTES)
            .map(|chunk| {
                let mut limb = [0u8; LIMB_BYTES];
                limb[..chunk.len()].copy_from_slice(chunk);
                u64::from_le_bytes(limb)
            })
            .collect();
        Self::from_limbs(&limbs)
    }

    #[must_use]
    pub fn from_biguint(value: &BigUint) -> Self {
        Self::from_limbs(&value.to_u64_digits())
    }

    /// The encoded bytes, least significant first.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Hand the encoded bytes to the caller.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn limb_len(&self) -> usize {
        self.bytes.len() / LIMB_BYTES
    }

    /// Decode into little-endian limbs.
    #[must_use]
    pub fn limbs(&self) -> Vec<u64> {
        self.bytes
            .chunks_exact(LIMB_BYTES)
            .map(|chunk| {
                let mut limb = [0u8; LIMB_BYTES];
                limb.copy_from_slice(chunk);
                u64::from_le_bytes(limb)
            })
            .collect()
    }

    #[must_use]
    pub fn to_biguint(&self) -> BigUint {
        BigUint::from_bytes_le(&self.bytes)
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.bytes.iter().all(|&b| b == 0)
    }

    /// Every encoded byte as two lowercase hex digits, most significant byte
    /// first. Leading zero bytes of the top limb are kept.
    #[must_use]
    pub fn to_hex(&self) -> String {
        use fmt::Write;

        let mut out = String::with_capacity(self.bytes.len() * 2);
        for byte in self.bytes.iter().rev() {
            let _ = write!(out, "{byte:02x}");
        }
        out
    }
}

impl Default for Number {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_biguint(), f)
    }
}

impl fmt::Debug for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Number({} limbs, 0x{})", self.limb_len(), self.to_hex())
    }
}

impl From<&BigUint> for Number {
    fn from(value: &BigUint) -> Self {
        Self::from_biguint(value)
    }
}

/// Host byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    Little,
    Big,
}

impl fmt::Display for Endianness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Little => f.write_str("little"),
            Self::Big => f.write_str("big"),
        }
    }
}

/// Probe the host byte order from the in-memory layout of `0xAABB`.
#[must_use]
pub fn host_endianness() -> Endianness {
    match 0xAABB_u16.to_ne_bytes() {
        [0xBB, 0xAA] => Endianness::Little,
        _ => Endianness::Big,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn zero_is_one_limb() {
        let zero = Number::zero();
        assert_eq!(zero.byte_len(), 8);
        assert_eq!(zero.limb_len(), 1);
        assert!(zero.is_zero());
        assert_eq!(Number::from_limbs(&[]), zero);
        assert_eq!(Number::from_limbs(&[0, 0, 0]), zero);
        assert_eq!(Number::from_bytes_le(&[]), zero);
    }

    #[test]
    fn strips_trailing_zero_limbs() {
        let n = Number::from_limbs(&[5, 0, 0]);
        assert_eq!(n.limb_len(), 1);
        assert_eq!(n.limbs(), vec![5]);
    }

    #[test]
    fn bytes_are_least_significant_first() {
        let n = Number::from_u64(0x0102);
        assert_eq!(n.bytes(), &[0x02, 0x01, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn decode_pads_partial_limb() {
        let n = Number::from_bytes_le(&[0x37]);
        assert_eq!(n.limbs(), vec![0x37]);
        let n = Number::from_bytes_le(&[0, 0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(n.limbs(), vec![0, 1]);
    }

    #[test]
    fn hex_is_most_significant_first() {
        assert_eq!(Number::from_u64(55).to_hex(), "0000000000000037");
        assert_eq!(
            Number::from_limbs(&[0, 1]).to_hex(),
            "00000000000000010000000000000000"
        );
    }

    #[test]
    fn display_is_decimal() {
        assert_eq!(Number::from_u64(6765).to_string(), "6765");
        assert_eq!(Number::zero().to_string(), "0");
        let big = Number::from_limbs(&[0, 1]);
        assert_eq!(big.to_string(), "18446744073709551616");
    }

    #[test]
    fn biguint_conversions() {
        let value = BigUint::from(u128::MAX);
        let n = Number::from_biguint(&value);
        assert_eq!(n.limbs(), vec![u64::MAX, u64::MAX]);
        assert_eq!(n.to_biguint(), value);
        assert_eq!(Number::from(&BigUint::from(0u8)), Number::zero());
    }

    #[test]
    fn host_endianness_matches_target() {
        let expected = if cfg!(target_endian = "little") {
            Endianness::Little
        } else {
            Endianness::Big
        };
        assert_eq!(host_endianness(), expected);
        assert_eq!(Endianness::Little.to_string(), "little");
    }

    proptest! {
        #[test]
        fn reencoding_preserves_bytes(limbs in prop::collection::vec(any::<u64>(), 0..12)) {
            let n = Number::from_limbs(&limbs);
            let decoded = Number::from_bytes_le(n.bytes());
            prop_assert_eq!(decoded.bytes(), n.bytes());
            prop_assert_eq!(n.byte_len() % LIMB_BYTES, 0);
            let top = &n.bytes()[n.byte_len() - LIMB_BYTES..];
            prop_assert!(n.limb_len() == 1 || top.iter().any(|&b| b != 0));
        }
    }
}
