//! # fibntt-ntt
//!
//! Exact Fibonacci numbers by fast doubling, where every doubling step squares
//! the running pair with a number-theoretic transform over the prime field
//! `2^64 - 2^32 + 1`.
//!
//! Data flows `spread -> forward NTT -> pointwise combine -> inverse NTT -> fold`
//! once per index bit. Parallelism lives only inside one squaring step and is
//! bounded by a configured exponent (`0` runs everything on the calling thread).

pub mod arith;
pub mod digits;
pub mod doubling;
pub mod error;
pub mod field;
pub mod scope;
pub mod transcode;
pub mod transform;

// Re-exports
pub use digits::{DigitStore, Limb};
pub use doubling::{fibonacci, NttConfig, StepReport, MAX_INDEX};
pub use error::NttError;
pub use field::Modular;
pub use scope::{CancelSignal, NeverCancel};
