//! # fibntt-core
//!
//! Backend contract and backends for exact Fibonacci numbers. Every backend
//! answers the same question, `F(n)` as an owned little-endian byte string,
//! so they can be swapped, raced and cross-checked.

pub mod calculator;
pub mod constants;
pub mod fastdoubling;
pub mod linear;
pub mod matrix;
pub mod naive;
pub mod ntt;
pub mod number;
pub mod observer;
pub mod observers;
pub mod options;
pub mod progress;
pub mod registry;

#[cfg(feature = "gmp")]
pub mod calculator_gmp;

// Re-exports
pub use calculator::{Calculator, CoreCalculator, FibCalculator, FibError};
pub use constants::{exit_codes, FIB_TABLE, MAX_FIB_U64, PROGRESS_REPORT_THRESHOLD};
pub use number::{host_endianness, Endianness, Number};
pub use observer::{FrozenObserver, ProgressObserver};
pub use options::Options;
pub use progress::{CancellationToken, ProgressUpdate};
pub use registry::{CalculatorFactory, DefaultFactory};

/// Compute F(n) with the transform backend and default options.
///
/// For progress, cancellation or another backend, use the `Calculator`
/// trait directly.
///
/// # Example
/// ```
/// assert_eq!(fibntt_core::fibonacci(10).unwrap().to_string(), "55");
/// assert_eq!(fibntt_core::fibonacci(0).unwrap().byte_len(), 8);
/// ```
pub fn fibonacci(n: u64) -> Result<Number, FibError> {
    use ntt::NttFastDoubling;
    use observers::NoOpObserver;

    let calc = FibCalculator::new(std::sync::Arc::new(NttFastDoubling::new()));
    calc.calculate(
        &CancellationToken::new(),
        &NoOpObserver::new(),
        0,
        n,
        &Options::default(),
    )
}
