//! Transform-squaring fast doubling backend.
//!
//! Bridges the limb-level driver in `fibntt-ntt` to the calculator contract:
//! the options' parallelism exponent becomes the driver's task budget, the
//! cancellation token is the driver's cancel signal, and every consumed
//! index bit becomes a progress update.

use fibntt_ntt::{fibonacci, NttConfig};

use crate::calculator::{CoreCalculator, FibError};
use crate::number::Number;
use crate::observer::ProgressObserver;
use crate::options::Options;
use crate::progress::{CancellationToken, ProgressUpdate};

const NAME: &str = "NttFastDoubling";

/// Fast doubling where every step squares the pair with an NTT.
///
/// # Example
/// ```
/// use fibntt_core::ntt::NttFastDoubling;
/// use fibntt_core::calculator::CoreCalculator;
/// use fibntt_core::observers::NoOpObserver;
/// use fibntt_core::options::Options;
/// use fibntt_core::progress::CancellationToken;
///
/// let calc = NttFastDoubling::new();
/// let cancel = CancellationToken::new();
/// let observer = NoOpObserver::new();
/// let result = calc.calculate_core(&cancel, &observer, 0, 100, &Options::default()).unwrap();
/// assert_eq!(result.to_string(), "354224848179261915075");
/// ```
pub struct NttFastDoubling;

impl NttFastDoubling {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for NttFastDoubling {
    fn default() -> Self {
        Self::new()
    }
}

impl CoreCalculator for NttFastDoubling {
    fn calculate_core(
        &self,
        cancel: &CancellationToken,
        observer: &dyn ProgressObserver,
        calc_index: usize,
        n: u64,
        opts: &Options,
    ) -> Result<Number, FibError> {
        let config = NttConfig::with_parallelism_log(opts.parallelism_log());
        let frozen = observer.freeze();

        let value = fibonacci(n, &config, cancel, |report| {
            let update = ProgressUpdate::step(
                calc_index,
                NAME,
                u64::from(report.step),
                u64::from(report.total_steps),
            );
            frozen.forward(observer, &update);
        })?;

        observer.on_progress(&ProgressUpdate::done(calc_index, NAME));
        Ok(Number::from_limbs(&value.into_limbs()))
    }

    fn name(&self) -> &'static str {
        NAME
    }
}
