//! Orchestration interfaces.

use std::time::Duration;

use fibntt_core::calculator::FibError;
use fibntt_core::number::Number;

/// Trait for presenting results to the user.
pub trait ResultPresenter {
    /// Present a calculation result.
    fn present_result(
        &mut self,
        algorithm: &str,
        n: u64,
        result: &Number,
        duration: Duration,
    ) -> std::io::Result<()>;

    /// Present a comparison of several backends.
    fn present_comparison(&mut self, results: &[CalculationResult]) -> std::io::Result<()>;

    /// Present an error.
    fn present_error(&mut self, algorithm: &str, error: &FibError) -> std::io::Result<()>;
}

/// Result of a single calculation.
#[derive(Debug, Clone)]
pub struct CalculationResult {
    /// Algorithm name.
    pub algorithm: String,
    /// The computed value or a structured error.
    pub outcome: Result<Number, FibError>,
    /// Computation duration.
    pub duration: Duration,
}

impl CalculationResult {
    #[must_use]
    pub fn value(&self) -> Option<&Number> {
        self.outcome.as_ref().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calculation_result() {
        let result = CalculationResult {
            algorithm: "NttFastDoubling".into(),
            outcome: Ok(Number::from_u64(55)),
            duration: Duration::from_millis(100),
        };
        assert_eq!(result.algorithm, "NttFastDoubling");
        assert_eq!(result.value(), Some(&Number::from_u64(55)));
    }

    #[test]
    fn failed_result_has_no_value() {
        let result = CalculationResult {
            algorithm: "NaiveRecursion".into(),
            outcome: Err(FibError::Overflow(94, "NaiveRecursion")),
            duration: Duration::ZERO,
        };
        assert!(result.value().is_none());
    }
}
