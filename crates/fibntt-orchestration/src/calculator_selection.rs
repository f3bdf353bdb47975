//! Calculator selection logic.

use std::sync::Arc;

use fibntt_core::calculator::{Calculator, FibError};
use fibntt_core::registry::CalculatorFactory;

/// Get calculators to run based on algorithm selection.
pub fn get_calculators_to_run(
    algo: &str,
    factory: &dyn CalculatorFactory,
) -> Result<Vec<Arc<dyn Calculator>>, FibError> {
    match algo {
        "all" => factory
            .available()
            .into_iter()
            .map(|name| factory.get(name))
            .collect(),
        name => Ok(vec![factory.get(name)?]),
    }
}
