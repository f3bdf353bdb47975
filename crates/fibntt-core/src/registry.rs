//! Calculator factory and registry.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::calculator::{Calculator, CoreCalculator, FibCalculator, FibError};
use crate::fastdoubling::BigIntFastDoubling;
use crate::linear::LinearSummation;
use crate::matrix::MatrixExponentiation;
use crate::naive::NaiveRecursion;
use crate::ntt::NttFastDoubling;

/// Factory trait for creating calculators.
pub trait CalculatorFactory: Send + Sync {
    /// Get or create a calculator by name.
    fn get(&self, name: &str) -> Result<Arc<dyn Calculator>, FibError>;

    /// List all available calculator names.
    fn available(&self) -> Vec<&str>;
}

/// Default factory with lazy creation and cache.
pub struct DefaultFactory {
    cache: RwLock<HashMap<String, Arc<dyn Calculator>>>,
}

impl DefaultFactory {
    /// Create a new default factory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn create_calculator(name: &str) -> Result<Arc<dyn Calculator>, FibError> {
        let core: Arc<dyn CoreCalculator> = match name {
            "ntt" => Arc::new(NttFastDoubling::new()),
            "fast" | "fastdoubling" => Arc::new(BigIntFastDoubling::new()),
            "matrix" => Arc::new(MatrixExponentiation::new()),
            "linear" => Arc::new(LinearSummation::new()),
            "naive" => Arc::new(NaiveRecursion::new()),
            #[cfg(feature = "gmp")]
            "gmp" => Arc::new(crate::calculator_gmp::GmpFibonacci::new()),
            _ => return Err(FibError::Config(format!("unknown calculator: {name}"))),
        };
        Ok(Arc::new(FibCalculator::new(core)))
    }
}

impl Default for DefaultFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl CalculatorFactory for DefaultFactory {
    fn get(&self, name: &str) -> Result<Arc<dyn Calculator>, FibError> {
        // Check cache first
        if let Some(calc) = self.cache.read().get(name) {
            return Ok(Arc::clone(calc));
        }

        // Create and cache
        let calc = Self::create_calculator(name)?;
        self.cache
            .write()
            .insert(name.to_string(), Arc::clone(&calc));
        Ok(calc)
    }

    fn available(&self) -> Vec<&str> {
        let mut names = vec!["ntt", "fast", "matrix", "linear", "naive"];
        if cfg!(feature = "gmp") {
            names.push("gmp");
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_creates_every_backend() {
        let factory = DefaultFactory::new();
        let expected = [
            ("ntt", "NttFastDoubling"),
            ("fast", "FastDoubling"),
            ("matrix", "MatrixExponentiation"),
            ("linear", "LinearSummation"),
            ("naive", "NaiveRecursion"),
        ];
        for (key, name) in expected {
            assert_eq!(factory.get(key).unwrap().name(), name);
        }
    }

    #[test]
    fn factory_caches() {
        let factory = DefaultFactory::new();
        let calc1 = factory.get("ntt").unwrap();
        let calc2 = factory.get("ntt").unwrap();
        assert!(Arc::ptr_eq(&calc1, &calc2));
    }

    #[test]
    fn factory_unknown_name() {
        let factory = DefaultFactory::new();
        assert!(matches!(factory.get("nonexistent"), Err(FibError::Config(_))));
    }

    #[test]
    fn factory_available() {
        let factory = DefaultFactory::new();
        let available = factory.available();
        for name in &available {
            assert!(factory.get(name).is_ok(), "{name} listed but not creatable");
        }
        assert!(available.contains(&"ntt"));
        assert_eq!(available.contains(&"gmp"), cfg!(feature = "gmp"));
    }
}
