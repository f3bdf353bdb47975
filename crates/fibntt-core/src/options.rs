//! Calculation options and configuration.

use crate::constants::DEFAULT_PARALLEL_THRESHOLD;

/// Options for Fibonacci calculation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Log2 of the task budget inside one transform squaring step.
    /// `None` derives it from the rayon pool; `Some(0)` is strictly sequential.
    pub parallelism_log: Option<u32>,
    /// Threshold (in bits) for parallel big-integer multiplication.
    pub parallel_threshold: usize,
    /// Whether to show verbose output.
    pub verbose: bool,
    /// Answer indices up to 93 from `FIB_TABLE` instead of running the
    /// backend. Verification runs turn this off.
    pub table_lookup: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            parallelism_log: None,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            verbose: false,
            table_lookup: true,
        }
    }
}

impl Options {
    /// Strictly sequential options.
    #[must_use]
    pub fn sequential() -> Self {
        Self {
            parallelism_log: Some(0),
            ..Self::default()
        }
    }

    /// The same options with the table shortcut disabled, so every index
    /// reaches the backend.
    #[must_use]
    pub fn backend_only(mut self) -> Self {
        self.table_lookup = false;
        self
    }

    /// Normalize options, applying defaults where values are zero and
    /// resolving an automatic parallelism budget.
    #[must_use]
    pub fn normalize(mut self) -> Self {
        if self.parallel_threshold == 0 {
            self.parallel_threshold = DEFAULT_PARALLEL_THRESHOLD;
        }
        self.parallelism_log = Some(self.parallelism_log());
        self
    }

    /// The effective parallelism exponent: the configured one, or the floor
    /// of log2 of the rayon pool size.
    #[must_use]
    pub fn parallelism_log(&self) -> u32 {
        self.parallelism_log
            .unwrap_or_else(|| rayon::current_num_threads().max(1).ilog2())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        let opts = Options::default();
        assert_eq!(opts.parallel_threshold, DEFAULT_PARALLEL_THRESHOLD);
        assert_eq!(opts.parallelism_log, None);
        assert!(!opts.verbose);
        assert!(opts.table_lookup);
    }

    #[test]
    fn backend_only_keeps_other_fields() {
        let opts = Options::sequential().backend_only();
        assert!(!opts.table_lookup);
        assert_eq!(opts.parallelism_log, Some(0));
        assert!(!opts.clone().normalize().table_lookup);
    }

    #[test]
    fn normalize_zero_threshold() {
        let opts = Options {
            parallel_threshold: 0,
            ..Default::default()
        };
        let normalized = opts.normalize();
        assert_eq!(normalized.parallel_threshold, DEFAULT_PARALLEL_THRESHOLD);
        assert!(normalized.parallelism_log.is_some());
    }

    #[test]
    fn explicit_parallelism_is_kept() {
        let opts = Options {
            parallelism_log: Some(3),
            ..Default::default()
        };
        assert_eq!(opts.clone().normalize().parallelism_log, Some(3));
        assert_eq!(Options::sequential().parallelism_log(), 0);
    }

    #[test]
    fn automatic_parallelism_fits_pool() {
        let log = Options::default().parallelism_log();
        assert!(1usize << log <= rayon::current_num_threads().max(1));
    }
}
