//! # fibntt-orchestration
//!
//! Calculator selection, parallel cross-validated execution, and the timed
//! evaluation harness.

pub mod calculator_selection;
pub mod harness;
pub mod interfaces;
pub mod orchestrator;
mod supervisor;

pub use harness::{evaluate, search, Evaluation, Limits, ReportRow};
pub use interfaces::{CalculationResult, ResultPresenter};
pub use orchestrator::{analyze_comparison_results, execute_calculations};
