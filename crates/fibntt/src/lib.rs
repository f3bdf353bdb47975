//! fibntt library: application logic for the Fibonacci calculator.

pub mod app;
pub mod completion;
pub mod config;
pub mod errors;
pub mod output;
