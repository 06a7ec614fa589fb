//! # Sentinel Math
//!
//! Numeric kernels used by the scene forecasting pipeline.
//! This crate provides an ordinary least-squares polynomial fit and the
//! in-sample fit-quality metrics reported alongside every fitted model.

use thiserror::Error;

pub mod fit_metrics;
pub mod regression;

pub use fit_metrics::{r_squared, root_mean_squared_error};
pub use regression::PolynomialFit;

/// Errors that can occur in numeric calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for numeric operations
pub type Result<T> = std::result::Result<T, MathError>;

/// Count the distinct values in a slice.
///
/// Values are compared exactly; NaN values are ignored.
pub fn distinct_count(values: &[f64]) -> usize {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted.dedup();
    sorted.len()
}
