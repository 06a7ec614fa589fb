//! Error types for the sentinel_forecast crate

use crate::metric::Metric;
use polars::prelude::PolarsError;
use sentinel_math::MathError;
use thiserror::Error;

/// Custom error types for the sentinel_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// No observation survived timestamp normalization
    #[error("No data: no observation has a valid timestamp")]
    NoData,

    /// Too few distinct time points to fit a metric
    #[error("Insufficient data for {metric}: {distinct} distinct time points, {required} required")]
    InsufficientData {
        metric: Metric,
        distinct: usize,
        required: usize,
    },

    /// Every requested metric was skipped
    #[error("No models fit: every metric was skipped")]
    NoModelsFit,

    /// Negative forecast horizon
    #[error("Invalid horizon: {0} months (must be >= 0)")]
    InvalidHorizon(i64),

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from numeric kernels
    #[error("Math error: {0}")]
    MathError(#[from] MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from CSV reading or writing
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error from JSON parsing or serialization
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl ForecastError {
    /// Whether the error only affects a single metric and the run may continue
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ForecastError::InsufficientData { .. } | ForecastError::MathError(_)
        )
    }
}
