//! Confidence bands drawn around forecast values

use crate::error::{ForecastError, Result};
use crate::models::FitQuality;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

/// How the band half-width around each forecast value is chosen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ConfidenceBand {
    /// Constant half-width in percentage points
    Fixed { half_width: f64 },
    /// Two-sided normal quantile for `confidence`, scaled by the in-sample RMSE
    Residual { confidence: f64 },
}

impl Default for ConfidenceBand {
    fn default() -> Self {
        ConfidenceBand::Fixed { half_width: 10.0 }
    }
}

impl ConfidenceBand {
    pub fn validate(&self) -> Result<()> {
        match *self {
            ConfidenceBand::Fixed { half_width } if !(half_width.is_finite() && half_width >= 0.0) => {
                Err(ForecastError::InvalidParameter(format!(
                    "Band half-width must be non-negative, got {}",
                    half_width
                )))
            }
            ConfidenceBand::Residual { confidence } if !(confidence > 0.0 && confidence < 1.0) => {
                Err(ForecastError::InvalidParameter(
                    "Confidence level must be between 0 and 1".to_string(),
                ))
            }
            _ => Ok(()),
        }
    }

    /// Distance from the forecast value to either band edge
    pub fn half_width(&self, quality: &FitQuality) -> Result<f64> {
        self.validate()?;

        match *self {
            ConfidenceBand::Fixed { half_width } => Ok(half_width),
            ConfidenceBand::Residual { confidence } => {
                let normal = Normal::new(0.0, 1.0)
                    .map_err(|e| ForecastError::InvalidParameter(e.to_string()))?;
                let z = normal.inverse_cdf(0.5 + confidence / 2.0);
                Ok(z * quality.rmse)
            }
        }
    }
}
