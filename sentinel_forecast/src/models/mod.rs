//! Forecasting models for scene metric time series

use crate::confidence::ConfidenceBand;
use crate::data::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::metric::Metric;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fmt::{self, Debug};

pub mod polynomial;

pub use polynomial::{MetricModel, PolynomialTrend};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Lower bound of every tracked percentage
pub const PERCENT_MIN: f64 = 0.0;
/// Upper bound of every tracked percentage
pub const PERCENT_MAX: f64 = 100.0;

/// Clamp a model output to the valid percentage range
pub fn clamp_percentage(value: f64) -> f64 {
    value.clamp(PERCENT_MIN, PERCENT_MAX)
}

/// Fit quality of a trained model.
///
/// Both numbers are computed on the training data itself, with no holdout.
/// They describe how closely the curve follows the history, not how well it
/// generalises to unseen dates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitQuality {
    /// Coefficient of determination
    pub r_squared: f64,
    /// Root mean squared error, in percentage points
    pub rmse: f64,
    /// Number of observations used in fitting
    pub n_observations: usize,
}

/// Qualitative reading of an R² value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FitRating {
    Excellent,
    Good,
    Acceptable,
}

impl fmt::Display for FitRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FitRating::Excellent => "Excellent",
            FitRating::Good => "Good",
            FitRating::Acceptable => "Acceptable",
        };
        f.write_str(text)
    }
}

impl FitQuality {
    pub fn rating(&self) -> FitRating {
        if self.r_squared > 0.9 {
            FitRating::Excellent
        } else if self.r_squared > 0.7 {
            FitRating::Good
        } else {
            FitRating::Acceptable
        }
    }
}

impl fmt::Display for FitQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "R² {:.4}  RMSE {:.4}  (n={}, {})",
            self.r_squared,
            self.rmse,
            self.n_observations,
            self.rating()
        )
    }
}

/// How far past the last observation forecasts are generated
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Horizon {
    months: u32,
    step_days: f64,
    days_per_month: f64,
}

impl Horizon {
    /// Default spacing between forecast points
    pub const DEFAULT_STEP_DAYS: f64 = 5.0;
    /// Approximate month length used to convert months to days
    pub const DEFAULT_DAYS_PER_MONTH: f64 = 30.0;
    /// Most forecast points a single horizon may produce
    pub const MAX_POINTS: usize = 10_000;

    /// Create a horizon of `months` months, rejecting negative values
    pub fn new(months: i64) -> Result<Self> {
        let months = u32::try_from(months).map_err(|_| ForecastError::InvalidHorizon(months))?;

        Self {
            months,
            step_days: Self::DEFAULT_STEP_DAYS,
            days_per_month: Self::DEFAULT_DAYS_PER_MONTH,
        }
        .bounded()
    }

    pub fn with_step_days(mut self, step_days: f64) -> Result<Self> {
        if !(step_days.is_finite() && step_days > 0.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "Forecast step must be a positive number of days, got {}",
                step_days
            )));
        }
        self.step_days = step_days;
        self.bounded()
    }

    pub fn with_days_per_month(mut self, days_per_month: f64) -> Result<Self> {
        if !(days_per_month.is_finite() && days_per_month > 0.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "Days per month must be positive, got {}",
                days_per_month
            )));
        }
        self.days_per_month = days_per_month;
        self.bounded()
    }

    // Rejects horizons that would generate more than MAX_POINTS offsets
    fn bounded(self) -> Result<Self> {
        let steps = self.horizon_days() / self.step_days;
        if steps > (Self::MAX_POINTS + 1) as f64 {
            return Err(ForecastError::InvalidParameter(format!(
                "Horizon of {} months at {} day steps exceeds {} forecast points",
                self.months,
                self.step_days,
                Self::MAX_POINTS
            )));
        }
        Ok(self)
    }

    pub fn months(&self) -> u32 {
        self.months
    }

    pub fn step_days(&self) -> f64 {
        self.step_days
    }

    /// Horizon length in days
    pub fn horizon_days(&self) -> f64 {
        self.months as f64 * self.days_per_month
    }

    /// Elapsed-day offsets to forecast: `last + step`, `last + 2*step`, ...
    /// strictly below `last + horizon_days`
    pub fn offsets(&self, last_elapsed_day: f64) -> Vec<f64> {
        let horizon_days = self.horizon_days();
        (1u64..)
            .map(|k| self.step_days * k as f64)
            .take_while(|&offset| offset < horizon_days)
            .take(Self::MAX_POINTS)
            .map(|offset| last_elapsed_day + offset)
            .collect()
    }
}

/// One predicted future observation of a metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub future_timestamp: DateTime<Utc>,
    /// Offset on the series' elapsed-day axis
    pub elapsed_day: f64,
    /// Model output clamped to [0, 100]
    pub predicted_value: f64,
    /// Lower edge of the confidence band
    pub lower: f64,
    /// Upper edge of the confidence band
    pub upper: f64,
}

/// Timestamp `elapsed_day - last_elapsed_day` days after `last_timestamp`.
///
/// Fails when the offset falls outside the representable date range.
pub fn future_timestamp(
    last_timestamp: DateTime<Utc>,
    last_elapsed_day: f64,
    elapsed_day: f64,
) -> Result<DateTime<Utc>> {
    let out_of_range = || {
        ForecastError::InvalidParameter(format!(
            "Forecast date {} days after {} is out of range",
            elapsed_day - last_elapsed_day,
            last_timestamp.to_rfc3339()
        ))
    };

    let millis = ((elapsed_day - last_elapsed_day) * MILLIS_PER_DAY).round();
    if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
        return Err(out_of_range());
    }
    let offset = Duration::try_milliseconds(millis as i64).ok_or_else(out_of_range)?;
    last_timestamp
        .checked_add_signed(offset)
        .ok_or_else(out_of_range)
}

/// Trained forecast model for a single metric
pub trait TrainedForecastModel: Debug {
    /// Metric this model predicts
    fn metric(&self) -> Metric;

    /// In-sample fit quality
    fn fit_quality(&self) -> &FitQuality;

    /// Raw model output at an elapsed day, before clamping
    fn predict(&self, elapsed_day: f64) -> f64;

    /// Name of the model
    fn name(&self) -> &str;

    /// Generate forecast points past the last observation.
    ///
    /// Values are clamped after evaluation; band edges are clamped too.
    fn forecast(
        &self,
        last_timestamp: DateTime<Utc>,
        last_elapsed_day: f64,
        horizon: &Horizon,
        band: &ConfidenceBand,
    ) -> Result<Vec<ForecastPoint>> {
        let half_width = band.half_width(self.fit_quality())?;

        horizon
            .offsets(last_elapsed_day)
            .into_iter()
            .map(|elapsed_day| {
                let predicted_value = clamp_percentage(self.predict(elapsed_day));
                Ok(ForecastPoint {
                    future_timestamp: future_timestamp(
                        last_timestamp,
                        last_elapsed_day,
                        elapsed_day,
                    )?,
                    elapsed_day,
                    predicted_value,
                    lower: clamp_percentage(predicted_value - half_width),
                    upper: clamp_percentage(predicted_value + half_width),
                })
            })
            .collect()
    }

    /// Forecast anchored at the end of a series
    fn forecast_series(
        &self,
        series: &TimeSeries,
        horizon: &Horizon,
        band: &ConfidenceBand,
    ) -> Result<Vec<ForecastPoint>> {
        self.forecast(
            series.last_timestamp(),
            series.last_elapsed_day(),
            horizon,
            band,
        )
    }
}

/// Forecast model that can be trained on one metric of a time series
pub trait ForecastModel: Debug + Clone {
    /// The type of trained model produced
    type Trained: TrainedForecastModel;

    /// Train the model on the metric's present values
    fn train(&self, series: &TimeSeries, metric: Metric) -> Result<Self::Trained>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_negative_horizon_rejected() {
        assert!(matches!(Horizon::new(-1), Err(ForecastError::InvalidHorizon(-1))));
        assert!(Horizon::new(0).is_ok());
    }

    #[test]
    fn test_offsets_exclude_horizon_end() {
        let horizon = Horizon::new(2).unwrap();
        let offsets = horizon.offsets(40.0);

        assert_eq!(offsets.len(), 11);
        assert_eq!(offsets[0], 45.0);
        assert_eq!(offsets[10], 95.0);
    }

    #[test]
    fn test_zero_month_horizon_is_empty() {
        assert!(Horizon::new(0).unwrap().offsets(10.0).is_empty());
    }

    #[test]
    fn test_horizon_parameters_validated() {
        let horizon = Horizon::new(1).unwrap();
        assert!(horizon.with_step_days(0.0).is_err());
        assert!(horizon.with_days_per_month(f64::NAN).is_err());
        assert_eq!(
            horizon.with_step_days(7.0).unwrap().offsets(0.0),
            vec![7.0, 14.0, 21.0, 28.0]
        );
    }

    #[test]
    fn test_future_timestamp() {
        let last = Utc.with_ymd_and_hms(2024, 1, 31, 10, 0, 0).unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 2, 5, 22, 0, 0).unwrap();

        assert_eq!(future_timestamp(last, 40.0, 45.5).unwrap(), expected);
    }

    #[test]
    fn test_oversized_horizon_rejected() {
        let horizon = Horizon::new(2).unwrap();
        assert!(matches!(
            horizon.with_step_days(1e-6),
            Err(ForecastError::InvalidParameter(_))
        ));
        assert!(matches!(
            Horizon::new(i64::from(u32::MAX)),
            Err(ForecastError::InvalidParameter(_))
        ));

        let widest = Horizon::new(200_000_000)
            .unwrap()
            .with_step_days(1e8)
            .unwrap();
        assert_eq!(widest.offsets(0.0).len(), 59);
    }

    #[test]
    fn test_future_timestamp_out_of_range() {
        let last = Utc.with_ymd_and_hms(2024, 1, 31, 10, 0, 0).unwrap();

        assert!(matches!(
            future_timestamp(last, 0.0, 1e8),
            Err(ForecastError::InvalidParameter(_))
        ));
        assert!(future_timestamp(last, 0.0, 1e30).is_err());
        assert!(future_timestamp(last, 0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_rating_thresholds() {
        let quality = |r_squared| FitQuality {
            r_squared,
            rmse: 0.0,
            n_observations: 3,
        };

        assert_eq!(quality(0.95).rating(), FitRating::Excellent);
        assert_eq!(quality(0.9).rating(), FitRating::Good);
        assert_eq!(quality(0.71).rating(), FitRating::Good);
        assert_eq!(quality(0.2).rating(), FitRating::Acceptable);
    }
}
