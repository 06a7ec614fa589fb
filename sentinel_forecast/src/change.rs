//! Change analysis between the latest observation and the furthest forecast

use crate::data::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::metric::{Metric, MetricTable};
use crate::models::ForecastPoint;
use serde::Serialize;
use std::fmt;

/// Sign of the expected change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Increasing,
    Decreasing,
    Stable,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Direction::Increasing => "increasing",
            Direction::Decreasing => "decreasing",
            Direction::Stable => "stable",
        };
        f.write_str(text)
    }
}

/// Whether a change clears the configured threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Significance {
    SignificantIncrease,
    SignificantDecrease,
    Stable,
}

impl fmt::Display for Significance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Significance::SignificantIncrease => "significant increase",
            Significance::SignificantDecrease => "significant decrease",
            Significance::Stable => "stable",
        };
        f.write_str(text)
    }
}

/// Expected change of one metric over the forecast horizon
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChangeSummary {
    pub metric: Metric,
    pub last_observed: f64,
    pub last_forecast: f64,
    /// `last_forecast - last_observed`, in percentage points
    pub delta: f64,
    /// Relative change in percent; 0 when `last_observed` is 0
    pub delta_pct: f64,
    pub direction: Direction,
    pub significance: Significance,
}

impl fmt::Display for ChangeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {:.2}% -> {:.2}% ({:+.2} pp, {:+.1}%) {}",
            self.metric,
            self.last_observed,
            self.last_forecast,
            self.delta,
            self.delta_pct,
            self.significance
        )
    }
}

/// Classifies the change between the latest observed and last forecast value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChangeAnalyzer {
    significance_threshold: f64,
}

impl Default for ChangeAnalyzer {
    fn default() -> Self {
        Self {
            significance_threshold: Self::DEFAULT_THRESHOLD,
        }
    }
}

impl ChangeAnalyzer {
    /// Percentage points a change must exceed to count as significant
    pub const DEFAULT_THRESHOLD: f64 = 5.0;

    pub fn new(significance_threshold: f64) -> Result<Self> {
        if !(significance_threshold.is_finite() && significance_threshold >= 0.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "Significance threshold must be non-negative, got {}",
                significance_threshold
            )));
        }

        Ok(Self {
            significance_threshold,
        })
    }

    pub fn significance_threshold(&self) -> f64 {
        self.significance_threshold
    }

    /// Compare one metric's historical and forecast values
    pub fn analyze(&self, metric: Metric, historical: f64, forecast: f64) -> ChangeSummary {
        let delta = forecast - historical;
        let delta_pct = if historical == 0.0 {
            0.0
        } else {
            delta / historical * 100.0
        };

        let direction = if delta > 0.0 {
            Direction::Increasing
        } else if delta < 0.0 {
            Direction::Decreasing
        } else {
            Direction::Stable
        };

        let significance = if delta > self.significance_threshold {
            Significance::SignificantIncrease
        } else if delta < -self.significance_threshold {
            Significance::SignificantDecrease
        } else {
            Significance::Stable
        };

        ChangeSummary {
            metric,
            last_observed: historical,
            last_forecast: forecast,
            delta,
            delta_pct,
            direction,
            significance,
        }
    }

    /// Summaries for every metric that has both a last observation and a
    /// non-empty forecast, in metric order
    pub fn analyze_forecasts(
        &self,
        series: &TimeSeries,
        forecasts: &MetricTable<Vec<ForecastPoint>>,
    ) -> Vec<ChangeSummary> {
        forecasts
            .iter()
            .filter_map(|(metric, points)| {
                let historical = series.last_value(metric)?;
                let last = points.last()?;
                Some(self.analyze(metric, historical, last.predicted_value))
            })
            .collect()
    }
}
