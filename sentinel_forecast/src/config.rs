//! Pipeline configuration, loadable from JSON

use crate::change::ChangeAnalyzer;
use crate::confidence::ConfidenceBand;
use crate::error::{ForecastError, Result};
use crate::metric::Metric;
use crate::models::{Horizon, PolynomialTrend};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Parameters of one forecasting run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Months to forecast past the last observation
    pub horizon_months: i64,
    /// Days between forecast points
    pub step_days: f64,
    /// Days counted per horizon month
    pub days_per_month: f64,
    /// Degree of the fitted trend polynomial
    pub degree: usize,
    /// Metrics to fit and forecast
    pub metrics: Vec<Metric>,
    /// Percentage points a change must exceed to be called significant
    pub significance_threshold: f64,
    /// Band drawn around forecast values
    pub band: ConfidenceBand,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            horizon_months: 2,
            step_days: Horizon::DEFAULT_STEP_DAYS,
            days_per_month: Horizon::DEFAULT_DAYS_PER_MONTH,
            degree: PolynomialTrend::DEFAULT_DEGREE,
            metrics: Metric::DEFAULT_FORECAST.to_vec(),
            significance_threshold: ChangeAnalyzer::DEFAULT_THRESHOLD,
            band: ConfidenceBand::default(),
        }
    }
}

impl PipelineConfig {
    /// Read a configuration file; fields left out keep their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_horizon_months(mut self, horizon_months: i64) -> Self {
        self.horizon_months = horizon_months;
        self
    }

    pub fn with_metrics(mut self, metrics: Vec<Metric>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Build the forecast horizon; negative months are `InvalidHorizon`
    pub fn horizon(&self) -> Result<Horizon> {
        Horizon::new(self.horizon_months)?
            .with_step_days(self.step_days)?
            .with_days_per_month(self.days_per_month)
    }

    /// Check every parameter, horizon first
    pub fn validate(&self) -> Result<()> {
        self.horizon()?;

        if self.degree == 0 {
            return Err(ForecastError::InvalidParameter(
                "Polynomial degree must be at least 1".to_string(),
            ));
        }

        if self.metrics.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "At least one metric must be selected".to_string(),
            ));
        }

        ChangeAnalyzer::new(self.significance_threshold)?;
        self.band.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.horizon_months, 2);
        assert_eq!(config.metrics.len(), 5);
        assert!(!config.metrics.contains(&Metric::Unclassified));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"horizon_months": 3, "metrics": ["water_pct"]}"#).unwrap();

        assert_eq!(config.horizon_months, 3);
        assert_eq!(config.metrics, vec![Metric::Water]);
        assert_eq!(config.step_days, 5.0);
        assert_eq!(config.band, ConfidenceBand::Fixed { half_width: 10.0 });
    }

    #[test]
    fn test_invalid_configs() {
        let negative = PipelineConfig::default().with_horizon_months(-2);
        assert!(matches!(
            negative.validate(),
            Err(ForecastError::InvalidHorizon(-2))
        ));

        let no_metrics = PipelineConfig::default().with_metrics(Vec::new());
        assert!(matches!(
            no_metrics.validate(),
            Err(ForecastError::InvalidParameter(_))
        ));

        let bad_step = PipelineConfig {
            step_days: 0.0,
            ..Default::default()
        };
        assert!(bad_step.validate().is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: std::result::Result<PipelineConfig, _> =
            serde_json::from_str(r#"{"horizon": 3}"#);
        assert!(result.is_err());
    }
}
