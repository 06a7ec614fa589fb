//! Polynomial trend model fitted per metric against elapsed days

use crate::data::TimeSeries;
use crate::error::{ForecastError, Result};
use crate::metric::Metric;
use crate::models::{FitQuality, ForecastModel, TrainedForecastModel};
use sentinel_math::{distinct_count, r_squared, root_mean_squared_error, PolynomialFit};
use serde::Serialize;

/// Least-squares polynomial trend, `y = a + b·t + c·t²` by default
#[derive(Debug, Clone)]
pub struct PolynomialTrend {
    /// Name of the model
    name: String,
    /// Polynomial degree
    degree: usize,
}

/// A polynomial fitted to one metric; immutable once trained
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricModel {
    metric: Metric,
    name: String,
    fit: PolynomialFit,
    quality: FitQuality,
}

impl PolynomialTrend {
    /// Degree used when none is configured
    pub const DEFAULT_DEGREE: usize = 2;

    /// Create a trend model of the given degree
    pub fn new(degree: usize) -> Result<Self> {
        if degree == 0 {
            return Err(ForecastError::InvalidParameter(
                "Polynomial degree must be at least 1".to_string(),
            ));
        }

        let name = match degree {
            1 => "Linear trend".to_string(),
            2 => "Quadratic trend".to_string(),
            _ => format!("Polynomial trend (degree={})", degree),
        };

        Ok(Self { name, degree })
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Distinct time points needed for a unique fit
    pub fn required_points(&self) -> usize {
        self.degree + 1
    }
}

impl Default for PolynomialTrend {
    fn default() -> Self {
        Self {
            name: "Quadratic trend".to_string(),
            degree: Self::DEFAULT_DEGREE,
        }
    }
}

impl ForecastModel for PolynomialTrend {
    type Trained = MetricModel;

    fn train(&self, series: &TimeSeries, metric: Metric) -> Result<Self::Trained> {
        let (days, values): (Vec<f64>, Vec<f64>) = series.metric_points(metric).into_iter().unzip();

        let distinct = distinct_count(&days);
        if distinct < self.required_points() {
            return Err(ForecastError::InsufficientData {
                metric,
                distinct,
                required: self.required_points(),
            });
        }

        let fit = PolynomialFit::fit(&days, &values, self.degree)?;
        let fitted = fit.evaluate_many(&days);

        // In-sample only: the same points the polynomial was fitted on
        let quality = FitQuality {
            r_squared: r_squared(&values, &fitted)?,
            rmse: root_mean_squared_error(&values, &fitted)?,
            n_observations: values.len(),
        };

        log::debug!(
            "{} {}: coefficients {:?}, {}",
            self.name,
            metric,
            fit.coefficients(),
            quality
        );

        Ok(MetricModel {
            metric,
            name: self.name.clone(),
            fit,
            quality,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl MetricModel {
    /// Ascending-power coefficients of the fitted polynomial
    pub fn coefficients(&self) -> &[f64] {
        self.fit.coefficients()
    }

    pub fn polynomial(&self) -> &PolynomialFit {
        &self.fit
    }
}

impl TrainedForecastModel for MetricModel {
    fn metric(&self) -> Metric {
        self.metric
    }

    fn fit_quality(&self) -> &FitQuality {
        &self.quality
    }

    fn predict(&self, elapsed_day: f64) -> f64 {
        self.fit.evaluate(elapsed_day)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
