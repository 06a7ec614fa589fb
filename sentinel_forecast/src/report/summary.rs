//! JSON summary of a forecasting run

use crate::change::ChangeSummary;
use crate::error::Result;
use crate::metric::{Metric, MetricTable};
use crate::models::{FitRating, Horizon, TrainedForecastModel};
use crate::normalizer::NormalizationReport;
use crate::pipeline::{ForecastRow, PipelineReport, SkippedMetric};
use crate::stats::DescriptiveStats;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Fit quality record of one fitted metric
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    pub metric: Metric,
    pub model: String,
    pub r_squared: f64,
    pub rmse: f64,
    pub rating: FitRating,
    pub n_observations: usize,
    /// Polynomial coefficients in ascending powers of elapsed days
    pub coefficients: Vec<f64>,
}

/// Dates spanned by the history and by the forecast
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Period {
    pub first_observation: DateTime<Utc>,
    pub last_observation: DateTime<Utc>,
    pub forecast_end: Option<DateTime<Utc>>,
}

/// Serializable view of a [`PipelineReport`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub period: Period,
    pub observations: usize,
    pub horizon: Horizon,
    pub normalization: NormalizationReport,
    pub models: Vec<ModelSummary>,
    pub skipped: Vec<SkippedMetric>,
    pub changes: Vec<ChangeSummary>,
    pub statistics: MetricTable<DescriptiveStats>,
    pub forecast: Vec<ForecastRow>,
}

impl RunSummary {
    pub fn from_report(report: &PipelineReport) -> Self {
        Self::from_report_at(report, Utc::now())
    }

    /// Summary stamped with a fixed generation time
    pub fn from_report_at(report: &PipelineReport, generated_at: DateTime<Utc>) -> Self {
        let models = report
            .models
            .iter()
            .map(|(metric, model)| {
                let quality = model.fit_quality();
                ModelSummary {
                    metric,
                    model: model.name().to_string(),
                    r_squared: quality.r_squared,
                    rmse: quality.rmse,
                    rating: quality.rating(),
                    n_observations: quality.n_observations,
                    coefficients: model.coefficients().to_vec(),
                }
            })
            .collect();

        Self {
            generated_at,
            period: Period {
                first_observation: report.series.first_timestamp(),
                last_observation: report.series.last_timestamp(),
                forecast_end: report.forecast.last_timestamp(),
            },
            observations: report.series.len(),
            horizon: report.horizon,
            normalization: report.normalization.clone(),
            models,
            skipped: report.skipped.clone(),
            changes: report.changes.clone(),
            statistics: report.statistics.clone(),
            forecast: report.forecast.rows(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path.as_ref(), self.to_json()?)?;
        log::info!("Run summary written to {}", path.as_ref().display());
        Ok(())
    }
}
