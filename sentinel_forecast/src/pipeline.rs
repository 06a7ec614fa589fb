//! End-to-end forecasting run: normalize, fit per metric, forecast, compare

use crate::change::{ChangeAnalyzer, ChangeSummary};
use crate::config::PipelineConfig;
use crate::confidence::ConfidenceBand;
use crate::data::{SceneBatch, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::metric::{Metric, MetricTable};
use crate::models::{
    ForecastModel, ForecastPoint, Horizon, MetricModel, PolynomialTrend, TrainedForecastModel,
};
use crate::normalizer::{self, NormalizationReport};
use crate::stats::{self, DescriptiveStats};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Why a metric produced no model
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// Fewer distinct time points than the polynomial needs
    InsufficientData { distinct: usize, required: usize },
    /// The input does not carry the metric
    MetricUnavailable,
    /// The least-squares solve failed
    FitFailed { message: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InsufficientData { distinct, required } => write!(
                f,
                "insufficient data ({} distinct time points, {} required)",
                distinct, required
            ),
            SkipReason::MetricUnavailable => write!(f, "metric not present in input"),
            SkipReason::FitFailed { message } => write!(f, "fit failed: {}", message),
        }
    }
}

/// Recoverable fitting errors become skip reasons; any other error is handed back
impl TryFrom<ForecastError> for SkipReason {
    type Error = ForecastError;

    fn try_from(err: ForecastError) -> Result<Self> {
        if !err.is_recoverable() {
            return Err(err);
        }
        Ok(match err {
            ForecastError::InsufficientData {
                distinct, required, ..
            } => SkipReason::InsufficientData { distinct, required },
            other => SkipReason::FitFailed {
                message: other.to_string(),
            },
        })
    }
}

/// A metric left out of the run, with the reason
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedMetric {
    pub metric: Metric,
    pub reason: SkipReason,
}

/// One forecast date with the predicted value of every fitted metric
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastRow {
    pub timestamp: DateTime<Utc>,
    pub elapsed_day: f64,
    pub values: MetricTable<f64>,
}

/// Forecasts of all fitted metrics over a shared set of future dates
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForecastTable {
    points: MetricTable<Vec<ForecastPoint>>,
}

impl ForecastTable {
    pub fn new(points: MetricTable<Vec<ForecastPoint>>) -> Self {
        Self { points }
    }

    /// Metrics with a forecast, in metric order
    pub fn metrics(&self) -> Vec<Metric> {
        self.points.metrics()
    }

    /// Per-metric forecast points including band edges
    pub fn points(&self, metric: Metric) -> Option<&[ForecastPoint]> {
        self.points.get(metric).map(Vec::as_slice)
    }

    pub fn point_table(&self) -> &MetricTable<Vec<ForecastPoint>> {
        &self.points
    }

    /// Number of forecast dates
    pub fn len(&self) -> usize {
        self.points.iter().map(|(_, p)| p.len()).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Date-major view: one row per forecast date
    pub fn rows(&self) -> Vec<ForecastRow> {
        let mut rows: Vec<ForecastRow> = Vec::new();

        for (metric, points) in self.points.iter() {
            for (i, point) in points.iter().enumerate() {
                if i == rows.len() {
                    rows.push(ForecastRow {
                        timestamp: point.future_timestamp,
                        elapsed_day: point.elapsed_day,
                        values: MetricTable::new(),
                    });
                }
                rows[i].values.insert(metric, point.predicted_value);
            }
        }

        rows
    }

    /// Timestamp of the furthest forecast
    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.points
            .iter()
            .filter_map(|(_, points)| points.last().map(|p| p.future_timestamp))
            .max()
    }
}

/// Everything one run produced
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub series: TimeSeries,
    pub normalization: NormalizationReport,
    pub horizon: Horizon,
    pub models: MetricTable<MetricModel>,
    pub skipped: Vec<SkippedMetric>,
    pub forecast: ForecastTable,
    pub changes: Vec<ChangeSummary>,
    pub statistics: MetricTable<DescriptiveStats>,
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Forecast Summary:")?;
        writeln!(
            f,
            "  Period:        {} to {}",
            self.series.first_timestamp().date_naive(),
            self.series.last_timestamp().date_naive()
        )?;
        match self.forecast.last_timestamp() {
            Some(until) => writeln!(f, "  Forecast until: {}", until.date_naive())?,
            None => writeln!(f, "  Forecast until: (empty horizon)")?,
        }
        writeln!(
            f,
            "  Observations:  {} ({} dropped)",
            self.series.len(),
            self.normalization.dropped_count()
        )?;
        writeln!(f, "  Models fitted: {}", self.models.len())?;

        writeln!(f, "Fit quality (in-sample):")?;
        for (metric, model) in self.models.iter() {
            writeln!(f, "  {:<18} {}", metric, model.fit_quality())?;
        }

        if !self.skipped.is_empty() {
            writeln!(f, "Skipped metrics:")?;
            for skipped in &self.skipped {
                writeln!(f, "  {:<18} {}", skipped.metric, skipped.reason)?;
            }
        }

        writeln!(f, "Expected changes:")?;
        for change in &self.changes {
            writeln!(f, "  {}", change)?;
        }
        Ok(())
    }
}

/// Outcome of fitting every requested metric
#[derive(Debug, Clone, Default)]
pub struct FitOutcome {
    pub models: MetricTable<MetricModel>,
    pub skipped: Vec<SkippedMetric>,
}

/// Runs the forecasting stages in order on one batch of scenes
#[derive(Debug, Clone)]
pub struct ForecastPipeline {
    metrics: Vec<Metric>,
    model: PolynomialTrend,
    horizon: Horizon,
    band: ConfidenceBand,
    analyzer: ChangeAnalyzer,
}

impl ForecastPipeline {
    /// Build a pipeline; invalid horizons are rejected here, before any fitting
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            metrics: config.metrics.clone(),
            model: PolynomialTrend::new(config.degree)?,
            horizon: config.horizon()?,
            band: config.band,
            analyzer: ChangeAnalyzer::new(config.significance_threshold)?,
        })
    }

    pub fn horizon(&self) -> &Horizon {
        &self.horizon
    }

    /// Normalize a loaded batch and run every stage on it
    pub fn run(&self, batch: SceneBatch) -> Result<PipelineReport> {
        log::info!("Normalizing {} scene records", batch.len());
        let (series, normalization) = normalizer::normalize(batch)?;
        self.run_series(series, normalization)
    }

    /// Run the fitting, forecasting and comparison stages on a normalized series
    pub fn run_series(
        &self,
        series: TimeSeries,
        normalization: NormalizationReport,
    ) -> Result<PipelineReport> {
        let FitOutcome { models, skipped } = self.fit_all(&series)?;

        if models.is_empty() {
            log::warn!("No metric could be fitted");
            return Err(ForecastError::NoModelsFit);
        }

        let mut points = MetricTable::new();
        for (metric, model) in models.iter() {
            points.insert(metric, model.forecast_series(&series, &self.horizon, &self.band)?);
        }
        let forecast = ForecastTable::new(points);

        log::info!(
            "Forecast {} dates over {} months for {} metrics",
            forecast.len(),
            self.horizon.months(),
            models.len()
        );
        if forecast.is_empty() {
            log::warn!("Horizon shorter than one step; forecast is empty");
        }

        let changes = self
            .analyzer
            .analyze_forecasts(&series, forecast.point_table());
        let statistics = stats::describe(&series);

        Ok(PipelineReport {
            series,
            normalization,
            horizon: self.horizon,
            models,
            skipped,
            forecast,
            changes,
            statistics,
        })
    }

    /// Fit each requested metric independently.
    ///
    /// Per-metric failures are collected as skips; errors that are not
    /// specific to one metric abort the run.
    pub fn fit_all(&self, series: &TimeSeries) -> Result<FitOutcome> {
        let mut outcome = FitOutcome::default();

        for &metric in &self.metrics {
            if !series.metrics().contains(&metric) {
                log::warn!("Skipping {}: not present in input", metric);
                outcome.skipped.push(SkippedMetric {
                    metric,
                    reason: SkipReason::MetricUnavailable,
                });
                continue;
            }

            match self.model.train(series, metric) {
                Ok(model) => {
                    log::info!("Fitted {}: {}", metric, model.fit_quality());
                    outcome.models.insert(metric, model);
                }
                Err(err) => {
                    log::warn!("Skipping {}: {}", metric, err);
                    let reason = SkipReason::try_from(err)?;
                    outcome.skipped.push(SkippedMetric { metric, reason });
                }
            }
        }

        Ok(outcome)
    }
}
