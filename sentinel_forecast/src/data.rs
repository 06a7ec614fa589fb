//! Scene observations and the normalized time series the forecaster consumes

use crate::metric::{Metric, MetricTable};
use chrono::{DateTime, Utc};
use sentinel_math::distinct_count;

/// One raw record as produced by a loader, timestamp not yet parsed
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SceneRecord {
    /// Where the record came from (file name, row), for health reporting
    pub source: Option<String>,
    /// Capture time as found in the input
    pub timestamp: Option<String>,
    /// Metric percentages; an absent entry is a missing value
    pub values: MetricTable<f64>,
}

/// Records loaded from one input, all sharing the same metric set
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SceneBatch {
    /// Metrics the input carries
    pub metrics: Vec<Metric>,
    /// Records in input order
    pub records: Vec<SceneRecord>,
}

impl SceneBatch {
    pub fn new(metrics: Vec<Metric>, records: Vec<SceneRecord>) -> Self {
        Self { metrics, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A single capture event with a parsed, UTC-normalized timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    pub values: MetricTable<f64>,
    pub source: Option<String>,
}

impl Observation {
    pub fn new(timestamp: DateTime<Utc>, values: MetricTable<f64>) -> Self {
        Self {
            timestamp,
            values,
            source: None,
        }
    }

    /// Value of a metric if present and finite
    pub fn value(&self, metric: Metric) -> Option<f64> {
        self.values.get(metric).copied().filter(|v| v.is_finite())
    }
}

/// Observations sorted by timestamp with their elapsed-day offsets.
///
/// Never empty: construction goes through the normalizer, which reports
/// `NoData` instead of building an empty series. The first observation sits
/// at day 0 and offsets never decrease.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    metrics: Vec<Metric>,
    observations: Vec<Observation>,
    elapsed_days: Vec<f64>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeSeries {
    pub(crate) fn from_parts(
        metrics: Vec<Metric>,
        observations: Vec<Observation>,
        elapsed_days: Vec<f64>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            metrics,
            observations,
            elapsed_days,
            start,
            end,
        }
    }

    /// Metrics tracked by every observation of the series
    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Days since the first observation, one per observation
    pub fn elapsed_days(&self) -> &[f64] {
        &self.elapsed_days
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn first_timestamp(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn last_timestamp(&self) -> DateTime<Utc> {
        self.end
    }

    /// Offset of the last observation
    pub fn last_elapsed_day(&self) -> f64 {
        self.elapsed_days.last().copied().unwrap_or(0.0)
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.observations.iter().map(|o| o.timestamp).collect()
    }

    /// `(elapsed_day, value)` pairs where the metric is present
    pub fn metric_points(&self, metric: Metric) -> Vec<(f64, f64)> {
        self.elapsed_days
            .iter()
            .zip(self.observations.iter())
            .filter_map(|(&day, observation)| observation.value(metric).map(|v| (day, v)))
            .collect()
    }

    /// Present values of a metric in time order
    pub fn values(&self, metric: Metric) -> Vec<f64> {
        self.observations
            .iter()
            .filter_map(|o| o.value(metric))
            .collect()
    }

    /// Latest present value of a metric
    pub fn last_value(&self, metric: Metric) -> Option<f64> {
        self.observations.iter().rev().find_map(|o| o.value(metric))
    }

    /// Number of distinct elapsed days at which the metric is present
    pub fn distinct_days(&self, metric: Metric) -> usize {
        let days: Vec<f64> = self
            .metric_points(metric)
            .into_iter()
            .map(|(day, _)| day)
            .collect();
        distinct_count(&days)
    }
}
