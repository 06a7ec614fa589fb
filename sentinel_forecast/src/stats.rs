//! Descriptive statistics of the observed metrics

use crate::data::TimeSeries;
use crate::metric::MetricTable;
use serde::Serialize;
use statrs::statistics::{Data, Distribution, Max, Median, Min, OrderStatistics};
use std::fmt;

/// Summary of one metric's observed values
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DescriptiveStats {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; `None` with fewer than two values
    pub std_dev: Option<f64>,
    pub min: f64,
    pub lower_quartile: f64,
    pub median: f64,
    pub upper_quartile: f64,
    pub max: f64,
}

impl DescriptiveStats {
    /// Summarise a set of values; `None` when empty
    pub fn from_values(values: Vec<f64>) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let count = values.len();
        let mut data = Data::new(values);

        let std_dev = if count > 1 {
            data.std_dev().filter(|v| v.is_finite())
        } else {
            None
        };

        Some(Self {
            count,
            mean: data.mean().unwrap_or(f64::NAN),
            std_dev,
            min: data.min(),
            lower_quartile: data.lower_quartile(),
            median: data.median(),
            upper_quartile: data.upper_quartile(),
            max: data.max(),
        })
    }
}

impl fmt::Display for DescriptiveStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "n={:<3} mean={:>7.2} std={:>7} min={:>7.2} q1={:>7.2} median={:>7.2} q3={:>7.2} max={:>7.2}",
            self.count,
            self.mean,
            self.std_dev
                .map(|v| format!("{:.2}", v))
                .unwrap_or_else(|| "-".to_string()),
            self.min,
            self.lower_quartile,
            self.median,
            self.upper_quartile,
            self.max
        )
    }
}

/// Statistics for every metric of the series that has at least one value
pub fn describe(series: &TimeSeries) -> MetricTable<DescriptiveStats> {
    series
        .metrics()
        .iter()
        .filter_map(|&metric| {
            DescriptiveStats::from_values(series.values(metric)).map(|stats| (metric, stats))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_values() {
        let stats = DescriptiveStats::from_values(vec![4.0, 1.0, 3.0, 2.0, 5.0]).unwrap();

        assert_eq!(stats.count, 5);
        assert!((stats.mean - 3.0).abs() < 1e-12);
        assert!((stats.std_dev.unwrap() - 2.5_f64.sqrt()).abs() < 1e-12);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.median, 3.0);
        assert_eq!(stats.max, 5.0);
        assert!(stats.lower_quartile <= stats.median && stats.median <= stats.upper_quartile);
    }

    #[test]
    fn test_single_value_has_no_spread() {
        let stats = DescriptiveStats::from_values(vec![7.0]).unwrap();
        assert_eq!(stats.std_dev, None);
        assert_eq!(stats.min, 7.0);
    }

    #[test]
    fn test_empty_values() {
        assert!(DescriptiveStats::from_values(Vec::new()).is_none());
    }
}
