//! Temporal normalization: timestamp parsing and the elapsed-day axis

use crate::data::{Observation, SceneBatch, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::metric::Metric;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use std::fmt;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Why a record was left out of the series
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DropReason {
    MissingTimestamp,
    MalformedTimestamp(String),
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::MissingTimestamp => write!(f, "missing timestamp"),
            DropReason::MalformedTimestamp(raw) => write!(f, "malformed timestamp '{}'", raw),
        }
    }
}

/// A record dropped before normalization
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroppedRecord {
    /// Position in the loaded batch
    pub index: usize,
    pub source: Option<String>,
    pub reason: DropReason,
}

/// Health report of one normalization pass
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct NormalizationReport {
    pub input_records: usize,
    pub kept: usize,
    pub dropped: Vec<DroppedRecord>,
}

impl NormalizationReport {
    pub fn dropped_count(&self) -> usize {
        self.dropped.len()
    }
}

/// Parse a capture timestamp and convert it to UTC.
///
/// Accepts RFC 3339 with offset, naive date-times (taken as UTC) and plain
/// dates (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc));
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
}

/// Parse every record of a batch, drop those without a usable timestamp and
/// build the time series from the rest
pub fn normalize(batch: SceneBatch) -> Result<(TimeSeries, NormalizationReport)> {
    let SceneBatch { metrics, records } = batch;

    let mut report = NormalizationReport {
        input_records: records.len(),
        ..Default::default()
    };
    let mut observations = Vec::with_capacity(records.len());

    for (index, record) in records.into_iter().enumerate() {
        let parsed = match record.timestamp.as_deref() {
            None => Err(DropReason::MissingTimestamp),
            Some(raw) if raw.trim().is_empty() => Err(DropReason::MissingTimestamp),
            Some(raw) => parse_timestamp(raw)
                .ok_or_else(|| DropReason::MalformedTimestamp(raw.to_string())),
        };

        match parsed {
            Ok(timestamp) => observations.push(Observation {
                timestamp,
                values: record.values,
                source: record.source,
            }),
            Err(reason) => {
                log::warn!(
                    "Dropping record {} ({}): {}",
                    index,
                    record.source.as_deref().unwrap_or("unknown source"),
                    reason
                );
                report.dropped.push(DroppedRecord {
                    index,
                    source: record.source,
                    reason,
                });
            }
        }
    }

    report.kept = observations.len();
    let series = normalize_observations(metrics, observations)?;

    log::info!(
        "Normalized {} of {} records ({} dropped), {} to {}",
        report.kept,
        report.input_records,
        report.dropped_count(),
        series.first_timestamp().date_naive(),
        series.last_timestamp().date_naive()
    );

    Ok((series, report))
}

/// Sort observations by timestamp and derive elapsed days from the earliest
pub fn normalize_observations(
    metrics: Vec<Metric>,
    mut observations: Vec<Observation>,
) -> Result<TimeSeries> {
    // Stable, so same-instant observations keep their input order
    observations.sort_by_key(|o| o.timestamp);

    let (start, end) = match (observations.first(), observations.last()) {
        (Some(first), Some(last)) => (first.timestamp, last.timestamp),
        _ => return Err(ForecastError::NoData),
    };

    let elapsed_days = observations
        .iter()
        .map(|o| (o.timestamp - start).num_milliseconds() as f64 / MILLIS_PER_DAY)
        .collect();

    Ok(TimeSeries::from_parts(
        metrics,
        observations,
        elapsed_days,
        start,
        end,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SceneRecord;
    use crate::metric::MetricTable;
    use chrono::TimeZone;

    fn record(timestamp: Option<&str>, vegetation: f64) -> SceneRecord {
        let mut values = MetricTable::new();
        values.insert(Metric::Vegetation, vegetation);
        SceneRecord {
            source: None,
            timestamp: timestamp.map(str::to_string),
            values,
        }
    }

    #[test]
    fn test_parse_timestamp_forms() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).unwrap();

        assert_eq!(parse_timestamp("2024-03-01T10:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T12:30:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01 10:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T10:30:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-03-01"),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("   "), None);
    }

    #[test]
    fn test_normalize_sorts_and_anchors_at_zero() {
        let batch = SceneBatch::new(
            vec![Metric::Vegetation],
            vec![
                record(Some("2024-01-21"), 3.0),
                record(Some("2024-01-01"), 1.0),
                record(Some("2024-01-11T12:00:00Z"), 2.0),
            ],
        );

        let (series, report) = normalize(batch).unwrap();

        assert_eq!(report.kept, 3);
        assert!(report.dropped.is_empty());
        assert_eq!(series.elapsed_days(), &[0.0, 10.5, 20.0]);
        assert_eq!(series.values(Metric::Vegetation), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_normalize_drops_bad_timestamps() {
        let batch = SceneBatch::new(
            vec![Metric::Vegetation],
            vec![
                record(Some("2024-01-01"), 1.0),
                record(None, 2.0),
                record(Some("not a date"), 3.0),
                record(Some("2024-01-06"), 4.0),
            ],
        );

        let (series, report) = normalize(batch).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(report.input_records, 4);
        assert_eq!(report.kept, 2);
        assert_eq!(report.dropped[0].index, 1);
        assert_eq!(report.dropped[0].reason, DropReason::MissingTimestamp);
        assert_eq!(
            report.dropped[1].reason,
            DropReason::MalformedTimestamp("not a date".to_string())
        );
    }

    #[test]
    fn test_no_valid_timestamps_is_no_data() {
        let batch = SceneBatch::new(vec![Metric::Vegetation], vec![record(Some("??"), 1.0)]);

        assert!(matches!(normalize(batch), Err(ForecastError::NoData)));
        assert!(matches!(
            normalize(SceneBatch::default()),
            Err(ForecastError::NoData)
        ));
    }
}
