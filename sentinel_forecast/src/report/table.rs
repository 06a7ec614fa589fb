//! Forecast table CSV export

use crate::error::{ForecastError, Result};
use crate::metric::{Metric, MetricTable};
use crate::normalizer::parse_timestamp;
use crate::pipeline::{ForecastRow, ForecastTable};
use chrono::SecondsFormat;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Header of the timestamp column
pub const TIMESTAMP_COLUMN: &str = "timestamp";

/// Write the forecast table as `timestamp,<metric columns>`.
///
/// Metric columns follow metric order; a metric with no value at a date
/// leaves an empty cell.
pub fn write_forecast_csv<W: Write>(table: &ForecastTable, writer: W) -> Result<()> {
    let metrics = table.metrics();
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header = vec![TIMESTAMP_COLUMN.to_string()];
    header.extend(metrics.iter().map(|m| m.column_name().to_string()));
    csv_writer.write_record(&header)?;

    for row in table.rows() {
        let mut record = Vec::with_capacity(metrics.len() + 1);
        record.push(row.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true));
        for &metric in &metrics {
            record.push(
                row.values
                    .get(metric)
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
            );
        }
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Write the forecast table to a file, replacing it if present
pub fn save_forecast_csv<P: AsRef<Path>>(table: &ForecastTable, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    write_forecast_csv(table, file)?;
    log::info!("Forecast table written to {}", path.as_ref().display());
    Ok(())
}

/// Read a forecast table written by [`write_forecast_csv`]
pub fn read_forecast_csv<R: Read>(reader: R) -> Result<Vec<ForecastRow>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    if headers.get(0) != Some(TIMESTAMP_COLUMN) {
        return Err(ForecastError::DataError(format!(
            "Expected first column '{}'",
            TIMESTAMP_COLUMN
        )));
    }

    let metrics = headers
        .iter()
        .skip(1)
        .map(|name| name.parse::<Metric>())
        .collect::<Result<Vec<_>>>()?;

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let raw = record.get(0).unwrap_or_default();
        let timestamp = parse_timestamp(raw)
            .ok_or_else(|| ForecastError::DataError(format!("Bad timestamp '{}'", raw)))?;

        let mut values = MetricTable::new();
        for (metric, cell) in metrics.iter().zip(record.iter().skip(1)) {
            if cell.is_empty() {
                continue;
            }
            let value = cell.parse::<f64>().map_err(|e| {
                ForecastError::DataError(format!("Bad value '{}' for {}: {}", cell, metric, e))
            })?;
            values.insert(*metric, value);
        }

        rows.push(ForecastRow {
            timestamp,
            elapsed_day: f64::NAN,
            values,
        });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ForecastPoint;
    use chrono::{Duration, TimeZone, Utc};

    fn table() -> ForecastTable {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).unwrap();
        let points = |values: &[f64]| -> Vec<ForecastPoint> {
            values
                .iter()
                .enumerate()
                .map(|(i, &v)| ForecastPoint {
                    future_timestamp: start + Duration::days(5 * i as i64),
                    elapsed_day: 5.0 * i as f64,
                    predicted_value: v,
                    lower: v,
                    upper: v,
                })
                .collect()
        };

        let mut table = MetricTable::new();
        table.insert(Metric::Water, points(&[1.5, 2.25]));
        table.insert(Metric::Vegetation, points(&[40.0, 41.125]));
        ForecastTable::new(table)
    }

    #[test]
    fn test_header_and_rows() {
        let mut buffer = Vec::new();
        write_forecast_csv(&table(), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "timestamp,vegetation_pct,water_pct");
        assert_eq!(lines[1], "2024-03-01T10:30:00Z,40,1.5");
        assert_eq!(lines[2], "2024-03-06T10:30:00Z,41.125,2.25");
    }

    #[test]
    fn test_read_back() {
        let mut buffer = Vec::new();
        write_forecast_csv(&table(), &mut buffer).unwrap();

        let rows = read_forecast_csv(buffer.as_slice()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].values.get(Metric::Vegetation), Some(&41.125));
        assert_eq!(rows[1].values.get(Metric::Water), Some(&2.25));
    }

    #[test]
    fn test_fractional_seconds_kept() {
        let last =
            Utc.with_ymd_and_hms(2024, 4, 2, 10, 20, 31).unwrap() + Duration::milliseconds(24);
        let mut points = MetricTable::new();
        points.insert(
            Metric::Water,
            vec![ForecastPoint {
                future_timestamp: last + Duration::days(5),
                elapsed_day: 5.0,
                predicted_value: 8.0,
                lower: 8.0,
                upper: 8.0,
            }],
        );

        let mut buffer = Vec::new();
        write_forecast_csv(&ForecastTable::new(points), &mut buffer).unwrap();
        let text = String::from_utf8(buffer.clone()).unwrap();
        assert_eq!(text.lines().nth(1), Some("2024-04-07T10:20:31.024Z,8"));

        let rows = read_forecast_csv(buffer.as_slice()).unwrap();
        assert_eq!(rows[0].timestamp, last + Duration::days(5));
    }

    #[test]
    fn test_unknown_column_rejected() {
        let text = "timestamp,ndvi\n2024-01-01T00:00:00Z,0.4\n";
        assert!(read_forecast_csv(text.as_bytes()).is_err());
    }
}
