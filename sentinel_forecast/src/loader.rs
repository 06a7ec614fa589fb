//! Loaders turning tabular files and scene metadata into [`SceneBatch`]es

use crate::data::{SceneBatch, SceneRecord};
use crate::error::{ForecastError, Result};
use crate::metric::{Metric, MetricTable};
use polars::prelude::*;
use serde_json::Value;
use std::fs::{self, File};
use std::path::Path;

/// Data loader for scene observation data
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load from a path, choosing the reader by what the path is.
    ///
    /// Directories are scanned for scene metadata files, `.geojson`/`.json`
    /// files are read as scene metadata, anything else as CSV.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<SceneBatch> {
        let path = path.as_ref();
        if path.is_dir() {
            return Self::from_geojson_dir(path);
        }

        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("geojson") || ext.eq_ignore_ascii_case("json") => {
                Self::from_geojson_file(path)
            }
            _ => Self::from_csv(path),
        }
    }

    /// Load observations from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<SceneBatch> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        let mut batch = Self::from_dataframe(&df)?;

        let name = file_label(path);
        for (row, record) in batch.records.iter_mut().enumerate() {
            // Header is line 1
            record.source = Some(format!("{}:{}", name, row + 2));
        }

        log::info!("Loaded {} rows from {}", batch.len(), path.display());
        Ok(batch)
    }

    /// Create a batch from an existing DataFrame
    pub fn from_dataframe(df: &DataFrame) -> Result<SceneBatch> {
        let time_column = Self::detect_time_column(df)?;
        let metric_columns = Self::detect_metric_columns(df);

        if metric_columns.is_empty() {
            return Err(ForecastError::DataError(
                "No metric columns found in data".to_string(),
            ));
        }

        let times = df.column(&time_column)?.cast(&DataType::Utf8)?;
        let mut records: Vec<SceneRecord> = times
            .utf8()?
            .into_iter()
            .map(|timestamp| SceneRecord {
                source: None,
                timestamp: timestamp.map(str::to_string),
                values: MetricTable::new(),
            })
            .collect();

        for (metric, column) in &metric_columns {
            let values = df.column(column)?.cast(&DataType::Float64)?;
            for (record, value) in records.iter_mut().zip(values.f64()?.into_iter()) {
                if let Some(value) = value {
                    record.values.insert(*metric, value);
                }
            }
        }

        let metrics = metric_columns.iter().map(|(metric, _)| *metric).collect();
        Ok(SceneBatch::new(metrics, records))
    }

    /// Detect the time column in a DataFrame
    fn detect_time_column(df: &DataFrame) -> Result<String> {
        let column_names = df.get_column_names();

        // Look for common time column names
        for name in &column_names {
            let lower_name = name.to_lowercase();
            if lower_name.contains("time")
                || lower_name.contains("date")
                || lower_name.contains("fecha")
            {
                return Ok(name.to_string());
            }
        }

        // If not found, use the first column if it looks like a date/time
        if let Some(first_col) = df.get_columns().first() {
            if first_col.dtype().is_temporal() {
                return Ok(first_col.name().to_string());
            }
        }

        Err(ForecastError::DataError(
            "No time column found in data".to_string(),
        ))
    }

    /// Detect metric columns by name, keeping the first match per metric
    fn detect_metric_columns(df: &DataFrame) -> Vec<(Metric, String)> {
        let mut found: MetricTable<String> = MetricTable::new();

        for name in df.get_column_names() {
            if let Some(metric) = Metric::from_column_name(name) {
                if !found.contains(metric) {
                    found.insert(metric, name.to_string());
                }
            }
        }

        found
            .iter()
            .map(|(metric, name)| (metric, name.clone()))
            .collect()
    }

    /// Load a single scene metadata file (a STAC item or a FeatureCollection)
    pub fn from_geojson_file<P: AsRef<Path>>(path: P) -> Result<SceneBatch> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&text)?;

        let records = Self::records_from_geojson(&value, &file_label(path))?;
        Ok(SceneBatch::new(Metric::ALL.to_vec(), records))
    }

    /// Load every `S2*_L2A.geojson` scene file of a directory, in file-name order.
    ///
    /// Files that cannot be read or parsed are logged and skipped.
    pub fn from_geojson_dir<P: AsRef<Path>>(dir: P) -> Result<SceneBatch> {
        let dir = dir.as_ref();
        let mut paths: Vec<_> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .map(is_scene_file_name)
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        if paths.is_empty() {
            log::warn!("No S2*_L2A.geojson files found in {}", dir.display());
        }

        let mut records = Vec::new();
        for path in &paths {
            match Self::from_geojson_file(path) {
                Ok(batch) => records.extend(batch.records),
                Err(err) => log::warn!("Skipping {}: {}", path.display(), err),
            }
        }

        log::info!(
            "Loaded {} scene records from {} files in {}",
            records.len(),
            paths.len(),
            dir.display()
        );
        Ok(SceneBatch::new(Metric::ALL.to_vec(), records))
    }

    fn records_from_geojson(value: &Value, source: &str) -> Result<Vec<SceneRecord>> {
        if value.get("type").and_then(Value::as_str) == Some("FeatureCollection") {
            let features = value
                .get("features")
                .and_then(Value::as_array)
                .ok_or_else(|| {
                    ForecastError::DataError(format!("{}: FeatureCollection without features", source))
                })?;

            return features
                .iter()
                .enumerate()
                .map(|(i, feature)| Self::record_from_feature(feature, &format!("{}#{}", source, i)))
                .collect();
        }

        Ok(vec![Self::record_from_feature(value, source)?])
    }

    fn record_from_feature(feature: &Value, source: &str) -> Result<SceneRecord> {
        let properties = feature
            .get("properties")
            .and_then(Value::as_object)
            .ok_or_else(|| ForecastError::DataError(format!("{}: no properties object", source)))?;

        let timestamp = properties
            .get("datetime")
            .and_then(Value::as_str)
            .map(str::to_string);

        let mut values = MetricTable::new();
        for metric in Metric::ALL {
            match properties.get(metric.property_key()) {
                // Absent keys count as zero coverage
                None => {
                    values.insert(metric, 0.0);
                }
                Some(Value::Null) => {}
                Some(value) => match value.as_f64() {
                    Some(number) => {
                        values.insert(metric, number);
                    }
                    None => log::warn!(
                        "{}: non-numeric {} ignored",
                        source,
                        metric.property_key()
                    ),
                },
            }
        }

        Ok(SceneRecord {
            source: Some(source.to_string()),
            timestamp,
            values,
        })
    }
}

fn is_scene_file_name(name: &str) -> bool {
    name.starts_with("S2") && name.ends_with("_L2A.geojson")
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
