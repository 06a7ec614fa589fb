use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use sentinel_forecast::normalizer::{self, DropReason};
use sentinel_forecast::{DataLoader, ForecastError, Metric, MetricTable, SceneBatch, SceneRecord};
use std::fs;
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};

fn csv_file(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    write!(file, "{}", contents).unwrap();
    file
}

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
fn test_load_csv_with_metric_columns() {
    let file = csv_file(
        "fecha,vegetation_pct,water_pct,notes\n\
         2024-01-15,22.5,8.0,clear\n\
         2024-01-05,20.0,,hazy\n\
         2024-01-25,25.0,8.4,clear\n",
    );

    let batch = DataLoader::load(file.path()).unwrap();

    assert_eq!(batch.len(), 3);
    assert_eq!(batch.metrics, vec![Metric::Vegetation, Metric::Water]);
    assert_eq!(batch.records[1].timestamp.as_deref(), Some("2024-01-05"));
    assert_eq!(batch.records[1].values.get(Metric::Vegetation), Some(&20.0));
    // Empty cell is a missing value
    assert_eq!(batch.records[1].values.get(Metric::Water), None);
}

#[test]
fn test_csv_without_time_column() {
    let file = csv_file("vegetation_pct,water_pct\n20.0,8.0\n");
    let result = DataLoader::from_csv(file.path());
    assert!(matches!(result, Err(ForecastError::DataError(_))));
}

#[test]
fn test_csv_without_metric_columns() {
    let file = csv_file("date,ndvi\n2024-01-01,0.4\n");
    let result = DataLoader::from_csv(file.path());
    assert!(matches!(result, Err(ForecastError::DataError(_))));
}

#[test]
fn test_missing_file() {
    let result = DataLoader::load("/nonexistent/scenes.csv");
    assert!(matches!(result, Err(ForecastError::IoError(_))));
}

#[test]
fn test_load_geojson_directory() {
    let dir = tempdir().unwrap();

    let scenes = [
        ("S2B_MSIL2A_20240110_L2A.geojson", "2024-01-10T10:00:00Z", 31.0),
        ("S2A_MSIL2A_20240101_L2A.geojson", "2024-01-01T10:00:00Z", 30.0),
    ];
    for (name, datetime, vegetation) in scenes {
        let item = serde_json::json!({
            "type": "Feature",
            "properties": {
                "datetime": datetime,
                "s2:vegetation_percentage": vegetation,
                "eo:cloud_cover": 5.0
            }
        });
        fs::write(dir.path().join(name), item.to_string()).unwrap();
    }
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
    fs::write(dir.path().join("S2X_MSIL2A_broken_L2A.geojson"), "{ not json").unwrap();

    let batch = DataLoader::load(dir.path()).unwrap();

    // Broken file skipped, the rest in file-name order
    assert_eq!(batch.len(), 2);
    assert_eq!(batch.metrics, Metric::ALL.to_vec());
    assert_eq!(
        batch.records[0].timestamp.as_deref(),
        Some("2024-01-01T10:00:00Z")
    );
    assert_eq!(batch.records[1].values.get(Metric::Vegetation), Some(&31.0));
    assert_eq!(batch.records[1].values.get(Metric::Water), Some(&0.0));
}

#[test]
fn test_normalize_sorts_and_anchors_at_zero() {
    let batch = SceneBatch::new(
        vec![Metric::Vegetation],
        vec![
            record(Some("2024-01-21"), 25.0),
            record(Some("2024-01-01"), 20.0),
            record(Some("2024-01-11T12:00:00Z"), 22.0),
        ],
    );

    let (series, report) = normalizer::normalize(batch).unwrap();

    assert_eq!(report.kept, 3);
    assert_eq!(series.elapsed_days(), &[0.0, 10.5, 20.0]);
    assert_eq!(series.values(Metric::Vegetation), vec![20.0, 22.0, 25.0]);
    assert_eq!(
        series.first_timestamp(),
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    );
}

#[test]
fn test_elapsed_days_are_monotonic() {
    let days = ["2023-05-03", "2023-01-01", "2023-03-30", "2023-01-01", "2023-12-31"];
    let batch = SceneBatch::new(
        vec![Metric::Vegetation],
        days.iter().map(|d| record(Some(d), 1.0)).collect(),
    );

    let (series, _) = normalizer::normalize(batch).unwrap();
    let elapsed = series.elapsed_days();

    assert_eq!(elapsed[0], 0.0);
    assert!(elapsed.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(series.distinct_days(Metric::Vegetation), 4);
}

#[test]
fn test_unparseable_timestamps_are_dropped() {
    let batch = SceneBatch::new(
        vec![Metric::Vegetation],
        vec![
            record(Some("2024-01-01"), 20.0),
            record(None, 21.0),
            record(Some("yesterday"), 22.0),
            record(Some("2024-01-11"), 23.0),
        ],
    );

    let (series, report) = normalizer::normalize(batch).unwrap();

    assert_eq!(series.len(), 2);
    assert_eq!(report.input_records, 4);
    assert_eq!(report.dropped_count(), 2);
    assert_eq!(report.dropped[0].reason, DropReason::MissingTimestamp);
    assert_eq!(
        report.dropped[1].reason,
        DropReason::MalformedTimestamp("yesterday".to_string())
    );
}

#[test]
fn test_no_valid_timestamps_is_no_data() {
    let batch = SceneBatch::new(
        vec![Metric::Vegetation],
        vec![record(Some("n/a"), 1.0), record(None, 2.0)],
    );

    assert!(matches!(
        normalizer::normalize(batch),
        Err(ForecastError::NoData)
    ));
}
