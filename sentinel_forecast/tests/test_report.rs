use chrono::{Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;
use sentinel_forecast::report::{self, read_forecast_csv, HtmlReport, RunSummary};
use sentinel_forecast::{
    ForecastPipeline, Metric, MetricTable, PipelineConfig, PipelineReport, SceneBatch,
    SceneRecord,
};
use serde_json::Value;
use std::fs;
use tempfile::tempdir;

fn run() -> PipelineReport {
    let start = Utc.with_ymd_and_hms(2024, 4, 2, 10, 56, 29).unwrap();
    let mut records: Vec<SceneRecord> = [
        (20.0, 8.0, 12.0),
        (22.0, 8.2, 3.5),
        (25.0, 8.1, 40.0),
        (24.0, 7.9, 0.0),
        (27.0, 8.3, 1.2),
    ]
    .iter()
    .enumerate()
    .map(|(i, &(vegetation, water, cloud))| {
        let values: MetricTable<f64> = vec![
            (Metric::Vegetation, vegetation),
            (Metric::Water, water),
            (Metric::CloudCover, cloud),
        ]
        .into_iter()
        .collect();
        SceneRecord {
            source: Some(format!("S2A_{}_L2A.geojson", i)),
            timestamp: Some((start + Duration::days(10 * i as i64)).to_rfc3339()),
            values,
        }
    })
    .collect();

    records.push(SceneRecord {
        source: Some("<broken>".to_string()),
        timestamp: None,
        values: MetricTable::new(),
    });

    let batch = SceneBatch::new(
        vec![Metric::Vegetation, Metric::Water, Metric::CloudCover],
        records,
    );
    ForecastPipeline::new(&PipelineConfig::default())
        .unwrap()
        .run(batch)
        .unwrap()
}

#[test]
fn test_write_outputs() {
    let report = run();
    let dir = tempdir().unwrap();
    let out = dir.path().join("resultados");

    let written = report::write_outputs(&report, &out, true).unwrap();

    let names: Vec<String> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec!["predicciones_futuras.csv", "resumen.json", "reporte.html"]
    );
    assert!(written.iter().all(|p| p.exists()));
}

#[test]
fn test_skip_html_output() {
    let report = run();
    let dir = tempdir().unwrap();

    let written = report::write_outputs(&report, dir.path(), false).unwrap();

    assert_eq!(written.len(), 2);
    assert!(!dir.path().join(report::REPORT_HTML).exists());
}

#[test]
fn test_forecast_csv_matches_table() {
    let report = run();
    let dir = tempdir().unwrap();
    report::write_outputs(&report, dir.path(), false).unwrap();

    let path = dir.path().join(report::FORECAST_CSV);
    let text = fs::read_to_string(&path).unwrap();
    let header = text.lines().next().unwrap();
    assert_eq!(header, "timestamp,vegetation_pct,water_pct,cloud_cover");

    let rows = read_forecast_csv(fs::File::open(&path).unwrap()).unwrap();
    let expected = report.forecast.rows();
    assert_eq!(rows.len(), expected.len());
    for (read, original) in rows.iter().zip(&expected) {
        assert_eq!(read.timestamp, original.timestamp);
        // Shortest round-trip formatting reads back exactly
        assert_eq!(read.values, original.values);
    }
    assert_eq!(
        rows[0].timestamp,
        report.series.last_timestamp() + Duration::days(5)
    );
}

#[test]
fn test_summary_json() {
    let report = run();
    let generated_at = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
    let summary = RunSummary::from_report_at(&report, generated_at);
    let json: Value = serde_json::from_str(&summary.to_json().unwrap()).unwrap();

    assert_eq!(json["observations"], 5);
    assert_eq!(json["normalization"]["input_records"], 6);
    assert_eq!(json["normalization"]["dropped"][0]["source"], "<broken>");
    assert_eq!(json["horizon"]["months"], 2);
    assert_eq!(json["models"].as_array().unwrap().len(), 3);
    assert_eq!(json["models"][0]["metric"], "vegetation_pct");
    assert_eq!(json["models"][0]["coefficients"].as_array().unwrap().len(), 3);
    assert_eq!(json["changes"][0]["metric"], "vegetation_pct");
    assert_eq!(json["forecast"].as_array().unwrap().len(), 11);
    assert!(json["forecast"][0]["values"]["water_pct"].is_number());
    assert_eq!(json["statistics"]["cloud_cover"]["count"], 5);
    assert_eq!(json["period"]["first_observation"], "2024-04-02T10:56:29Z");
}

#[test]
fn test_html_report_contents() {
    let report = run();
    let html = HtmlReport::for_pipeline(&report).render();

    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<h2>Model fit</h2>"));
    assert!(html.contains("<h2>Expected changes</h2>"));
    assert!(html.contains("<h2>Forecast</h2>"));
    // One forecast chart per metric plus the change chart
    assert_eq!(html.matches("<svg").count(), 4);
    assert!(html.contains("1 of 6 input records were dropped"));
    // Self-contained
    assert!(!html.contains("<script"));
    assert!(!html.contains("<link"));
}
