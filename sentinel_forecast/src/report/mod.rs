//! Output writers for a finished run: forecast CSV, JSON summary and HTML report

pub mod chart;
pub mod html;
pub mod summary;
pub mod table;

pub use html::HtmlReport;
pub use summary::RunSummary;
pub use table::{read_forecast_csv, save_forecast_csv, write_forecast_csv};

use crate::error::Result;
use crate::pipeline::PipelineReport;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the forecast table
pub const FORECAST_CSV: &str = "predicciones_futuras.csv";
/// File name of the JSON run summary
pub const SUMMARY_JSON: &str = "resumen.json";
/// File name of the HTML report
pub const REPORT_HTML: &str = "reporte.html";

/// Escape text for use in HTML element content and attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Write every output of a run into `dir`, creating it if needed.
///
/// Returns the paths written, in the order CSV, JSON, HTML.
pub fn write_outputs<P: AsRef<Path>>(
    report: &PipelineReport,
    dir: P,
    include_html: bool,
) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let mut written = Vec::new();

    let csv_path = dir.join(FORECAST_CSV);
    save_forecast_csv(&report.forecast, &csv_path)?;
    written.push(csv_path);

    let json_path = dir.join(SUMMARY_JSON);
    RunSummary::from_report(report).save(&json_path)?;
    written.push(json_path);

    if include_html {
        let html_path = dir.join(REPORT_HTML);
        HtmlReport::for_pipeline(report).save(&html_path)?;
        written.push(html_path);
    }

    Ok(written)
}
