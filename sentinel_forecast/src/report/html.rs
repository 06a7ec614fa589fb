//! Self-contained HTML report

use super::{chart, escape_html};
use crate::error::Result;
use crate::models::TrainedForecastModel;
use crate::pipeline::PipelineReport;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;

const STYLE: &str = r#"
        body { font-family: Arial, sans-serif; margin: 40px; color: #212121; }
        h1, h2 { color: #333; }
        .section { margin-bottom: 30px; }
        .cards { display: flex; gap: 16px; flex-wrap: wrap; }
        .card { background-color: #f5f5f5; padding: 12px 18px; border-radius: 5px; min-width: 140px; }
        .card .value { font-size: 1.4em; font-weight: bold; }
        .card .label { color: #616161; font-size: 0.85em; }
        table { border-collapse: collapse; width: 100%; }
        th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }
        th { background-color: #f2f2f2; }
        .note { color: #757575; font-size: 0.9em; }
        figure { margin: 0 0 20px 0; }
"#;

#[derive(Debug, Clone, PartialEq)]
enum Block {
    Cards(Vec<(String, String)>),
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    List(Vec<String>),
    Note(String),
    /// Pre-rendered markup, inserted as is
    Figure { caption: String, svg: String },
}

#[derive(Debug, Clone, PartialEq)]
struct Section {
    heading: String,
    blocks: Vec<Block>,
}

/// Builder for a single-page report; all text is escaped on render
#[derive(Debug, Clone, PartialEq)]
pub struct HtmlReport {
    title: String,
    generated_at: DateTime<Utc>,
    sections: Vec<Section>,
}

impl HtmlReport {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            generated_at: Utc::now(),
            sections: Vec::new(),
        }
    }

    pub fn with_generated_at(mut self, generated_at: DateTime<Utc>) -> Self {
        self.generated_at = generated_at;
        self
    }

    /// Start a new section; following blocks are added to it
    pub fn section(mut self, heading: &str) -> Self {
        self.sections.push(Section {
            heading: heading.to_string(),
            blocks: Vec::new(),
        });
        self
    }

    fn push(mut self, block: Block) -> Self {
        if self.sections.is_empty() {
            self = self.section("");
        }
        if let Some(section) = self.sections.last_mut() {
            section.blocks.push(block);
        }
        self
    }

    /// Headline values shown as cards, as `(label, value)` pairs
    pub fn cards(self, cards: Vec<(String, String)>) -> Self {
        self.push(Block::Cards(cards))
    }

    pub fn table(self, headers: &[&str], rows: Vec<Vec<String>>) -> Self {
        self.push(Block::Table {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows,
        })
    }

    pub fn list(self, items: Vec<String>) -> Self {
        self.push(Block::List(items))
    }

    pub fn note(self, text: &str) -> Self {
        self.push(Block::Note(text.to_string()))
    }

    /// Inline SVG chart; the markup must come from a trusted renderer
    pub fn figure(self, caption: &str, svg: String) -> Self {
        self.push(Block::Figure {
            caption: caption.to_string(),
            svg,
        })
    }

    /// Report with headline cards, fit quality, changes, forecast table,
    /// skipped metrics and charts of one run
    pub fn for_pipeline(report: &PipelineReport) -> Self {
        let series = &report.series;
        let forecast_end = report
            .forecast
            .last_timestamp()
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());

        let mut html = HtmlReport::new("Sentinel-2 Land Cover Forecast")
            .section("Overview")
            .cards(vec![
                ("Observations".to_string(), series.len().to_string()),
                (
                    "Period".to_string(),
                    format!(
                        "{} to {}",
                        series.first_timestamp().format("%Y-%m-%d"),
                        series.last_timestamp().format("%Y-%m-%d")
                    ),
                ),
                ("Forecast until".to_string(), forecast_end),
                ("Models fitted".to_string(), report.models.len().to_string()),
            ]);

        if report.normalization.dropped_count() > 0 {
            html = html.note(&format!(
                "{} of {} input records were dropped for missing or unparseable timestamps.",
                report.normalization.dropped_count(),
                report.normalization.input_records
            ));
        }

        let fit_rows = report
            .models
            .iter()
            .map(|(metric, model)| {
                let quality = model.fit_quality();
                vec![
                    metric.label().to_string(),
                    format!("{:.4}", quality.r_squared),
                    format!("{:.4}", quality.rmse),
                    quality.rating().to_string(),
                    quality.n_observations.to_string(),
                ]
            })
            .collect();
        html = html
            .section("Model fit")
            .table(&["Metric", "R²", "RMSE", "Rating", "Observations"], fit_rows)
            .note("R² and RMSE are measured on the training data itself.");

        let change_rows = report
            .changes
            .iter()
            .map(|c| {
                vec![
                    c.metric.label().to_string(),
                    format!("{:.2}", c.last_observed),
                    format!("{:.2}", c.last_forecast),
                    format!("{:+.2}", c.delta),
                    format!("{:+.1}%", c.delta_pct),
                    c.direction.to_string(),
                    c.significance.to_string(),
                ]
            })
            .collect();
        html = html.section("Expected changes").table(
            &[
                "Metric",
                "Last observed",
                "Last forecast",
                "Change (pp)",
                "Change (%)",
                "Direction",
                "Assessment",
            ],
            change_rows,
        );
        if !report.changes.is_empty() {
            html = html.figure("Expected change", chart::change_chart(&report.changes));
        }

        let metrics = report.forecast.metrics();
        let mut headers = vec!["Date"];
        headers.extend(metrics.iter().map(|m| m.label()));
        let forecast_rows = report
            .forecast
            .rows()
            .iter()
            .map(|row| {
                let mut cells = vec![row.timestamp.format("%Y-%m-%d").to_string()];
                cells.extend(metrics.iter().map(|&m| {
                    row.values
                        .get(m)
                        .map(|v| format!("{:.2}", v))
                        .unwrap_or_default()
                }));
                cells
            })
            .collect();
        html = html.section("Forecast").table(&headers, forecast_rows);

        for (metric, points) in report.forecast.point_table().iter() {
            html = html.figure(metric.label(), chart::forecast_chart(series, metric, points));
        }

        if !report.skipped.is_empty() {
            let items = report
                .skipped
                .iter()
                .map(|s| format!("{}: {}", s.metric.label(), s.reason))
                .collect();
            html = html.section("Skipped metrics").list(items);
        }

        html
    }

    pub fn render(&self) -> String {
        let title = escape_html(&self.title);
        let mut html = format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <title>{}</title>
    <meta charset="utf-8">
    <style>{}</style>
</head>
<body>
    <h1>{}</h1>
    <p class="note">Generated {}</p>
"#,
            title,
            STYLE,
            title,
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        );

        for section in &self.sections {
            html.push_str("<div class=\"section\">\n");
            if !section.heading.is_empty() {
                html.push_str(&format!("<h2>{}</h2>\n", escape_html(&section.heading)));
            }
            for block in &section.blocks {
                render_block(&mut html, block);
            }
            html.push_str("</div>\n");
        }

        html.push_str("</body>\n</html>\n");
        html
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path.as_ref(), self.render())?;
        log::info!("HTML report written to {}", path.as_ref().display());
        Ok(())
    }
}

fn render_block(html: &mut String, block: &Block) {
    match block {
        Block::Cards(cards) => {
            html.push_str("<div class=\"cards\">\n");
            for (label, value) in cards {
                html.push_str(&format!(
                    "<div class=\"card\"><div class=\"value\">{}</div><div class=\"label\">{}</div></div>\n",
                    escape_html(value),
                    escape_html(label)
                ));
            }
            html.push_str("</div>\n");
        }
        Block::Table { headers, rows } => {
            html.push_str("<table>\n<tr>");
            for header in headers {
                html.push_str(&format!("<th>{}</th>", escape_html(header)));
            }
            html.push_str("</tr>\n");
            for row in rows {
                html.push_str("<tr>");
                for cell in row {
                    html.push_str(&format!("<td>{}</td>", escape_html(cell)));
                }
                html.push_str("</tr>\n");
            }
            html.push_str("</table>\n");
        }
        Block::List(items) => {
            html.push_str("<ul>\n");
            for item in items {
                html.push_str(&format!("<li>{}</li>\n", escape_html(item)));
            }
            html.push_str("</ul>\n");
        }
        Block::Note(text) => {
            html.push_str(&format!("<p class=\"note\">{}</p>\n", escape_html(text)));
        }
        Block::Figure { caption, svg } => {
            html.push_str(&format!(
                "<figure>{}<figcaption>{}</figcaption></figure>\n",
                svg,
                escape_html(caption)
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_is_escaped() {
        let html = HtmlReport::new("A <b> report")
            .section("Notes & more")
            .list(vec!["<script>".to_string()])
            .render();

        assert!(html.contains("<title>A &lt;b&gt; report</title>"));
        assert!(html.contains("<h2>Notes &amp; more</h2>"));
        assert!(html.contains("<li>&lt;script&gt;</li>"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_blocks_without_section_get_one() {
        let html = HtmlReport::new("t")
            .table(&["a", "b"], vec![vec!["1".to_string(), "2".to_string()]])
            .render();

        assert!(html.contains("<th>a</th><th>b</th>"));
        assert!(html.contains("<td>1</td><td>2</td>"));
    }
}
