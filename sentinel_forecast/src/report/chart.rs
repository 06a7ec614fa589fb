//! Inline SVG charts for the HTML report

use super::escape_html;
use crate::change::{ChangeSummary, Significance};
use crate::data::TimeSeries;
use crate::metric::Metric;
use crate::models::{ForecastPoint, PERCENT_MAX, PERCENT_MIN};
use std::fmt::Write;

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 260.0;
const MARGIN_LEFT: f64 = 48.0;
const MARGIN_RIGHT: f64 = 16.0;
const MARGIN_TOP: f64 = 24.0;
const MARGIN_BOTTOM: f64 = 32.0;

const HISTORY_COLOR: &str = "#2e7d32";
const FORECAST_COLOR: &str = "#c62828";
const BAND_COLOR: &str = "#ef9a9a";

/// Linear mapping from a data range onto a pixel range
#[derive(Debug, Clone, Copy)]
struct Scale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl Scale {
    fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    fn map(&self, value: f64) -> f64 {
        let span = self.domain.1 - self.domain.0;
        if span == 0.0 {
            return (self.range.0 + self.range.1) / 2.0;
        }
        self.range.0 + (value - self.domain.0) / span * (self.range.1 - self.range.0)
    }
}

fn points_attr(points: &[(f64, f64)]) -> String {
    points
        .iter()
        .map(|(x, y)| format!("{:.1},{:.1}", x, y))
        .collect::<Vec<_>>()
        .join(" ")
}

fn open_svg(svg: &mut String, height: f64, title: &str) {
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" width="{w}" height="{h}" role="img"><title>{t}</title>"#,
        w = WIDTH,
        h = height,
        t = escape_html(title)
    );
}

/// History, forecast and band of one metric on a 0-100 axis.
///
/// The x axis is elapsed days from the first observation.
pub fn forecast_chart(series: &TimeSeries, metric: Metric, forecast: &[ForecastPoint]) -> String {
    let history = series.metric_points(metric);

    let x_end = forecast
        .last()
        .map(|p| p.elapsed_day)
        .unwrap_or_else(|| series.last_elapsed_day());
    let x = Scale::new((0.0, x_end), (MARGIN_LEFT, WIDTH - MARGIN_RIGHT));
    let y = Scale::new(
        (PERCENT_MIN, PERCENT_MAX),
        (HEIGHT - MARGIN_BOTTOM, MARGIN_TOP),
    );

    let mut svg = String::new();
    open_svg(&mut svg, HEIGHT, metric.label());

    // Gridlines every 25 percentage points
    for tick in [0.0, 25.0, 50.0, 75.0, 100.0] {
        let ty = y.map(tick);
        let _ = write!(
            svg,
            r##"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="#e0e0e0"/><text x="{:.1}" y="{:.1}" font-size="10" text-anchor="end">{}</text>"##,
            MARGIN_LEFT,
            ty,
            WIDTH - MARGIN_RIGHT,
            ty,
            MARGIN_LEFT - 6.0,
            ty + 3.0,
            tick
        );
    }

    if !forecast.is_empty() {
        let mut band: Vec<(f64, f64)> = forecast
            .iter()
            .map(|p| (x.map(p.elapsed_day), y.map(p.upper)))
            .collect();
        band.extend(
            forecast
                .iter()
                .rev()
                .map(|p| (x.map(p.elapsed_day), y.map(p.lower))),
        );
        let _ = write!(
            svg,
            r#"<polygon points="{}" fill="{}" fill-opacity="0.35" stroke="none"/>"#,
            points_attr(&band),
            BAND_COLOR
        );

        // Forecast line starts at the last observation so the curves join
        let mut line: Vec<(f64, f64)> = history
            .last()
            .map(|&(day, value)| vec![(x.map(day), y.map(value))])
            .unwrap_or_default();
        line.extend(
            forecast
                .iter()
                .map(|p| (x.map(p.elapsed_day), y.map(p.predicted_value))),
        );
        let _ = write!(
            svg,
            r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="2" stroke-dasharray="6 4"/>"#,
            points_attr(&line),
            FORECAST_COLOR
        );
    }

    let observed: Vec<(f64, f64)> = history
        .iter()
        .map(|&(day, value)| (x.map(day), y.map(value)))
        .collect();
    let _ = write!(
        svg,
        r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="2"/>"#,
        points_attr(&observed),
        HISTORY_COLOR
    );
    for (px, py) in &observed {
        let _ = write!(
            svg,
            r#"<circle cx="{:.1}" cy="{:.1}" r="3" fill="{}"/>"#,
            px, py, HISTORY_COLOR
        );
    }

    let _ = write!(
        svg,
        r#"<text x="{:.1}" y="{:.1}" font-size="10">day 0</text><text x="{:.1}" y="{:.1}" font-size="10" text-anchor="end">day {:.0}</text></svg>"#,
        MARGIN_LEFT,
        HEIGHT - 10.0,
        WIDTH - MARGIN_RIGHT,
        HEIGHT - 10.0,
        x_end
    );

    svg
}

/// Horizontal bars of the expected change per metric, in percentage points
pub fn change_chart(changes: &[ChangeSummary]) -> String {
    const ROW_HEIGHT: f64 = 28.0;
    const LABEL_WIDTH: f64 = 150.0;

    let height = MARGIN_TOP + MARGIN_BOTTOM + ROW_HEIGHT * changes.len().max(1) as f64;
    let extent = changes
        .iter()
        .map(|c| c.delta.abs())
        .fold(1.0_f64, f64::max);
    let x = Scale::new((-extent, extent), (LABEL_WIDTH, WIDTH - MARGIN_RIGHT));
    let zero = x.map(0.0);

    let mut svg = String::new();
    open_svg(&mut svg, height, "Expected change (percentage points)");

    let _ = write!(
        svg,
        r##"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="#616161"/>"##,
        zero,
        MARGIN_TOP / 2.0,
        zero,
        height - MARGIN_BOTTOM / 2.0
    );

    for (i, change) in changes.iter().enumerate() {
        let top = MARGIN_TOP + ROW_HEIGHT * i as f64;
        let end = x.map(change.delta);
        let color = match change.significance {
            Significance::SignificantIncrease => HISTORY_COLOR,
            Significance::SignificantDecrease => FORECAST_COLOR,
            Significance::Stable => "#9e9e9e",
        };

        let _ = write!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" font-size="11" text-anchor="end">{}</text><rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}"/><text x="{:.1}" y="{:.1}" font-size="10">{:+.2}</text>"#,
            LABEL_WIDTH - 8.0,
            top + ROW_HEIGHT / 2.0 + 4.0,
            escape_html(change.metric.label()),
            zero.min(end),
            top + 4.0,
            (end - zero).abs(),
            ROW_HEIGHT - 8.0,
            color,
            zero.max(end) + 4.0,
            top + ROW_HEIGHT / 2.0 + 4.0,
            change.delta
        );
    }

    svg.push_str("</svg>");
    svg
}
