//! # Sentinel Forecast
//!
//! Per-metric trend forecasting for Sentinel-2 scene classification percentages.
//!
//! ## Features
//!
//! - Scene loading from CSV tables and STAC-style GeoJSON items
//! - Temporal normalization onto an elapsed-days axis
//! - Independent quadratic trend per metric, with in-sample R² and RMSE
//! - Forecasts on a fixed day step, clamped to [0, 100], with a confidence band
//! - Change analysis between the latest observation and the furthest forecast
//! - CSV, JSON and self-contained HTML outputs
//!
//! ## Metrics
//!
//! Every value is a percentage of the scene:
//!
//! ```rust
//! pub enum Metric {
//!     Vegetation,
//!     NotVegetated,
//!     Water,
//!     CloudCover,
//!     SnowIce,
//!     Unclassified,
//! }
//! ```
//!
//! Metrics are fitted independently. A metric with fewer than three distinct
//! observation days is skipped and reported; the run fails only when no metric
//! can be fitted.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sentinel_forecast::{DataLoader, ForecastPipeline, PipelineConfig};
//!
//! # fn main() -> sentinel_forecast::error::Result<()> {
//! // Load scenes
//! let batch = DataLoader::load("estadisticas.csv")?;
//!
//! // Two months ahead on a five day step
//! let config = PipelineConfig::default().with_horizon_months(2);
//! let pipeline = ForecastPipeline::new(&config)?;
//!
//! let report = pipeline.run(batch)?;
//! for change in &report.changes {
//!     println!("{}", change);
//! }
//!
//! // Forecast CSV, JSON summary and HTML report
//! sentinel_forecast::report::write_outputs(&report, "out", true)?;
//! # Ok(())
//! # }
//! ```

pub mod change;
pub mod confidence;
pub mod config;
pub mod data;
pub mod error;
pub mod loader;
pub mod metric;
pub mod models;
pub mod normalizer;
pub mod pipeline;
pub mod report;
pub mod stats;

// Re-export commonly used types
pub use crate::change::{ChangeAnalyzer, ChangeSummary, Direction, Significance};
pub use crate::confidence::ConfidenceBand;
pub use crate::config::PipelineConfig;
pub use crate::data::{Observation, SceneBatch, SceneRecord, TimeSeries};
pub use crate::error::ForecastError;
pub use crate::loader::DataLoader;
pub use crate::metric::{Metric, MetricTable};
pub use crate::models::{
    FitQuality, ForecastModel, ForecastPoint, Horizon, MetricModel, PolynomialTrend,
    TrainedForecastModel,
};
pub use crate::pipeline::{ForecastPipeline, ForecastTable, PipelineReport, SkipReason};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
