//! # Sentinel Workspace
//!
//! Entry point tying together the workspace crates:
//!
//! - [`sentinel_math`]: least-squares trend fitting and fit metrics
//! - [`sentinel_forecast`]: scene loading, per-metric forecasting, change
//!   analysis and report outputs
//!
//! ## Example
//!
//! ```no_run
//! use sentinel_workspace::{forecast_path, PipelineConfig};
//!
//! let report = forecast_path("scenes/", &PipelineConfig::default()).unwrap();
//! println!("{}", report);
//! ```

pub use sentinel_forecast;
pub use sentinel_math;

pub use sentinel_forecast::error::Result;
pub use sentinel_forecast::{ForecastPipeline, PipelineConfig, PipelineReport};

use sentinel_forecast::DataLoader;
use std::path::Path;

/// Load scenes from a CSV file, a GeoJSON file or a scene directory and run
/// the forecasting pipeline on them.
///
/// The configuration is checked before anything is read, so a negative
/// horizon fails without touching the input.
pub fn forecast_path<P: AsRef<Path>>(input: P, config: &PipelineConfig) -> Result<PipelineReport> {
    let pipeline = ForecastPipeline::new(config)?;
    let batch = DataLoader::load(input)?;
    pipeline.run(batch)
}
