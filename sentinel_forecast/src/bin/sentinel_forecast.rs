use clap::{Parser, Subcommand};
use sentinel_forecast::report;
use sentinel_forecast::{normalizer, stats, DataLoader, ForecastPipeline, PipelineConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sentinel_forecast")]
#[command(about = "Trend forecasts of Sentinel-2 land cover percentages")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit, forecast and write the CSV, JSON and HTML outputs
    Run {
        /// CSV table, GeoJSON item or directory of scene GeoJSON files
        #[arg(short, long)]
        input: PathBuf,
        /// JSON configuration; unset fields keep their defaults
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Months to forecast, overriding the configuration
        #[arg(long, allow_hyphen_values = true)]
        horizon_months: Option<i64>,
        #[arg(short, long, default_value = "resultados")]
        output_dir: PathBuf,
        /// Skip the HTML report
        #[arg(long)]
        no_html: bool,
    },
    /// Print descriptive statistics of the observed metrics
    Describe {
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input,
            config,
            horizon_months,
            output_dir,
            no_html,
        } => {
            let mut config = match config {
                Some(path) => PipelineConfig::from_json_file(path)?,
                None => PipelineConfig::default(),
            };
            if let Some(months) = horizon_months {
                config = config.with_horizon_months(months);
            }

            // Rejects a bad horizon before anything is read
            let pipeline = ForecastPipeline::new(&config)?;

            let batch = DataLoader::load(&input)?;
            let run = pipeline.run(batch)?;
            println!("{}", run);

            let written = report::write_outputs(&run, &output_dir, !no_html)?;
            for path in written {
                println!("Wrote {}", path.display());
            }
        }
        Commands::Describe { input } => {
            let batch = DataLoader::load(&input)?;
            let (series, normalization) = normalizer::normalize(batch)?;

            println!(
                "{} observations from {} to {} ({} records dropped)",
                series.len(),
                series.first_timestamp().format("%Y-%m-%d"),
                series.last_timestamp().format("%Y-%m-%d"),
                normalization.dropped_count()
            );
            for (metric, summary) in stats::describe(&series).iter() {
                println!("{:<18} {}", metric.column_name(), summary);
            }
        }
    }

    Ok(())
}
