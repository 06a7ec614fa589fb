use sentinel_forecast::report;
use sentinel_forecast::{DataLoader, ForecastPipeline, PipelineConfig, TrainedForecastModel};
use std::fs;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Sentinel Forecast: CSV Example");
    println!("==============================\n");

    // Write a small scene table; pass a path to use your own instead
    let input = match std::env::args().nth(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let path = std::env::temp_dir().join("sentinel_forecast_demo.csv");
            fs::write(&path, sample_csv())?;
            path
        }
    };
    println!("Loading scenes from {}", input.display());

    let batch = DataLoader::load(&input)?;
    println!("Loaded {} records\n", batch.len());

    let config = PipelineConfig::default();
    let pipeline = ForecastPipeline::new(&config)?;
    let run = pipeline.run(batch)?;

    println!("Fitted models:");
    for (metric, model) in run.models.iter() {
        let coefficients = model.coefficients();
        println!(
            "  {:<18} y = {:.4} + {:.4}*t + {:.6}*t^2   ({})",
            metric,
            coefficients[0],
            coefficients.get(1).copied().unwrap_or(0.0),
            coefficients.get(2).copied().unwrap_or(0.0),
            model.fit_quality()
        );
    }
    println!();
    println!("{}", run);

    let out_dir = std::env::temp_dir().join("sentinel_forecast_demo");
    for path in report::write_outputs(&run, &out_dir, true)? {
        println!("Wrote {}", path.display());
    }

    Ok(())
}

fn sample_csv() -> String {
    let mut csv = String::from(
        "fecha,vegetation_pct,not_vegetated_pct,water_pct,cloud_cover,snow_ice_pct\n",
    );
    let rows = [
        ("2024-01-05", 20.1, 55.2, 8.0, 12.5, 4.2),
        ("2024-01-15", 22.4, 54.0, 8.3, 9.8, 5.5),
        ("2024-01-25", 25.0, 52.1, 8.1, 10.4, 4.4),
        ("2024-02-04", 24.2, 53.5, 7.9, 11.0, 3.4),
        ("2024-02-14", 27.3, 51.0, 8.4, 8.7, 4.6),
        ("2024-02-24", 28.9, 50.2, 8.2, 9.1, 3.6),
    ];
    for (date, veg, bare, water, cloud, snow) in rows {
        csv.push_str(&format!(
            "{},{},{},{},{},{}\n",
            date, veg, bare, water, cloud, snow
        ));
    }
    csv
}
