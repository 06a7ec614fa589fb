use sentinel_forecast::{ForecastError, Metric};
use sentinel_math::MathError;
use std::io;

#[test]
fn test_error_conversion() {
    let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
    let forecast_error = ForecastError::from(io_error);
    assert!(matches!(forecast_error, ForecastError::IoError(_)));

    let math_error = MathError::InsufficientData("need 3 points".to_string());
    let forecast_error = ForecastError::from(math_error);
    assert!(matches!(forecast_error, ForecastError::MathError(_)));

    let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let forecast_error = ForecastError::from(json_error);
    assert!(matches!(forecast_error, ForecastError::JsonError(_)));
}

#[test]
fn test_error_display() {
    let error = ForecastError::InsufficientData {
        metric: Metric::Water,
        distinct: 2,
        required: 3,
    };
    let message = error.to_string();
    assert!(message.contains("water_pct"));
    assert!(message.contains("2 distinct time points"));

    assert_eq!(
        ForecastError::InvalidHorizon(-1).to_string(),
        "Invalid horizon: -1 months (must be >= 0)"
    );

    let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "permission denied");
    let message = ForecastError::from(io_error).to_string();
    assert!(message.contains("IO error"));
    assert!(message.contains("permission denied"));
}

#[test]
fn test_recoverable_errors() {
    let per_metric = ForecastError::InsufficientData {
        metric: Metric::SnowIce,
        distinct: 0,
        required: 3,
    };
    assert!(per_metric.is_recoverable());

    assert!(!ForecastError::NoData.is_recoverable());
    assert!(!ForecastError::NoModelsFit.is_recoverable());
    assert!(!ForecastError::InvalidHorizon(-2).is_recoverable());
}
