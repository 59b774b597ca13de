//! Error creation and message formatting

use crypto_forecast::error::ForecastError;

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn test_insufficient_data_message() {
        let err = ForecastError::InsufficientData {
            required: 30,
            available: 12,
        };

        let msg = err.to_string();
        assert!(msg.contains("Insufficient data"));
        assert!(msg.contains("30"));
        assert!(msg.contains("12"));
    }

    #[test]
    fn test_shape_mismatch_message() {
        let err = ForecastError::ShapeMismatch {
            context: "Lstm::step input".to_string(),
            expected: vec![20, 30],
            got: vec![20, 29],
        };

        let msg = err.to_string();
        assert!(msg.contains("Lstm::step input"));
        assert!(msg.contains("[20, 30]"));
        assert!(msg.contains("[20, 29]"));
    }

    #[test]
    fn test_api_error_message() {
        let err = ForecastError::ApiError("Invalid currency pair.".to_string());
        assert_eq!(err.to_string(), "Exchange API error: Invalid currency pair.");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "candles.csv");
        let err: ForecastError = io.into();
        assert!(matches!(err, ForecastError::IoError(_)));
        assert!(err.to_string().contains("candles.csv"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json = serde_json::from_str::<Vec<f32>>("not json").unwrap_err();
        let err: ForecastError = json.into();
        assert!(matches!(err, ForecastError::SerdeError(_)));
    }

    #[test]
    fn test_config_errors_surface_from_parsing() {
        let err = "BTC-ETH"
            .parse::<crypto_forecast::types::CurrencyPair>()
            .unwrap_err();
        assert!(err.to_string().starts_with("Configuration error"));
    }
}
