//! Error types for crypto_forecast

use thiserror::Error;

/// Main error type for crypto_forecast
#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Insufficient data: need more than {required} samples, got {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Shape mismatch in {context}: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        context: String,
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Exchange API error: {0}")]
    ApiError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

impl ForecastError {
    pub(crate) fn shape(context: &str, expected: &[usize], got: &[usize]) -> Self {
        ForecastError::ShapeMismatch {
            context: context.to_string(),
            expected: expected.to_vec(),
            got: got.to_vec(),
        }
    }
}

/// Result type alias for crypto_forecast operations
pub type Result<T> = std::result::Result<T, ForecastError>;
