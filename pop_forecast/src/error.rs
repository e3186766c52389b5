//! Error types for the pop_forecast crate

use pop_math::MathError;
use thiserror::Error;

/// Custom error types for the pop_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// A year label or population count could not be parsed
    #[error("Malformed series for {entity}: {reason}")]
    MalformedSeries { entity: String, reason: String },

    /// Series too short for the requested split or model order
    #[error("Insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// Model estimation failed or produced a degenerate fit
    #[error("Model fit error: {0}")]
    ModelFit(String),

    /// Forecast and actual values differ in length
    #[error("Length mismatch: forecast has {forecast} values, actual has {actual}")]
    LengthMismatch { forecast: usize, actual: usize },

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error reading or validating configuration
    #[error("Config error: {0}")]
    ConfigError(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from CSV parsing
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error from JSON serialization
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error from numerical routines
    #[error("Math error: {0}")]
    MathError(#[from] MathError),

    /// The evaluation worker pool could not be started
    #[error("Worker error: {0}")]
    Worker(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<toml::de::Error> for ForecastError {
    fn from(err: toml::de::Error) -> Self {
        ForecastError::ConfigError(err.to_string())
    }
}

impl ForecastError {
    /// Map an optimizer failure to a model fit error
    pub(crate) fn from_fit(err: MathError) -> Self {
        match err {
            MathError::InsufficientData(msg) => {
                ForecastError::ModelFit(format!("insufficient data: {}", msg))
            }
            other => ForecastError::ModelFit(other.to_string()),
        }
    }
}
