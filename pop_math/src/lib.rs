//! # Pop Math
//!
//! Numerical building blocks for fitting ARIMA-family models to short
//! population series.
//!
//! - Regular and seasonal differencing, and integrating forecasts back
//! - Lag polynomial products and psi weights
//! - Sample autocovariance and Yule-Walker estimates via Levinson-Durbin
//! - A bounded Nelder-Mead simplex optimizer

use thiserror::Error;

pub mod autocorrelation;
pub mod differencing;
pub mod optimize;
pub mod polynomial;

/// Errors that can occur in numerical calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),

    #[error("Optimizer did not converge after {iterations} iterations")]
    NotConverged { iterations: usize },

    #[error("Optimizer exceeded its time budget after {iterations} iterations")]
    DeadlineExceeded { iterations: usize },
}

/// Result type for numerical operations
pub type Result<T> = std::result::Result<T, MathError>;
