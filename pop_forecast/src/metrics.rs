//! Metrics for evaluating forecast accuracy

use crate::error::{ForecastError, Result};
use serde::Serialize;

/// Compute point-forecast error metrics against held-out actual values
///
/// Fails with `LengthMismatch` when the slices differ in length and with
/// `InvalidParameter` when both are empty.
pub fn compute_metrics(forecast: &[f64], actual: &[f64]) -> Result<ErrorMetrics> {
    if forecast.len() != actual.len() {
        return Err(ForecastError::LengthMismatch {
            forecast: forecast.len(),
            actual: actual.len(),
        });
    }
    if forecast.is_empty() {
        return Err(ForecastError::InvalidParameter(
            "Cannot compute metrics on empty series".to_string(),
        ));
    }

    let n = forecast.len() as f64;
    let (abs_sum, sq_sum) = forecast
        .iter()
        .zip(actual)
        .fold((0.0, 0.0), |(abs_sum, sq_sum), (f, a)| {
            let error = f - a;
            (abs_sum + error.abs(), sq_sum + error * error)
        });

    let mse = sq_sum / n;
    Ok(ErrorMetrics {
        mae: abs_sum / n,
        mse,
        rmse: mse.sqrt(),
    })
}

/// Forecast error metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ErrorMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
}

impl ErrorMetrics {
    /// Scale the metrics by a reference level, usually the latest actual value
    ///
    /// Returns `None` when the reference is zero or not finite. MSE is scaled
    /// by the square of the reference so that `rmse == sqrt(mse)` still holds.
    pub fn normalized(&self, reference: f64) -> Option<ErrorMetrics> {
        if reference == 0.0 || !reference.is_finite() {
            return None;
        }
        let scale = reference.abs();
        Some(ErrorMetrics {
            mae: self.mae / scale,
            mse: self.mse / (scale * scale),
            rmse: self.rmse / scale,
        })
    }
}

impl std::fmt::Display for ErrorMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Forecast Error Metrics:")?;
        writeln!(f, "  MAE:     {:.4}", self.mae)?;
        writeln!(f, "  MSE:     {:.4}", self.mse)?;
        writeln!(f, "  RMSE:    {:.4}", self.rmse)?;
        Ok(())
    }
}
