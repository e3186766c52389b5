//! Forecasting models for population series
//!
//! A [`ForecastModel`] is a strategy object: it holds only the model
//! configuration and can be fitted to any number of training series, each
//! fit producing an independent [`FittedModel`].

use crate::error::{ForecastError, Result};
use pop_math::optimize::NelderMeadConfig;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::time::Duration;

pub mod arima;
pub mod estimation;
pub mod sarima;

pub use arima::{ArimaModel, ArimaOrder};
pub use estimation::FittedArima;
pub use sarima::{SarimaModel, SeasonalOrder};

/// Forecast containing predicted values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    /// Forecasted values
    values: Vec<f64>,
    /// Number of periods forecasted
    horizon: usize,
    /// Prediction intervals (optional)
    intervals: Option<Vec<(f64, f64)>>,
    /// Coverage of the prediction intervals
    level: Option<f64>,
}

impl Forecast {
    /// Create a new forecast
    pub fn new(values: Vec<f64>, horizon: usize) -> Result<Self> {
        if values.len() != horizon {
            return Err(ForecastError::LengthMismatch {
                forecast: values.len(),
                actual: horizon,
            });
        }

        Ok(Self {
            values,
            horizon,
            intervals: None,
            level: None,
        })
    }

    /// Create a new forecast with prediction intervals
    pub fn new_with_intervals(
        values: Vec<f64>,
        horizon: usize,
        intervals: Vec<(f64, f64)>,
        level: f64,
    ) -> Result<Self> {
        if intervals.len() != horizon {
            return Err(ForecastError::LengthMismatch {
                forecast: intervals.len(),
                actual: horizon,
            });
        }

        let mut forecast = Self::new(values, horizon)?;
        forecast.intervals = Some(intervals);
        forecast.level = Some(level);
        Ok(forecast)
    }

    /// Get the forecasted values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Get the number of periods forecasted
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Get the prediction intervals, if available
    pub fn intervals(&self) -> Option<&[(f64, f64)]> {
        self.intervals.as_deref()
    }

    /// Get the interval coverage, if available
    pub fn level(&self) -> Option<f64> {
        self.level
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}

/// Settings shared by every fit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FitOptions {
    pub optimizer: NelderMeadConfig,
    /// Wall-clock budget for a single fit
    pub time_budget: Option<Duration>,
}

impl FitOptions {
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }
}

/// A model fitted to one training series
pub trait FittedModel: Debug + Send {
    /// Forecast the next `horizon` values
    fn forecast(&self, horizon: usize) -> Result<Forecast>;

    /// Forecast with prediction intervals at coverage `level` in (0, 1)
    fn forecast_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast>;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Model configuration that can be fitted to a training series
pub trait ForecastModel: Debug + Send + Sync {
    /// Estimate the model on `train`
    fn fit(&self, train: &[f64], options: &FitOptions) -> Result<Box<dyn FittedModel>>;

    /// Get the name of the model
    fn name(&self) -> &str;

    /// Shortest training series this model can be estimated on
    fn min_train_len(&self) -> usize;
}

/// Model family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFamily {
    /// Non-seasonal ARIMA(p, d, q)
    Arima,
    /// Seasonal ARIMA(p, d, q)(P, D, Q, s)
    Sarima,
}

/// Serializable model selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "lowercase")]
pub enum ModelConfig {
    Arima {
        order: ArimaOrder,
    },
    Sarima {
        order: ArimaOrder,
        seasonal: SeasonalOrder,
    },
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig::Arima {
            order: ArimaOrder::new(1, 1, 0),
        }
    }
}

impl ModelConfig {
    /// ARIMA(2,1,0), needs six training points so it fits census-length series
    pub fn compact_arima() -> Self {
        ModelConfig::Arima {
            order: ArimaOrder::new(2, 1, 0),
        }
    }

    /// ARIMA(5,1,0), a higher-order challenger for the default
    pub fn reference_arima() -> Self {
        ModelConfig::Arima {
            order: ArimaOrder::new(5, 1, 0),
        }
    }

    /// SARIMA(1,1,1)(1,1,1,12), the seasonal challenger
    pub fn reference_sarima() -> Self {
        ModelConfig::Sarima {
            order: ArimaOrder::new(1, 1, 1),
            seasonal: SeasonalOrder::new(1, 1, 1, 12),
        }
    }

    pub fn family(&self) -> ModelFamily {
        match self {
            ModelConfig::Arima { .. } => ModelFamily::Arima,
            ModelConfig::Sarima { .. } => ModelFamily::Sarima,
        }
    }

    /// Build the strategy object for this configuration
    pub fn build(&self) -> Result<Box<dyn ForecastModel>> {
        Ok(match self {
            ModelConfig::Arima { order } => Box::new(ArimaModel::from_order(*order)?),
            ModelConfig::Sarima { order, seasonal } => {
                Box::new(SarimaModel::new(*order, *seasonal)?)
            }
        })
    }
}
