//! ARIMA models for population forecasting

use crate::error::{ForecastError, Result};
use crate::models::estimation::{self, FittedArima, ModelSpec};
use crate::models::{FitOptions, FittedModel, ForecastModel};
use serde::{Deserialize, Serialize};

/// Non-seasonal order `(p, d, q)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArimaOrder {
    /// AR order
    pub p: usize,
    /// Differencing order
    pub d: usize,
    /// MA order
    pub q: usize,
}

impl ArimaOrder {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.p > 10 {
            return Err(ForecastError::InvalidParameter(
                "AR order must be <= 10".to_string(),
            ));
        }
        if self.d > 2 {
            return Err(ForecastError::InvalidParameter(
                "Differencing order must be <= 2".to_string(),
            ));
        }
        if self.q > 10 {
            return Err(ForecastError::InvalidParameter(
                "MA order must be <= 10".to_string(),
            ));
        }
        Ok(())
    }
}

/// ARIMA model (AutoRegressive Integrated Moving Average)
#[derive(Debug, Clone)]
pub struct ArimaModel {
    /// Name of the model
    name: String,
    order: ArimaOrder,
}

impl ArimaModel {
    /// Create a new ARIMA model
    ///
    /// # Arguments
    ///
    /// * `p` - Order of autoregressive component (0-10)
    /// * `d` - Degree of differencing (0-2)
    /// * `q` - Order of moving average component (0-10)
    pub fn new(p: usize, d: usize, q: usize) -> Result<Self> {
        Self::from_order(ArimaOrder::new(p, d, q))
    }

    pub fn from_order(order: ArimaOrder) -> Result<Self> {
        order.validate()?;
        Ok(Self {
            name: format!("ARIMA({},{},{})", order.p, order.d, order.q),
            order,
        })
    }

    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    fn spec(&self) -> ModelSpec {
        ModelSpec {
            p: self.order.p,
            d: self.order.d,
            q: self.order.q,
            seasonal_p: 0,
            seasonal_d: 0,
            seasonal_q: 0,
            period: 0,
        }
    }

    /// Fit and keep the concrete fitted type
    pub fn fit_arima(&self, train: &[f64], options: &FitOptions) -> Result<FittedArima> {
        estimation::fit(self.spec(), &self.name, train, options)
    }
}

impl ForecastModel for ArimaModel {
    fn fit(&self, train: &[f64], options: &FitOptions) -> Result<Box<dyn FittedModel>> {
        Ok(Box::new(self.fit_arima(train, options)?))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn min_train_len(&self) -> usize {
        self.spec().min_train_len()
    }
}
