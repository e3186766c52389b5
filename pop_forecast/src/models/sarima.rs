//! Seasonal ARIMA models

use crate::error::{ForecastError, Result};
use crate::models::arima::ArimaOrder;
use crate::models::estimation::{self, FittedArima, ModelSpec};
use crate::models::{FitOptions, FittedModel, ForecastModel};
use serde::{Deserialize, Serialize};

/// Longest seasonal period accepted at construction
pub const MAX_SEASONAL_PERIOD: usize = 1024;

/// Seasonal order `(P, D, Q, s)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonalOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    /// Number of observations per season
    pub period: usize,
}

impl SeasonalOrder {
    pub fn new(p: usize, d: usize, q: usize, period: usize) -> Self {
        Self { p, d, q, period }
    }

    fn is_active(&self) -> bool {
        self.p + self.d + self.q > 0
    }
}

/// SARIMA model: ARIMA with multiplicative seasonal AR, MA and differencing terms
#[derive(Debug, Clone)]
pub struct SarimaModel {
    name: String,
    order: ArimaOrder,
    seasonal: SeasonalOrder,
}

impl SarimaModel {
    pub fn new(order: ArimaOrder, seasonal: SeasonalOrder) -> Result<Self> {
        order.validate()?;
        if seasonal.p > 4 || seasonal.q > 4 {
            return Err(ForecastError::InvalidParameter(
                "Seasonal AR and MA orders must be <= 4".to_string(),
            ));
        }
        if seasonal.d > 1 {
            return Err(ForecastError::InvalidParameter(
                "Seasonal differencing order must be <= 1".to_string(),
            ));
        }
        if seasonal.is_active() && seasonal.period < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "Seasonal period must be at least 2, got {}",
                seasonal.period
            )));
        }
        if seasonal.period > MAX_SEASONAL_PERIOD {
            return Err(ForecastError::InvalidParameter(format!(
                "Seasonal period must be <= {}, got {}",
                MAX_SEASONAL_PERIOD, seasonal.period
            )));
        }

        Ok(Self {
            name: format!(
                "SARIMA({},{},{})({},{},{},{})",
                order.p, order.d, order.q, seasonal.p, seasonal.d, seasonal.q, seasonal.period
            ),
            order,
            seasonal,
        })
    }

    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    pub fn seasonal_order(&self) -> SeasonalOrder {
        self.seasonal
    }

    fn spec(&self) -> ModelSpec {
        ModelSpec {
            p: self.order.p,
            d: self.order.d,
            q: self.order.q,
            seasonal_p: self.seasonal.p,
            seasonal_d: self.seasonal.d,
            seasonal_q: self.seasonal.q,
            period: if self.seasonal.is_active() {
                self.seasonal.period
            } else {
                0
            },
        }
    }

    /// Fit and keep the concrete fitted type
    pub fn fit_sarima(&self, train: &[f64], options: &FitOptions) -> Result<FittedArima> {
        estimation::fit(self.spec(), &self.name, train, options)
    }
}

impl ForecastModel for SarimaModel {
    fn fit(&self, train: &[f64], options: &FitOptions) -> Result<Box<dyn FittedModel>> {
        Ok(Box::new(self.fit_sarima(train, options)?))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn min_train_len(&self) -> usize {
        self.spec().min_train_len()
    }
}
