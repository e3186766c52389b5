//! Conditional-sum-of-squares estimation shared by ARIMA and SARIMA
//!
//! The training series is differenced `d` times at lag 1 and `D` times at the
//! seasonal period, rescaled by its root-mean-square, and the multiplicative
//! ARMA coefficients are chosen to minimise the sum of squared one-step
//! residuals. A mean term is estimated only when no differencing is applied.

use crate::error::{ForecastError, Result};
use crate::models::{FitOptions, FittedModel, Forecast};
use pop_math::autocorrelation::yule_walker;
use pop_math::differencing::DifferencingStages;
use pop_math::optimize::nelder_mead;
use pop_math::polynomial::{
    ar_operator, differencing_operator, ma_operator, multiply, psi_weights,
    recursion_coefficients,
};
use statrs::distribution::{ContinuousCDF, Normal};
use statrs::statistics::Statistics;
use std::time::Instant;
use tracing::trace;

/// Largest magnitude allowed for any AR or MA coefficient
const COEFFICIENT_BOUND: f64 = 5.0;

/// Full order of a (possibly seasonal) ARIMA model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ModelSpec {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub seasonal_p: usize,
    pub seasonal_d: usize,
    pub seasonal_q: usize,
    pub period: usize,
}

impl ModelSpec {
    pub fn include_mean(&self) -> bool {
        self.d + self.seasonal_d == 0
    }

    /// Number of estimated parameters
    pub fn parameter_count(&self) -> usize {
        self.coefficient_count() + usize::from(self.include_mean())
    }

    fn coefficient_count(&self) -> usize {
        self.p + self.q + self.seasonal_p + self.seasonal_q
    }

    /// Number of observations lost to differencing
    pub fn differencing_loss(&self) -> usize {
        self.d + self.seasonal_d * self.period
    }

    /// Largest lag of the combined AR operator
    pub fn max_ar_lag(&self) -> usize {
        self.p + self.seasonal_p * self.period
    }

    /// Enough observations to leave one more residual than parameters
    pub fn min_train_len(&self) -> usize {
        self.differencing_loss() + self.max_ar_lag() + self.parameter_count() + 1
    }

    fn operators(&self, params: &[f64]) -> (Vec<f64>, Vec<f64>, f64) {
        let (phi, rest) = params.split_at(self.p);
        let (theta, rest) = rest.split_at(self.q);
        let (seasonal_phi, rest) = rest.split_at(self.seasonal_p);
        let (seasonal_theta, rest) = rest.split_at(self.seasonal_q);
        let mean = rest.first().copied().unwrap_or(0.0);

        let ar = multiply(
            &ar_operator(phi, 1),
            &ar_operator(seasonal_phi, self.period),
        );
        let ma = multiply(
            &ma_operator(theta, 1),
            &ma_operator(seasonal_theta, self.period),
        );
        (ar, ma, mean)
    }
}

/// A fitted ARIMA or SARIMA model
#[derive(Debug, Clone)]
pub struct FittedArima {
    name: String,
    spec: ModelSpec,
    /// Combined AR operator `phi(B) Phi(B^s)`
    ar_operator: Vec<f64>,
    /// Combined MA operator `theta(B) Theta(B^s)`
    ma_operator: Vec<f64>,
    mean: f64,
    coefficients: Vec<f64>,
    /// Differenced training series
    differenced: Vec<f64>,
    /// One-step residuals aligned with `differenced`, zero where undefined
    residuals: Vec<f64>,
    stages: DifferencingStages,
    sigma2: f64,
    iterations: usize,
}

impl FittedArima {
    /// Estimated coefficients in the order AR, MA, seasonal AR, seasonal MA
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.coefficients[..self.spec.p]
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.coefficients[self.spec.p..self.spec.p + self.spec.q]
    }

    /// Estimated mean of the differenced series (zero when differenced)
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Residual variance
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    /// Optimizer iterations used by the fit
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    fn forecast_differenced(&self, horizon: usize) -> Vec<f64> {
        let ar = recursion_coefficients(&self.ar_operator);
        let ma = &self.ma_operator[1..];

        let n = self.differenced.len();
        let mut deviations: Vec<f64> = self.differenced.iter().map(|w| w - self.mean).collect();
        let mut shocks = self.residuals.clone();

        for _ in 0..horizon {
            let t = deviations.len();
            let mut prediction = 0.0;
            for (k, a) in ar.iter().enumerate().filter(|(k, _)| t > *k) {
                prediction += a * deviations[t - k - 1];
            }
            for (k, b) in ma.iter().enumerate().filter(|(k, _)| t > *k) {
                prediction += b * shocks[t - k - 1];
            }
            deviations.push(prediction);
            shocks.push(0.0);
        }

        deviations[n..].iter().map(|d| d + self.mean).collect()
    }

    fn point_forecast(&self, horizon: usize) -> Result<Vec<f64>> {
        let values = self.stages.integrate(&self.forecast_differenced(horizon));
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::ModelFit(format!(
                "{} produced a non-finite forecast",
                self.name
            )));
        }
        Ok(values)
    }
}

impl FittedModel for FittedArima {
    fn forecast(&self, horizon: usize) -> Result<Forecast> {
        Forecast::new(self.point_forecast(horizon)?, horizon)
    }

    fn forecast_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        if !(level > 0.0 && level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "Interval level must be between 0 and 1, got {}",
                level
            )));
        }

        let values = self.point_forecast(horizon)?;
        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| ForecastError::InvalidParameter(e.to_string()))?;
        let z = normal.inverse_cdf(0.5 + level / 2.0);

        let full_ar = multiply(
            &self.ar_operator,
            &differencing_operator(self.spec.d, self.spec.seasonal_d, self.spec.period),
        );
        let psi = psi_weights(&full_ar, &self.ma_operator, horizon);

        let mut cumulative = 0.0;
        let intervals = values
            .iter()
            .zip(&psi)
            .map(|(value, weight)| {
                cumulative += weight * weight;
                let margin = z * (self.sigma2 * cumulative).sqrt();
                (value - margin, value + margin)
            })
            .collect();

        Forecast::new_with_intervals(values, horizon, intervals, level)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Estimate `spec` on `train`
pub(crate) fn fit(
    spec: ModelSpec,
    name: &str,
    train: &[f64],
    options: &FitOptions,
) -> Result<FittedArima> {
    let required = spec.min_train_len();
    if train.len() < required {
        return Err(ForecastError::InsufficientData {
            required,
            actual: train.len(),
        });
    }
    if train.iter().any(|v| !v.is_finite()) {
        return Err(ForecastError::ModelFit(
            "training series contains non-finite values".to_string(),
        ));
    }
    if spec.coefficient_count() > 0 && train.windows(2).all(|w| w[0] == w[1]) {
        return Err(ForecastError::ModelFit(format!(
            "training series is constant; {} coefficients are not identified",
            name
        )));
    }

    let deadline = options.time_budget.map(|budget| Instant::now() + budget);
    let stages = DifferencingStages::apply(train, spec.d, spec.seasonal_d, spec.period)
        .map_err(ForecastError::from_fit)?;
    let differenced = stages.output().to_vec();

    let scale = match differenced.iter().quadratic_mean() {
        s if s.is_finite() && s > 0.0 => s,
        _ => 1.0,
    };
    let scaled: Vec<f64> = differenced.iter().map(|w| w / scale).collect();

    let initial = initial_parameters(&spec, &scaled)?;
    let bounds: Vec<(f64, f64)> = (0..initial.len())
        .map(|i| {
            if i < spec.coefficient_count() {
                (-COEFFICIENT_BOUND, COEFFICIENT_BOUND)
            } else {
                (f64::MIN, f64::MAX)
            }
        })
        .collect();

    let result = nelder_mead(
        |params| {
            conditional_residuals(&spec, &scaled, params)
                .iter()
                .map(|e| e * e)
                .sum::<f64>()
        },
        &initial,
        Some(&bounds),
        &options.optimizer,
        deadline,
    )
    .map_err(ForecastError::from_fit)?;

    let params = result.optimal_point;
    let residual_count = scaled.len() - spec.max_ar_lag();
    let sigma2 = result.optimal_value / residual_count as f64 * scale * scale;
    if !sigma2.is_finite() || params.iter().any(|p| !p.is_finite()) {
        return Err(ForecastError::ModelFit(format!(
            "{} produced non-finite estimates",
            name
        )));
    }

    let (ar, ma, scaled_mean) = spec.operators(&params);
    let mut residuals = vec![0.0; spec.max_ar_lag()];
    residuals.extend(
        conditional_residuals(&spec, &scaled, &params)
            .into_iter()
            .map(|e| e * scale),
    );

    trace!(
        "{} converged after {} iterations, sigma2 = {:.4}",
        name,
        result.iterations,
        sigma2
    );

    Ok(FittedArima {
        name: name.to_string(),
        spec,
        ar_operator: ar,
        ma_operator: ma,
        mean: scaled_mean * scale,
        coefficients: params[..spec.coefficient_count()].to_vec(),
        differenced,
        residuals,
        stages,
        sigma2,
        iterations: result.iterations,
    })
}

/// Yule-Walker start for the non-seasonal AR part, zeros elsewhere
fn initial_parameters(spec: &ModelSpec, scaled: &[f64]) -> Result<Vec<f64>> {
    let mut initial = yule_walker(scaled, spec.p)
        .map_err(ForecastError::from_fit)?
        .into_iter()
        .map(|c| c.clamp(-0.95, 0.95))
        .collect::<Vec<_>>();
    initial.resize(spec.coefficient_count(), 0.0);
    if spec.include_mean() {
        initial.push(scaled.mean());
    }
    Ok(initial)
}

/// One-step residuals for `t >= max_ar_lag`, with pre-sample shocks at zero
fn conditional_residuals(spec: &ModelSpec, series: &[f64], params: &[f64]) -> Vec<f64> {
    let (ar_op, ma_op, mean) = spec.operators(params);
    let ar = recursion_coefficients(&ar_op);
    let ma = &ma_op[1..];
    let start = ar.len();

    let deviations: Vec<f64> = series.iter().map(|w| w - mean).collect();
    let mut shocks = vec![0.0; series.len()];
    for t in start..series.len() {
        let mut prediction = 0.0;
        for (k, a) in ar.iter().enumerate() {
            prediction += a * deviations[t - k - 1];
        }
        for (k, b) in ma.iter().enumerate().filter(|(k, _)| t > *k) {
            prediction += b * shocks[t - k - 1];
        }
        shocks[t] = deviations[t] - prediction;
    }

    shocks.split_off(start)
}
