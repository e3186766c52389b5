//! Differencing and integration of series
//!
//! A differencing stage at lag `k` maps `x` to `x[t] - x[t - k]`. ARIMA models
//! apply `d` stages at lag 1 followed by `D` stages at the seasonal period;
//! forecasts are then integrated back through the same stages in reverse.

use crate::{MathError, Result};

/// Difference a series once at the given lag
pub fn difference_at_lag(data: &[f64], lag: usize) -> Result<Vec<f64>> {
    if lag == 0 {
        return Err(MathError::InvalidInput(
            "Differencing lag must be at least 1".to_string(),
        ));
    }
    if data.len() <= lag {
        return Err(MathError::InsufficientData(format!(
            "Differencing at lag {} needs more than {} observations, got {}",
            lag,
            lag,
            data.len()
        )));
    }

    Ok(data.windows(lag + 1).map(|w| w[lag] - w[0]).collect())
}

/// Apply `order` first differences
pub fn difference(data: &[f64], order: usize) -> Result<Vec<f64>> {
    let mut result = data.to_vec();
    for _ in 0..order {
        result = difference_at_lag(&result, 1)?;
    }
    Ok(result)
}

/// Record of the series before each differencing stage.
///
/// Stage `i` holds the lag that was applied and the series it was applied to,
/// which is exactly the history needed to undo it.
#[derive(Debug, Clone, PartialEq)]
pub struct DifferencingStages {
    stages: Vec<(usize, Vec<f64>)>,
    output: Vec<f64>,
}

impl DifferencingStages {
    /// Difference `data` `d` times at lag 1, then `seasonal_d` times at `period`
    pub fn apply(data: &[f64], d: usize, seasonal_d: usize, period: usize) -> Result<Self> {
        if seasonal_d > 0 && period < 2 {
            return Err(MathError::InvalidInput(format!(
                "Seasonal differencing needs a period of at least 2, got {}",
                period
            )));
        }

        let lags = std::iter::repeat(1)
            .take(d)
            .chain(std::iter::repeat(period).take(seasonal_d));

        let mut stages = Vec::with_capacity(d + seasonal_d);
        let mut current = data.to_vec();
        for lag in lags {
            let next = difference_at_lag(&current, lag)?;
            stages.push((lag, current));
            current = next;
        }

        Ok(Self {
            stages,
            output: current,
        })
    }

    /// The fully differenced series
    pub fn output(&self) -> &[f64] {
        &self.output
    }

    /// Number of differencing stages applied
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// True when no differencing was applied
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Lags of the stages in the order they were applied
    pub fn lags(&self) -> Vec<usize> {
        self.stages.iter().map(|(lag, _)| *lag).collect()
    }

    /// Map forecasts of the differenced series back to the original scale
    pub fn integrate(&self, forecasts: &[f64]) -> Vec<f64> {
        self.stages
            .iter()
            .rev()
            .fold(forecasts.to_vec(), |acc, (lag, history)| {
                integrate(&acc, history, *lag)
            })
    }
}

/// Undo one differencing stage at `lag`, continuing from `history`
pub fn integrate(forecasts: &[f64], history: &[f64], lag: usize) -> Vec<f64> {
    let mut extended = history.to_vec();
    extended.reserve(forecasts.len());

    for &diff in forecasts {
        let base = extended
            .len()
            .checked_sub(lag)
            .map(|idx| extended[idx])
            .unwrap_or(0.0);
        extended.push(base + diff);
    }

    extended.split_off(history.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_and_second_difference() {
        let data = vec![1.0, 3.0, 6.0, 10.0, 15.0];

        assert_eq!(difference(&data, 1).unwrap(), vec![2.0, 3.0, 4.0, 5.0]);
        assert_eq!(difference(&data, 2).unwrap(), vec![1.0, 1.0, 1.0]);
        assert_eq!(difference(&data, 0).unwrap(), data);
    }

    #[test]
    fn test_difference_needs_data() {
        assert!(difference(&[1.0], 1).is_err());
        assert!(difference_at_lag(&[1.0, 2.0], 0).is_err());
    }

    #[test]
    fn test_integrate_reverses_difference() {
        let data = vec![100.0, 110.0, 125.0, 140.0, 160.0];
        let stages = DifferencingStages::apply(&data[..3], 1, 0, 0).unwrap();
        assert_eq!(stages.output(), &[10.0, 15.0]);

        // Feeding the true future differences reproduces the true future values
        let restored = stages.integrate(&[15.0, 20.0]);
        assert_eq!(restored, vec![140.0, 160.0]);
    }

    #[test]
    fn test_seasonal_stage_round_trip() {
        let data: Vec<f64> = (0..12).map(|i| (i % 4) as f64 * 10.0 + i as f64).collect();
        let stages = DifferencingStages::apply(&data[..8], 1, 1, 4).unwrap();
        assert_eq!(stages.lags(), vec![1, 4]);

        let full = DifferencingStages::apply(&data, 1, 1, 4).unwrap();
        let future_diffs = &full.output()[stages.output().len()..];
        let restored = stages.integrate(future_diffs);

        for (restored, actual) in restored.iter().zip(&data[8..]) {
            assert!((restored - actual).abs() < 1e-9);
        }
    }

    #[test]
    fn test_seasonal_period_validation() {
        assert!(DifferencingStages::apply(&[1.0, 2.0, 3.0], 0, 1, 1).is_err());
        assert!(DifferencingStages::apply(&[1.0, 2.0, 3.0], 0, 1, 12).is_err());
    }
}
