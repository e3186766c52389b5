//! Utility functions for the pop_forecast crate

use crate::data::{to_values, Observation, PopulationSeries};
use crate::error::{ForecastError, Result};

/// Default number of held-out observations
pub const DEFAULT_HORIZON: usize = 3;

/// Chronological split of a series into a training prefix and a test suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainTestSplit<'a> {
    train: &'a [Observation],
    test: &'a [Observation],
}

impl<'a> TrainTestSplit<'a> {
    /// Hold out the final `horizon` observations of `series`
    pub fn new(series: &'a PopulationSeries, horizon: usize) -> Result<Self> {
        let (train, test) = train_test_split(series.observations(), horizon)?;
        Ok(Self { train, test })
    }

    pub fn train(&self) -> &'a [Observation] {
        self.train
    }

    pub fn test(&self) -> &'a [Observation] {
        self.test
    }

    pub fn train_values(&self) -> Vec<f64> {
        to_values(self.train)
    }

    pub fn test_values(&self) -> Vec<f64> {
        to_values(self.test)
    }

    pub fn horizon(&self) -> usize {
        self.test.len()
    }
}

/// Split time series data into training and test sets.
///
/// The test set is always the last `horizon` items; at least one training
/// item must remain.
pub fn train_test_split<T>(data: &[T], horizon: usize) -> Result<(&[T], &[T])> {
    if horizon == 0 {
        return Err(ForecastError::InvalidParameter(
            "Test horizon must be at least 1".to_string(),
        ));
    }
    if data.len() <= horizon {
        return Err(ForecastError::InsufficientData {
            required: horizon + 1,
            actual: data.len(),
        });
    }

    Ok(data.split_at(data.len() - horizon))
}
