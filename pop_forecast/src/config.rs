//! Run configuration, loadable from TOML

use crate::data::LoaderConfig;
use crate::error::{ForecastError, Result};
use crate::models::{FitOptions, ModelConfig};
use crate::utils::DEFAULT_HORIZON;
use pop_math::optimize::NelderMeadConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Settings for one evaluation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Number of held-out observations per entity
    pub horizon: usize,
    /// Number of worst entities to rank
    pub top_k: usize,
    pub model: ModelConfig,
    /// Worker threads; 1 runs sequentially
    pub workers: usize,
    /// Wall-clock budget per fit in milliseconds
    pub max_fit_millis: Option<u64>,
    pub optimizer: NelderMeadConfig,
    /// Normalized MAE above which an entity is reported as an outlier
    pub outlier_threshold: f64,
    /// Prediction interval coverage for projections
    pub interval_level: f64,
    pub loader: LoaderConfig,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            horizon: DEFAULT_HORIZON,
            top_k: 5,
            model: ModelConfig::default(),
            workers: 1,
            max_fit_millis: Some(5000),
            optimizer: NelderMeadConfig::default(),
            outlier_threshold: 1.0,
            interval_level: 0.95,
            loader: LoaderConfig::default(),
        }
    }
}

impl EvaluationConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let source = fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Check ranges that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.horizon == 0 {
            return Err(ForecastError::ConfigError(
                "horizon must be at least 1".to_string(),
            ));
        }
        if self.workers == 0 {
            return Err(ForecastError::ConfigError(
                "workers must be at least 1".to_string(),
            ));
        }
        if !(self.interval_level > 0.0 && self.interval_level < 1.0) {
            return Err(ForecastError::ConfigError(format!(
                "interval_level must be between 0 and 1, got {}",
                self.interval_level
            )));
        }
        if !self.outlier_threshold.is_finite() || self.outlier_threshold < 0.0 {
            return Err(ForecastError::ConfigError(format!(
                "outlier_threshold must be a non-negative number, got {}",
                self.outlier_threshold
            )));
        }
        if self.optimizer.max_iter == 0 {
            return Err(ForecastError::ConfigError(
                "optimizer.max_iter must be at least 1".to_string(),
            ));
        }
        if self.loader.id_column.trim().is_empty() {
            return Err(ForecastError::ConfigError(
                "loader.id_column must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn fit_options(&self) -> FitOptions {
        FitOptions {
            optimizer: self.optimizer.clone(),
            time_budget: self.max_fit_millis.map(Duration::from_millis),
        }
    }
}
