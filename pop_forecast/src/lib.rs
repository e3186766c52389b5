//! # Pop Forecast
//!
//! Per-country forecast evaluation for world population census tables.
//!
//! ## Features
//!
//! - Wide CSV loading (one column per census year) with per-row normalization
//! - Chronological train/test splitting
//! - ARIMA and seasonal ARIMA models estimated by conditional sum of squares
//! - MAE / RMSE scoring, normalized by the latest census count
//! - Batch evaluation that skips entities whose fit fails, optionally across worker threads
//! - Text and JSON reports with the worst-forecast ranking
//!
//! ## Quick Start
//!
//! ```no_run
//! use pop_forecast::config::EvaluationConfig;
//! use pop_forecast::data::DataLoader;
//! use pop_forecast::evaluation::Evaluator;
//!
//! let config = EvaluationConfig::default();
//! let records = DataLoader::from_csv("world_population.csv", &config.loader)?;
//!
//! let evaluator = Evaluator::new(config)?;
//! let report = evaluator.evaluate(&records)?;
//! println!("{}", report);
//! # Ok::<(), pop_forecast::ForecastError>(())
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod evaluation;
pub mod metrics;
pub mod models;
pub mod report;
pub mod utils;

// Re-export commonly used types
pub use crate::config::EvaluationConfig;
pub use crate::data::{DataLoader, EntityRecord, LoaderConfig, Observation, PopulationSeries};
pub use crate::error::{ForecastError, Result};
pub use crate::evaluation::{Evaluator, ModelComparison, Projection};
pub use crate::metrics::{compute_metrics, ErrorMetrics};
pub use crate::models::{Forecast, ForecastModel, FittedModel, ModelConfig};
pub use crate::report::{EntityFailure, EntityOutcome, EvaluationReport, ForecastResult, SkipReason};
pub use crate::utils::{train_test_split, TrainTestSplit};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
