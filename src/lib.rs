//! # World Population Forecasting
//!
//! Workspace facade over the member crates:
//!
//! - [`pop_math`]: differencing, lag polynomials, Yule-Walker and Nelder-Mead
//! - [`pop_forecast`]: dataset loading, ARIMA/SARIMA models and per-country evaluation
//!
//! ## Example
//!
//! ```
//! use worldpop_workspace::pop_forecast::{EntityRecord, EvaluationConfig, Evaluator};
//!
//! let years = [1970, 1980, 1990, 2000, 2010, 2015, 2020, 2022];
//! let record = EntityRecord::from_counts("TST", &years, &[100, 110, 125, 140, 160, 185, 210, 240]);
//!
//! let evaluator = Evaluator::new(EvaluationConfig::default()).unwrap();
//! let report = evaluator.evaluate(&[record]).unwrap();
//! assert_eq!(report.processed, 1);
//! ```

pub use pop_forecast;
pub use pop_math;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
