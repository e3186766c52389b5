//! Per-entity results and the aggregate evaluation report

use crate::error::{ForecastError, Result};
use crate::metrics::ErrorMetrics;
use chrono::{DateTime, Utc};
use serde::Serialize;
use statrs::statistics::Statistics;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Forecast evaluation for one entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    /// Entity identifier
    pub entity: String,
    /// Display name, when the dataset carries one
    pub name: Option<String>,
    /// Name of the fitted model
    pub model: String,
    /// Years of the held-out observations
    pub years: Vec<i32>,
    pub forecast: Vec<f64>,
    pub actual: Vec<f64>,
    pub mae: f64,
    pub rmse: f64,
    /// MAE divided by the latest actual value
    pub normalized_mae: Option<f64>,
    /// RMSE divided by the latest actual value
    pub normalized_rmse: Option<f64>,
}

impl ForecastResult {
    pub(crate) fn new(
        entity: impl Into<String>,
        name: Option<String>,
        model: impl Into<String>,
        years: Vec<i32>,
        forecast: Vec<f64>,
        actual: Vec<f64>,
        metrics: ErrorMetrics,
    ) -> Self {
        let normalized = actual
            .last()
            .and_then(|latest| metrics.normalized(*latest));
        Self {
            entity: entity.into(),
            name,
            model: model.into(),
            years,
            forecast,
            actual,
            mae: metrics.mae,
            rmse: metrics.rmse,
            normalized_mae: normalized.map(|m| m.mae),
            normalized_rmse: normalized.map(|m| m.rmse),
        }
    }
}

/// Why an entity was left out of the aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum SkipReason {
    MalformedSeries,
    InsufficientData,
    ModelFit,
}

impl SkipReason {
    /// Per-entity errors map to a reason; everything else is fatal to the run
    pub fn classify(error: &ForecastError) -> Option<SkipReason> {
        match error {
            ForecastError::MalformedSeries { .. } => Some(SkipReason::MalformedSeries),
            ForecastError::InsufficientData { .. } => Some(SkipReason::InsufficientData),
            ForecastError::ModelFit(_) => Some(SkipReason::ModelFit),
            _ => None,
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SkipReason::MalformedSeries => "malformed series",
            SkipReason::InsufficientData => "insufficient data",
            SkipReason::ModelFit => "model fit",
        };
        f.write_str(label)
    }
}

/// An entity that could not be evaluated
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityFailure {
    pub entity: String,
    pub reason: SkipReason,
    pub message: String,
}

impl EntityFailure {
    /// Wrap a per-entity error, handing fatal errors back to the caller
    pub fn from_error(entity: impl Into<String>, error: ForecastError) -> Result<Self> {
        match SkipReason::classify(&error) {
            Some(reason) => Ok(Self {
                entity: entity.into(),
                reason,
                message: error.to_string(),
            }),
            None => Err(error),
        }
    }
}

/// Outcome of evaluating one entity
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum EntityOutcome {
    Succeeded(ForecastResult),
    Failed(EntityFailure),
}

impl EntityOutcome {
    pub fn entity(&self) -> &str {
        match self {
            EntityOutcome::Succeeded(result) => &result.entity,
            EntityOutcome::Failed(failure) => &failure.entity,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, EntityOutcome::Succeeded(_))
    }
}

/// Aggregate report over every entity of a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub generated_at: DateTime<Utc>,
    pub processed: usize,
    pub skipped: usize,
    pub skip_reasons: BTreeMap<SkipReason, usize>,
    pub mean_mae: Option<f64>,
    pub mean_rmse: Option<f64>,
    pub mean_normalized_mae: Option<f64>,
    pub mean_normalized_rmse: Option<f64>,
    /// Worst entities by normalized MAE
    pub top_errors: Vec<ForecastResult>,
    /// Entities whose normalized MAE exceeds `outlier_threshold`
    pub outliers: Vec<ForecastResult>,
    pub outlier_threshold: f64,
    pub results: Vec<ForecastResult>,
    pub failures: Vec<EntityFailure>,
}

impl EvaluationReport {
    /// Fold per-entity outcomes, kept in input order, into a report
    pub fn from_outcomes(
        outcomes: Vec<EntityOutcome>,
        top_k: usize,
        outlier_threshold: f64,
    ) -> Self {
        let processed = outcomes.len();
        let mut results = Vec::new();
        let mut failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                EntityOutcome::Succeeded(result) => results.push(result),
                EntityOutcome::Failed(failure) => failures.push(failure),
            }
        }

        let mut skip_reasons = BTreeMap::new();
        for failure in &failures {
            *skip_reasons.entry(failure.reason).or_insert(0) += 1;
        }

        let mean_mae = mean_of(results.iter().map(|r| Some(r.mae)));
        let mean_rmse = mean_of(results.iter().map(|r| Some(r.rmse)));
        let mean_normalized_mae = mean_of(results.iter().map(|r| r.normalized_mae));
        let mean_normalized_rmse = mean_of(results.iter().map(|r| r.normalized_rmse));

        let mut ranked: Vec<&ForecastResult> = results
            .iter()
            .filter(|r| r.normalized_mae.is_some())
            .collect();
        ranked.sort_by(|a, b| rank_order(a, b));
        let top_errors = ranked.into_iter().take(top_k).cloned().collect();

        let outliers = results
            .iter()
            .filter(|r| r.normalized_mae.map_or(false, |e| e > outlier_threshold))
            .cloned()
            .collect();

        Self {
            generated_at: Utc::now(),
            processed,
            skipped: failures.len(),
            skip_reasons,
            mean_mae,
            mean_rmse,
            mean_normalized_mae,
            mean_normalized_rmse,
            top_errors,
            outliers,
            outlier_threshold,
            results,
            failures,
        }
    }

    pub fn succeeded(&self) -> usize {
        self.results.len()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Descending normalized MAE, ties by entity id ascending
fn rank_order(a: &ForecastResult, b: &ForecastResult) -> Ordering {
    let a_err = a.normalized_mae.unwrap_or(f64::NEG_INFINITY);
    let b_err = b.normalized_mae.unwrap_or(f64::NEG_INFINITY);
    b_err
        .total_cmp(&a_err)
        .then_with(|| a.entity.cmp(&b.entity))
}

fn mean_of(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let present: Vec<f64> = values.flatten().collect();
    if present.is_empty() {
        None
    } else {
        Some(present.mean())
    }
}

fn fmt_optional(value: Option<f64>, percent: bool) -> String {
    match value {
        Some(v) if percent => format!("{:.4}%", v * 100.0),
        Some(v) => format!("{:.2}", v),
        None => "n/a".to_string(),
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Population Forecast Evaluation:")?;
        writeln!(f, "  Generated:       {}", self.generated_at.to_rfc3339())?;
        writeln!(f, "  Entities:        {}", self.processed)?;
        writeln!(f, "  Evaluated:       {}", self.succeeded())?;
        writeln!(f, "  Skipped:         {}", self.skipped)?;
        for (reason, count) in &self.skip_reasons {
            writeln!(f, "    {:<16} {}", format!("{}:", reason), count)?;
        }
        writeln!(f, "  Mean MAE:        {}", fmt_optional(self.mean_mae, false))?;
        writeln!(f, "  Mean RMSE:       {}", fmt_optional(self.mean_rmse, false))?;
        writeln!(
            f,
            "  Mean norm. MAE:  {}",
            fmt_optional(self.mean_normalized_mae, true)
        )?;
        writeln!(
            f,
            "  Mean norm. RMSE: {}",
            fmt_optional(self.mean_normalized_rmse, true)
        )?;

        if !self.top_errors.is_empty() {
            writeln!(f, "Highest normalized MAE:")?;
            for (rank, result) in self.top_errors.iter().enumerate() {
                writeln!(
                    f,
                    "  {:>2}. {:<6} {:<32} {}",
                    rank + 1,
                    result.entity,
                    result.name.as_deref().unwrap_or(""),
                    fmt_optional(result.normalized_mae, true)
                )?;
            }
        }

        if !self.outliers.is_empty() {
            writeln!(
                f,
                "Outliers (normalized MAE > {:.0}%):",
                self.outlier_threshold * 100.0
            )?;
            for result in &self.outliers {
                writeln!(
                    f,
                    "  {:<6} {}",
                    result.entity,
                    fmt_optional(result.normalized_mae, true)
                )?;
            }
        }
        Ok(())
    }
}
