//! Per-entity forecast evaluation
//!
//! Each entity is normalized, split, fitted and scored on its own. Errors
//! that belong to a single entity (a malformed row, a series too short for the
//! model, a failed fit) are recorded as skips; anything else aborts the run.

use crate::config::EvaluationConfig;
use crate::data::EntityRecord;
use crate::error::{ForecastError, Result};
use crate::metrics::compute_metrics;
use crate::models::{FitOptions, Forecast, ForecastModel, ModelConfig};
use crate::report::{EntityFailure, EntityOutcome, EvaluationReport, ForecastResult};
use crate::utils::TrainTestSplit;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Outcome of one model configuration in a comparison
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelComparison {
    pub config: ModelConfig,
    /// Display name of the built model
    pub model: String,
    pub outcome: EntityOutcome,
}

/// Out-of-sample projection from a model fitted on the full series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    pub entity: String,
    pub model: String,
    /// Year of the last observation used for fitting
    pub last_year: i32,
    pub forecast: Forecast,
}

/// Runs the fit/forecast/score loop over a dataset
#[derive(Debug)]
pub struct Evaluator {
    config: EvaluationConfig,
    model: Box<dyn ForecastModel>,
    fit_options: FitOptions,
}

impl Evaluator {
    pub fn new(config: EvaluationConfig) -> Result<Self> {
        config.validate()?;
        let model = config.model.build()?;
        let fit_options = config.fit_options();
        Ok(Self {
            config,
            model,
            fit_options,
        })
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    pub fn model(&self) -> &dyn ForecastModel {
        self.model.as_ref()
    }

    /// Evaluate every record and fold the outcomes into a report
    pub fn evaluate(&self, records: &[EntityRecord]) -> Result<EvaluationReport> {
        info!(
            "Evaluating {} entities with {} (horizon {}, {} worker(s))",
            records.len(),
            self.model.name(),
            self.config.horizon,
            self.config.workers
        );

        let outcomes = self.collect_outcomes(records)?;
        let report =
            EvaluationReport::from_outcomes(outcomes, self.config.top_k, self.config.outlier_threshold);

        info!(
            "Evaluated {} of {} entities, skipped {}",
            report.succeeded(),
            report.processed,
            report.skipped
        );
        Ok(report)
    }

    /// Evaluate one record with the configured model
    pub fn evaluate_entity(&self, record: &EntityRecord) -> Result<EntityOutcome> {
        self.evaluate_with(self.model.as_ref(), record)
    }

    /// Evaluate one record under several model configurations
    ///
    /// Per-entity failures are reported for each configuration; invalid
    /// configurations and fatal errors are returned.
    pub fn compare_entity(
        &self,
        record: &EntityRecord,
        configs: &[ModelConfig],
    ) -> Result<Vec<ModelComparison>> {
        configs
            .iter()
            .map(|config| {
                let model = config.build()?;
                let outcome = self.evaluate_with(model.as_ref(), record)?;
                Ok(ModelComparison {
                    config: config.clone(),
                    model: model.name().to_string(),
                    outcome,
                })
            })
            .collect()
    }

    /// The configured model followed by the compact and reference presets
    pub fn default_comparison_set(&self) -> Vec<ModelConfig> {
        let mut configs = vec![self.config.model.clone()];
        for preset in [
            ModelConfig::compact_arima(),
            ModelConfig::reference_arima(),
            ModelConfig::reference_sarima(),
        ] {
            if !configs.contains(&preset) {
                configs.push(preset);
            }
        }
        configs
    }

    /// Fit the configured model on the whole series and forecast `steps` ahead
    pub fn project_entity(&self, record: &EntityRecord, steps: usize) -> Result<Projection> {
        if steps == 0 {
            return Err(ForecastError::InvalidParameter(
                "Projection needs at least one step".to_string(),
            ));
        }

        let series = record.normalize()?;
        let last_year = series
            .latest()
            .map(|obs| obs.year)
            .ok_or(ForecastError::InsufficientData {
                required: self.model.min_train_len(),
                actual: 0,
            })?;

        let fitted = self.model.fit(&series.values(), &self.fit_options)?;
        let forecast = fitted.forecast_with_intervals(steps, self.config.interval_level)?;
        debug!("{}: projected {} steps past {}", record.id, steps, last_year);

        Ok(Projection {
            entity: record.id.clone(),
            model: fitted.name().to_string(),
            last_year,
            forecast,
        })
    }

    fn collect_outcomes(&self, records: &[EntityRecord]) -> Result<Vec<EntityOutcome>> {
        let workers = self.config.workers.min(records.len()).max(1);
        if workers == 1 {
            return records.iter().map(|r| self.evaluate_entity(r)).collect();
        }

        // Indexed collect keeps input order for any worker count
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| ForecastError::Worker(format!("Failed to start worker pool: {}", e)))?;
        pool.install(|| {
            records
                .par_iter()
                .map(|r| self.evaluate_entity(r))
                .collect::<Result<Vec<_>>>()
        })
    }

    fn evaluate_with(&self, model: &dyn ForecastModel, record: &EntityRecord) -> Result<EntityOutcome> {
        match self.forecast_entity(model, record) {
            Ok(result) => {
                debug!(
                    "{}: {} MAE {:.2}, RMSE {:.2}",
                    result.entity, result.model, result.mae, result.rmse
                );
                Ok(EntityOutcome::Succeeded(result))
            }
            Err(error) => {
                let failure = EntityFailure::from_error(&record.id, error)?;
                warn!("Skipping {} ({}): {}", failure.entity, failure.reason, failure.message);
                Ok(EntityOutcome::Failed(failure))
            }
        }
    }

    fn forecast_entity(
        &self,
        model: &dyn ForecastModel,
        record: &EntityRecord,
    ) -> Result<ForecastResult> {
        let series = record.normalize()?;
        let split = TrainTestSplit::new(&series, self.config.horizon)?;
        let fitted = model.fit(&split.train_values(), &self.fit_options)?;
        let forecast = fitted.forecast(split.horizon())?;
        let actual = split.test_values();
        let metrics = compute_metrics(forecast.values(), &actual)?;

        Ok(ForecastResult::new(
            series.entity(),
            record.name.clone(),
            model.name(),
            split.test().iter().map(|obs| obs.year).collect(),
            forecast.into_values(),
            actual,
            metrics,
        ))
    }
}
