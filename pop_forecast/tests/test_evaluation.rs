use assert_approx_eq::assert_approx_eq;
use pop_forecast::config::EvaluationConfig;
use pop_forecast::data::EntityRecord;
use pop_forecast::evaluation::Evaluator;
use pop_forecast::models::{FittedModel, ModelConfig};
use pop_forecast::report::{
    EntityFailure, EntityOutcome, EvaluationReport, ForecastResult, SkipReason,
};
use pop_forecast::ForecastError;
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

const YEARS: [i32; 8] = [1970, 1980, 1990, 2000, 2010, 2015, 2020, 2022];

fn scenario_record() -> EntityRecord {
    EntityRecord::from_counts("TST", &YEARS, &[100, 110, 125, 140, 160, 185, 210, 240])
}

/// Growing series with noisy growth rates, one per entity id
fn synthetic_records(count: usize, seed: u64) -> Vec<EntityRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    let growth = Normal::new(0.12, 0.04).unwrap();

    (0..count)
        .map(|i| {
            let mut level: f64 = rng.gen_range(1_000_000.0..50_000_000.0);
            let counts: Vec<u64> = YEARS
                .iter()
                .map(|_| {
                    level *= 1.0 + growth.sample(&mut rng);
                    level.round() as u64
                })
                .collect();
            EntityRecord::from_counts(format!("E{:02}", i), &YEARS, &counts)
        })
        .collect()
}

fn config_with_horizon(horizon: usize) -> EvaluationConfig {
    EvaluationConfig {
        horizon,
        ..EvaluationConfig::default()
    }
}

#[test]
fn test_scenario_series() {
    let evaluator = Evaluator::new(config_with_horizon(2)).unwrap();

    let outcome = evaluator.evaluate_entity(&scenario_record()).unwrap();
    let result = match outcome {
        EntityOutcome::Succeeded(result) => result,
        EntityOutcome::Failed(failure) => panic!("unexpected failure: {:?}", failure),
    };

    assert_eq!(result.entity, "TST");
    assert_eq!(result.model, "ARIMA(1,1,0)");
    assert_eq!(result.years, vec![2020, 2022]);
    assert_eq!(result.actual, vec![210.0, 240.0]);
    assert_eq!(result.forecast.len(), 2);

    let phi = 1175.0 / 950.0;
    assert_approx_eq!(result.forecast[0], 185.0 + 25.0 * phi, 1e-2);
    assert!(result.mae >= 0.0 && result.rmse >= result.mae);
    assert_approx_eq!(result.normalized_mae.unwrap(), result.mae / 240.0, 1e-12);
    assert_approx_eq!(result.normalized_rmse.unwrap(), result.rmse / 240.0, 1e-12);
}

#[test]
fn test_one_malformed_entity_is_isolated() {
    let mut records = synthetic_records(9, 7);
    let mut cells: Vec<(String, String)> = YEARS
        .iter()
        .map(|year| (format!("{} Population", year), "1000".to_string()))
        .collect();
    cells[3].1 = "unknown".to_string();
    records.insert(4, EntityRecord::new("BAD", cells));

    let report = Evaluator::new(EvaluationConfig::default())
        .unwrap()
        .evaluate(&records)
        .unwrap();

    assert_eq!(report.processed, 10);
    assert_eq!(report.succeeded(), 9);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.failures[0].entity, "BAD");
    assert_eq!(report.failures[0].reason, SkipReason::MalformedSeries);
    assert_eq!(report.skip_reasons.get(&SkipReason::MalformedSeries), Some(&1));
    assert!(report.results.iter().all(|r| r.entity != "BAD"));
    assert!(report.mean_mae.is_some());
}

#[test]
fn test_short_and_constant_series_are_skipped() {
    let records = vec![
        EntityRecord::from_counts("SHORT", &YEARS[..3], &[1, 2, 3]),
        EntityRecord::from_counts("FLAT", &YEARS, &[500; 8]),
        scenario_record(),
    ];

    let report = Evaluator::new(EvaluationConfig::default())
        .unwrap()
        .evaluate(&records)
        .unwrap();

    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.skip_reasons.get(&SkipReason::InsufficientData), Some(&1));
    assert_eq!(report.skip_reasons.get(&SkipReason::ModelFit), Some(&1));
}

#[test]
fn test_fit_timeout_is_a_skip() {
    let config = EvaluationConfig {
        max_fit_millis: Some(0),
        ..EvaluationConfig::default()
    };
    let report = Evaluator::new(config)
        .unwrap()
        .evaluate(&[scenario_record()])
        .unwrap();

    assert_eq!(report.skipped, 1);
    assert_eq!(report.failures[0].reason, SkipReason::ModelFit);
    assert_eq!(report.mean_mae, None);
}

#[test]
fn test_evaluation_is_deterministic() {
    let records = synthetic_records(12, 11);
    let evaluator = Evaluator::new(EvaluationConfig::default()).unwrap();

    let first = evaluator.evaluate(&records).unwrap();
    let second = evaluator.evaluate(&records).unwrap();

    assert_eq!(first.results, second.results);
    assert_eq!(first.top_errors, second.top_errors);
    assert_eq!(first.mean_normalized_mae, second.mean_normalized_mae);
}

#[test]
fn test_worker_count_does_not_change_results() {
    let records = synthetic_records(23, 3);

    let sequential = Evaluator::new(EvaluationConfig::default())
        .unwrap()
        .evaluate(&records)
        .unwrap();
    let parallel = Evaluator::new(EvaluationConfig {
        workers: 4,
        ..EvaluationConfig::default()
    })
    .unwrap()
    .evaluate(&records)
    .unwrap();

    assert_eq!(sequential.results, parallel.results);
    assert_eq!(sequential.failures, parallel.failures);
    assert_eq!(sequential.top_errors, parallel.top_errors);
    assert_eq!(sequential.mean_mae, parallel.mean_mae);
}

#[test]
fn test_more_workers_than_entities() {
    let evaluator = Evaluator::new(EvaluationConfig {
        workers: 8,
        ..EvaluationConfig::default()
    })
    .unwrap();

    let report = evaluator.evaluate(&synthetic_records(3, 5)).unwrap();
    assert_eq!(report.processed, 3);

    let empty = evaluator.evaluate(&[]).unwrap();
    assert_eq!(empty.processed, 0);
    assert!(empty.top_errors.is_empty());
}

fn result(entity: &str, normalized_mae: Option<f64>) -> ForecastResult {
    ForecastResult {
        entity: entity.to_string(),
        name: None,
        model: "ARIMA(1,1,0)".to_string(),
        years: vec![2022],
        forecast: vec![1.0],
        actual: vec![1.0],
        mae: 1.0,
        rmse: 1.0,
        normalized_mae,
        normalized_rmse: normalized_mae,
    }
}

#[test]
fn test_ranking_breaks_ties_by_entity_id() {
    let outcomes = vec![
        EntityOutcome::Succeeded(result("CCC", Some(0.2))),
        EntityOutcome::Succeeded(result("BBB", Some(0.5))),
        EntityOutcome::Succeeded(result("ZZZ", None)),
        EntityOutcome::Succeeded(result("AAA", Some(0.5))),
        EntityOutcome::Succeeded(result("DDD", Some(1.5))),
    ];

    let report = EvaluationReport::from_outcomes(outcomes, 3, 1.0);
    let ranked: Vec<&str> = report.top_errors.iter().map(|r| r.entity.as_str()).collect();
    assert_eq!(ranked, vec!["DDD", "AAA", "BBB"]);

    let outliers: Vec<&str> = report.outliers.iter().map(|r| r.entity.as_str()).collect();
    assert_eq!(outliers, vec!["DDD"]);

    // ZZZ has no normalized error, so it only counts towards the plain means
    assert_approx_eq!(report.mean_normalized_mae.unwrap(), 2.7 / 4.0);
    assert_approx_eq!(report.mean_mae.unwrap(), 1.0);
}

#[test]
fn test_zero_latest_value_is_not_ranked() {
    let evaluator = Evaluator::new(config_with_horizon(2)).unwrap();
    let record = EntityRecord::from_counts("ZERO", &YEARS, &[80, 70, 60, 50, 40, 30, 20, 0]);

    match evaluator.evaluate_entity(&record).unwrap() {
        EntityOutcome::Succeeded(result) => {
            assert_eq!(result.normalized_mae, None);
            assert_eq!(result.normalized_rmse, None);
        }
        EntityOutcome::Failed(failure) => panic!("unexpected failure: {:?}", failure),
    }
}

#[test]
fn test_fatal_errors_are_not_skips() {
    let mismatch = ForecastError::LengthMismatch {
        forecast: 3,
        actual: 4,
    };
    assert_eq!(SkipReason::classify(&mismatch), None);
    assert!(matches!(
        EntityFailure::from_error("AAA", mismatch),
        Err(ForecastError::LengthMismatch { .. })
    ));

    let failure = EntityFailure::from_error("AAA", ForecastError::ModelFit("x".into())).unwrap();
    assert_eq!(failure.reason, SkipReason::ModelFit);
}

#[test]
fn test_compare_entity() {
    let evaluator = Evaluator::new(config_with_horizon(2)).unwrap();
    let configs = evaluator.default_comparison_set();
    assert_eq!(configs.len(), 4);
    assert_eq!(configs[0], ModelConfig::default());

    let comparisons = evaluator.compare_entity(&scenario_record(), &configs).unwrap();
    let models: Vec<&str> = comparisons.iter().map(|c| c.model.as_str()).collect();
    assert_eq!(
        models,
        vec!["ARIMA(1,1,0)", "ARIMA(2,1,0)", "ARIMA(5,1,0)", "SARIMA(1,1,1)(1,1,1,12)"]
    );

    // Six training points are enough for the two small orders only
    assert!(comparisons[0].outcome.is_success());
    assert!(comparisons[1].outcome.is_success());
    for comparison in &comparisons[2..] {
        match &comparison.outcome {
            EntityOutcome::Failed(failure) => {
                assert_eq!(failure.reason, SkipReason::InsufficientData)
            }
            EntityOutcome::Succeeded(_) => panic!("eight points cannot fit {}", comparison.model),
        }
    }
}

#[test]
fn test_comparison_set_has_no_duplicates() {
    let evaluator = Evaluator::new(EvaluationConfig {
        model: ModelConfig::reference_arima(),
        ..EvaluationConfig::default()
    })
    .unwrap();

    assert_eq!(
        evaluator.default_comparison_set(),
        vec![
            ModelConfig::reference_arima(),
            ModelConfig::compact_arima(),
            ModelConfig::reference_sarima()
        ]
    );
}

#[test]
fn test_project_entity() {
    let evaluator = Evaluator::new(EvaluationConfig::default()).unwrap();
    let projection = evaluator.project_entity(&scenario_record(), 3).unwrap();

    assert_eq!(projection.entity, "TST");
    assert_eq!(projection.last_year, 2022);
    assert_eq!(projection.forecast.horizon(), 3);
    assert_eq!(projection.forecast.level(), Some(0.95));

    let intervals = projection.forecast.intervals().unwrap();
    for ((lower, upper), value) in intervals.iter().zip(projection.forecast.values()) {
        assert!(lower < value && value < upper);
        assert!(*value > 240.0);
    }

    assert!(matches!(
        evaluator.project_entity(&scenario_record(), 0),
        Err(ForecastError::InvalidParameter(_))
    ));
}

#[test]
fn test_projection_matches_direct_fit() {
    let evaluator = Evaluator::new(EvaluationConfig::default()).unwrap();
    let projection = evaluator.project_entity(&scenario_record(), 2).unwrap();

    let series = scenario_record().normalize().unwrap();
    let fitted: Box<dyn FittedModel> = evaluator
        .model()
        .fit(&series.values(), &evaluator.config().fit_options())
        .unwrap();
    let direct = fitted.forecast(2).unwrap();

    assert_eq!(projection.forecast.values(), direct.values());
}

#[test]
fn test_invalid_config_is_rejected() {
    let result = Evaluator::new(EvaluationConfig {
        workers: 0,
        ..EvaluationConfig::default()
    });
    assert!(matches!(result, Err(ForecastError::ConfigError(_))));
}

#[test]
fn test_oversized_seasonal_period_is_rejected() {
    let config = EvaluationConfig::from_toml_str(
        r#"
        [model]
        family = "sarima"
        order = { p = 1, d = 1, q = 0 }
        seasonal = { p = 4, d = 1, q = 0, period = 4611686018427387903 }
        "#,
    )
    .unwrap();

    assert!(matches!(
        Evaluator::new(config),
        Err(ForecastError::InvalidParameter(_))
    ));
}
