//! Command line front end for population forecast evaluation

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use pop_forecast::config::EvaluationConfig;
use pop_forecast::data::{DataLoader, EntityRecord};
use pop_forecast::evaluation::Evaluator;
use pop_forecast::models::{ModelConfig, ModelFamily};
use pop_forecast::report::EntityOutcome;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "pop_forecast", version, about = "Per-country population forecast evaluation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fits the model to every entity and reports held-out error.
    Evaluate {
        #[arg(long)]
        data: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        horizon: Option<usize>,
        #[arg(long)]
        top_k: Option<usize>,
        #[arg(long)]
        workers: Option<usize>,
        #[arg(long, value_enum)]
        family: Option<FamilyArg>,
        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Compares model configurations on a single entity.
    Compare {
        #[arg(long)]
        data: PathBuf,
        #[arg(long)]
        entity: String,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        horizon: Option<usize>,
    },
    /// Projects an entity past its last census year.
    Project {
        #[arg(long)]
        data: PathBuf,
        #[arg(long)]
        entity: String,
        #[arg(long)]
        steps: usize,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FamilyArg {
    Arima,
    Sarima,
}

impl FamilyArg {
    /// Keep the configured model when it already belongs to the family
    fn select(self, current: ModelConfig) -> ModelConfig {
        match (self, current.family()) {
            (FamilyArg::Arima, ModelFamily::Arima) | (FamilyArg::Sarima, ModelFamily::Sarima) => {
                current
            }
            (FamilyArg::Arima, _) => ModelConfig::default(),
            (FamilyArg::Sarima, _) => ModelConfig::reference_sarima(),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pop_forecast=info".into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Evaluate {
            data,
            config,
            horizon,
            top_k,
            workers,
            family,
            json,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(horizon) = horizon {
                config.horizon = horizon;
            }
            if let Some(top_k) = top_k {
                config.top_k = top_k;
            }
            if let Some(workers) = workers {
                config.workers = workers;
            }
            if let Some(family) = family {
                config.model = family.select(config.model);
            }

            let records = load_records(&data, &config)?;
            let evaluator = Evaluator::new(config).context("invalid evaluation settings")?;
            let report = evaluator.evaluate(&records)?;
            if json {
                println!("{}", report.to_json()?);
            } else {
                print!("{}", report);
            }
        }
        Commands::Compare {
            data,
            entity,
            config,
            horizon,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(horizon) = horizon {
                config.horizon = horizon;
            }

            let records = load_records(&data, &config)?;
            let record = find_entity(&records, &entity)?;
            let evaluator = Evaluator::new(config).context("invalid evaluation settings")?;
            let configs = evaluator.default_comparison_set();
            for comparison in evaluator.compare_entity(record, &configs)? {
                match comparison.outcome {
                    EntityOutcome::Succeeded(result) => println!(
                        "{:<28} MAE {:>14.2}  RMSE {:>14.2}  forecast {:?}",
                        result.model, result.mae, result.rmse, result.forecast
                    ),
                    EntityOutcome::Failed(failure) => println!(
                        "{:<28} skipped ({}): {}",
                        comparison.model,
                        failure.reason,
                        failure.message
                    ),
                }
            }
        }
        Commands::Project {
            data,
            entity,
            steps,
            config,
            json,
        } => {
            let config = load_config(config.as_deref())?;
            let records = load_records(&data, &config)?;
            let record = find_entity(&records, &entity)?;
            let evaluator = Evaluator::new(config).context("invalid evaluation settings")?;
            let projection = evaluator.project_entity(record, steps)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&projection)?);
            } else {
                println!(
                    "{} {} after {}:",
                    projection.entity, projection.model, projection.last_year
                );
                let intervals = projection.forecast.intervals().unwrap_or(&[]);
                for (step, value) in projection.forecast.values().iter().enumerate() {
                    match intervals.get(step) {
                        Some((lower, upper)) => println!(
                            "  +{:<3} {:>16.0}  [{:.0}, {:.0}]",
                            step + 1,
                            value,
                            lower,
                            upper
                        ),
                        None => println!("  +{:<3} {:>16.0}", step + 1, value),
                    }
                }
            }
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<EvaluationConfig> {
    match path {
        Some(path) => EvaluationConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(EvaluationConfig::default()),
    }
}

fn load_records(path: &Path, config: &EvaluationConfig) -> Result<Vec<EntityRecord>> {
    DataLoader::from_csv(path, &config.loader)
        .with_context(|| format!("failed to load dataset {}", path.display()))
}

fn find_entity<'a>(records: &'a [EntityRecord], id: &str) -> Result<&'a EntityRecord> {
    match records.iter().find(|r| r.id == id) {
        Some(record) => Ok(record),
        None => bail!("entity '{}' not found in dataset", id),
    }
}
