//! `test_model` - score a published model bundle against a published test
//! dataset and record `r2` and `mae` on the run.

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use rental_pipeline::config::RegistryConfig;
use rental_pipeline::registry::RunContext;
use rental_pipeline::stages::{evaluation, EvaluationParams};

/// Test the provided model against the test dataset
#[derive(Debug, Parser)]
#[command(name = "test_model", version)]
struct Args {
    /// Input MLFlow model
    #[arg(long = "mlflow_model")]
    mlflow_model: String,

    /// Test dataset
    #[arg(long = "test_dataset")]
    test_dataset: String,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let params = EvaluationParams {
        mlflow_model: args.mlflow_model,
        test_dataset: args.test_dataset,
    };
    let config = RegistryConfig::from_env();

    let mut run = RunContext::initialize(&config, evaluation::JOB_TYPE, &params)
        .context("failed to start run")?;
    let report = evaluation::run(&mut run, &params).context("model evaluation failed")?;
    tracing::info!(r2 = report.r2, mae = report.mae, rows = report.rows, "evaluation complete");
    run.finish().context("failed to close run")?;
    Ok(())
}
