//! `basic_cleaning` - remove price outliers and off-area listings, publish
//! the cleaned dataset as a new artifact version.

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use rental_pipeline::config::RegistryConfig;
use rental_pipeline::registry::RunContext;
use rental_pipeline::stages::{cleaning, CleaningParams};

/// A very basic data cleaning
#[derive(Debug, Parser)]
#[command(name = "basic_cleaning", version)]
struct Args {
    /// Fully-qualified name for the input artifact
    #[arg(long = "input_artifact")]
    input_artifact: String,

    /// Name for the output artifact
    #[arg(long = "output_artifact")]
    output_artifact: String,

    /// Type for the output artifact
    #[arg(long = "output_type")]
    output_type: String,

    /// Description for the output artifact
    #[arg(long = "output_description")]
    output_description: String,

    /// Minimum price to keep
    #[arg(long = "min_price", allow_negative_numbers = true)]
    min_price: i64,

    /// Maximum price to keep
    #[arg(long = "max_price", allow_negative_numbers = true)]
    max_price: i64,
}

impl From<Args> for CleaningParams {
    fn from(args: Args) -> Self {
        Self::new(
            args.input_artifact,
            args.output_artifact,
            args.output_type,
            args.output_description,
            args.min_price,
            args.max_price,
        )
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let params = CleaningParams::from(Args::parse());
    let config = RegistryConfig::from_env();

    let mut run = RunContext::initialize(&config, cleaning::JOB_TYPE, &params)
        .context("failed to start run")?;
    cleaning::run(&mut run, &params).context("basic cleaning failed")?;
    run.finish().context("failed to close run")?;
    Ok(())
}
