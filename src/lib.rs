//! # Rental Pipeline: short-term rental price modelling stages
//!
//! Two stages of a price-prediction pipeline, each run as its own process
//! and tracked by an artifact registry:
//!
//! - **`basic_cleaning`**: drop price outliers and listings outside the
//!   metro area, publish the cleaned dataset as a new artifact version
//! - **`test_model`**: score a published model bundle against a published
//!   test dataset and record `r2` and `mae` on the run
//!
//! Every run records the exact artifact versions it read and wrote, so a
//! result can always be traced back to its inputs.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use rental_pipeline::config::RegistryConfig;
//! use rental_pipeline::registry::RunContext;
//! use rental_pipeline::stages::{cleaning, CleaningParams};
//!
//! let params = CleaningParams::new(
//!     "sample.csv:latest",
//!     "clean_sample.csv",
//!     "clean_sample",
//!     "Data with outliers removed",
//!     10,
//!     350,
//! );
//! let mut run = RunContext::initialize(&RegistryConfig::from_env(), cleaning::JOB_TYPE, &params)?;
//! let outcome = cleaning::run(&mut run, &params)?;
//! println!("published {}", outcome.artifact.qualified_name());
//! run.finish()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod config;
pub mod error;
pub mod experiment;
pub mod model;
pub mod registry;
pub mod stages;
pub mod table;

pub use error::{Error, Result};
