//! Cleaning stage: drop price outliers and listings outside the metro area,
//! then publish the result as a new artifact version.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::experiment::ArtifactRecord;
use crate::registry::{validate_name, ArtifactRegistry, RunContext};
use crate::table::Table;
use crate::Result;

/// Job type label of cleaning runs.
pub const JOB_TYPE: &str = "basic_cleaning";

/// Columns the cleaning filters read.
pub const REQUIRED_COLUMNS: [&str; 3] = ["price", "longitude", "latitude"];

/// Inclusive longitude/latitude box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    /// Western edge.
    pub min_longitude: f64,
    /// Eastern edge.
    pub max_longitude: f64,
    /// Southern edge.
    pub min_latitude: f64,
    /// Northern edge.
    pub max_latitude: f64,
}

impl GeoBounds {
    /// New York City metropolitan area.
    pub const NYC: Self = Self {
        min_longitude: -74.25,
        max_longitude: -73.50,
        min_latitude: 40.5,
        max_latitude: 41.2,
    };

    /// Keep rows whose `longitude` and `latitude` both fall inside the box.
    ///
    /// # Errors
    ///
    /// [`crate::Error::MissingColumn`] / [`crate::Error::SchemaError`] from
    /// the coordinate columns.
    pub fn apply(&self, table: &Table) -> Result<Table> {
        table
            .filter_range("longitude", self.min_longitude, self.max_longitude)?
            .filter_range("latitude", self.min_latitude, self.max_latitude)
    }
}

impl Default for GeoBounds {
    fn default() -> Self {
        Self::NYC
    }
}

/// Inputs of a cleaning run. Serialized as the run's config snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleaningParams {
    /// Reference of the raw dataset.
    pub input_artifact: String,
    /// Name of the cleaned dataset artifact (also the staging file name).
    pub output_artifact: String,
    /// Type label of the output artifact.
    pub output_type: String,
    /// Description of the output artifact.
    pub output_description: String,
    /// Lowest price kept, inclusive.
    pub min_price: i64,
    /// Highest price kept, inclusive.
    pub max_price: i64,
    /// Coordinate box; not exposed on the command line.
    #[serde(default)]
    pub bounds: GeoBounds,
    /// Directory the staging file is written to.
    #[serde(skip, default = "default_staging_dir")]
    pub staging_dir: PathBuf,
}

fn default_staging_dir() -> PathBuf {
    PathBuf::from(".")
}

impl CleaningParams {
    /// Parameters with the default bounds, staging in the working directory.
    #[must_use]
    pub fn new(
        input_artifact: impl Into<String>,
        output_artifact: impl Into<String>,
        output_type: impl Into<String>,
        output_description: impl Into<String>,
        min_price: i64,
        max_price: i64,
    ) -> Self {
        Self {
            input_artifact: input_artifact.into(),
            output_artifact: output_artifact.into(),
            output_type: output_type.into(),
            output_description: output_description.into(),
            min_price,
            max_price,
            bounds: GeoBounds::NYC,
            staging_dir: default_staging_dir(),
        }
    }

    /// Stage the output file in `dir` instead of the working directory.
    #[must_use]
    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = dir.into();
        self
    }

    /// Path of the local staging file.
    #[must_use]
    pub fn staging_path(&self) -> PathBuf {
        self.staging_dir.join(&self.output_artifact)
    }
}

/// Row counts through the filter chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterCounts {
    /// Rows loaded.
    pub input_rows: usize,
    /// Rows left after the price filter.
    pub after_price: usize,
    /// Rows left after the coordinate filter.
    pub after_geo: usize,
}

/// Result of a cleaning run.
#[derive(Debug, Clone)]
pub struct CleaningOutcome {
    /// Row counts through the filters.
    pub counts: FilterCounts,
    /// Local staging file that was uploaded.
    pub staged_path: PathBuf,
    /// Committed output version.
    pub artifact: ArtifactRecord,
}

/// Apply the price filter, then the coordinate filter.
///
/// # Errors
///
/// [`crate::Error::MissingColumn`] if any of `price`, `longitude`,
/// `latitude` is absent; [`crate::Error::SchemaError`] if one is not numeric.
#[allow(clippy::cast_precision_loss)]
pub fn clean(
    table: &Table,
    min_price: i64,
    max_price: i64,
    bounds: &GeoBounds,
) -> Result<(Table, FilterCounts)> {
    table.require_columns(&REQUIRED_COLUMNS)?;

    let priced = table.filter_range("price", min_price as f64, max_price as f64)?;
    info!(
        min_price,
        max_price,
        kept = priced.num_rows(),
        dropped = table.num_rows() - priced.num_rows(),
        "price outliers removed"
    );

    let located = bounds.apply(&priced)?;
    info!(
        kept = located.num_rows(),
        dropped = priced.num_rows() - located.num_rows(),
        "listings outside bounds removed"
    );

    let counts = FilterCounts {
        input_rows: table.num_rows(),
        after_price: priced.num_rows(),
        after_geo: located.num_rows(),
    };
    Ok((located, counts))
}

/// Run the cleaning stage: resolve and load the input, filter, stage the
/// result locally, publish it and wait for the upload to commit.
///
/// Schema problems surface before anything is published.
///
/// # Errors
///
/// Any registry, parse, schema or publish error.
pub fn run<R: ArtifactRegistry>(
    ctx: &mut RunContext<R>,
    params: &CleaningParams,
) -> Result<CleaningOutcome> {
    validate_name(&params.output_artifact)?;

    let input_path = ctx.resolve(&params.input_artifact)?;
    let raw = Table::load(&input_path)?;
    info!(rows = raw.num_rows(), columns = raw.num_columns(), "input dataset loaded");

    let (cleaned, counts) = clean(&raw, params.min_price, params.max_price, &params.bounds)?;
    if cleaned.num_rows() == 0 {
        warn!("no rows survived cleaning, publishing an empty dataset");
    }

    let staged_path = params.staging_path();
    cleaned.save(&staged_path)?;
    info!(path = %staged_path.display(), "artifact saved");

    let handle = ctx.publish(
        &params.output_artifact,
        &params.output_type,
        &params.output_description,
        &staged_path,
    )?;
    let artifact = ctx.await_commit(handle)?;
    info!(artifact = %artifact.qualified_name(), "cleaned dataset uploaded");

    Ok(CleaningOutcome {
        counts,
        staged_path,
        artifact,
    })
}
