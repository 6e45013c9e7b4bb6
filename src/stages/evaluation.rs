//! Evaluation stage: score a published model against a held-out dataset

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::model::{load_model, metrics, Model};
use crate::registry::{ArtifactRegistry, RunContext};
use crate::table::Table;
use crate::Result;

/// Job type label of evaluation runs.
pub const JOB_TYPE: &str = "test_model";

/// Column holding the regression target.
pub const LABEL_COLUMN: &str = "price";

/// Inputs of an evaluation run. Serialized as the run's config snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationParams {
    /// Reference of the model bundle artifact.
    pub mlflow_model: String,
    /// Reference of the test dataset artifact.
    pub test_dataset: String,
}

/// Scores of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationReport {
    /// Coefficient of determination reported by the model's `score`.
    pub r2: f64,
    /// Mean absolute error.
    pub mae: f64,
    /// Rows scored.
    pub rows: usize,
}

/// Split the label off `dataset` and score `model` on the rest.
///
/// # Errors
///
/// [`crate::Error::MissingColumn`] / [`crate::Error::SchemaError`] for a
/// bad label column, [`crate::Error::PredictionError`] from the model.
pub fn evaluate(model: &dyn Model, dataset: &Table) -> Result<EvaluationReport> {
    let (features, labels) = dataset.select_column(LABEL_COLUMN)?;

    info!(flavor = model.flavor(), rows = labels.len(), "scoring model");
    let r2 = model.score(&features, &labels)?;
    let predictions = model.predict(&features)?;
    let mae = metrics::mean_absolute_error(&labels, &predictions)?;

    Ok(EvaluationReport {
        r2,
        mae,
        rows: labels.len(),
    })
}

/// Run the evaluation stage and record `r2` and `mae` on the run.
///
/// Nothing is recorded unless both scores were computed.
///
/// # Errors
///
/// Any registry, parse, schema or prediction error.
pub fn run<R: ArtifactRegistry>(
    ctx: &mut RunContext<R>,
    params: &EvaluationParams,
) -> Result<EvaluationReport> {
    info!("downloading artifacts");
    let model_dir = ctx.resolve_model(&params.mlflow_model)?;
    let model = load_model(&model_dir)?;

    let dataset_path = ctx.resolve(&params.test_dataset)?;
    let dataset = Table::load(&dataset_path)?;

    let report = evaluate(model.as_ref(), &dataset)?;
    info!(r2 = report.r2, mae = report.mae, "model evaluated");

    ctx.record_metric("r2", report.r2);
    ctx.record_metric("mae", report.mae);
    Ok(report)
}
