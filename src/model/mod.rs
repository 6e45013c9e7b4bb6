//! Model capability
//!
//! The evaluation stage only needs `predict` and `score`; the model family
//! is whatever the bundle declares. A bundle is a directory containing
//! `model.json` whose `flavor` field picks the implementation:
//!
//! ```json
//! {"flavor": "linear", "features": ["minimum_nights"], "coefficients": [1.5], "intercept": 80.0}
//! {"flavor": "mean", "value": 152.7}
//! ```

mod baseline;
mod linear;
pub mod metrics;

pub use baseline::MeanModel;
pub use linear::LinearModel;

use std::fmt::Debug;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::table::Table;
use crate::{Error, Result};

/// File inside a model bundle describing the model.
pub const MODEL_FILE: &str = "model.json";

/// A trained predictor. Loaded once, never mutated.
pub trait Model: Debug {
    /// Short family name used in logs.
    fn flavor(&self) -> &'static str;

    /// Predict one value per row of `features`.
    ///
    /// # Errors
    ///
    /// [`Error::PredictionError`] when `features` lacks a column the model
    /// needs or holds values it cannot use.
    fn predict(&self, features: &Table) -> Result<Vec<f64>>;

    /// Score the model on `features` against `labels`. Defaults to R².
    ///
    /// # Errors
    ///
    /// Any [`Model::predict`] error, or [`Error::PredictionError`] when the
    /// label count does not match or the table is empty.
    fn score(&self, features: &Table, labels: &[f64]) -> Result<f64> {
        let predictions = self.predict(features)?;
        metrics::r2_score(labels, &predictions)
    }
}

/// Serialized form of every supported model family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "flavor", rename_all = "snake_case")]
pub enum ModelBundle {
    /// Linear regression over named numeric features.
    Linear(LinearModel),
    /// Constant predictor.
    Mean(MeanModel),
}

impl ModelBundle {
    /// Turn the bundle description into a usable model, validating it first.
    ///
    /// # Errors
    ///
    /// [`Error::ParseError`] when the description is inconsistent.
    pub fn into_model(self) -> Result<Box<dyn Model>> {
        match self {
            Self::Linear(model) => {
                model.validate()?;
                Ok(Box::new(model))
            }
            Self::Mean(model) => Ok(Box::new(model)),
        }
    }

    /// Write the description as a bundle in `dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// IO or JSON errors.
    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        fs::write(dir.join(MODEL_FILE), serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }
}

/// Load the model stored in a bundle directory.
///
/// # Errors
///
/// [`Error::ParseError`] when `model.json` is missing, malformed, names an
/// unknown flavor, or is internally inconsistent.
pub fn load_model(bundle_dir: &Path) -> Result<Box<dyn Model>> {
    let path = bundle_dir.join(MODEL_FILE);
    let text = fs::read_to_string(&path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::ParseError(format!(
            "model bundle {} has no {MODEL_FILE}",
            bundle_dir.display()
        )),
        _ => Error::Io(e),
    })?;

    let bundle: ModelBundle = serde_json::from_str(&text)
        .map_err(|e| Error::ParseError(format!("{}: {e}", path.display())))?;
    bundle.into_model()
}
