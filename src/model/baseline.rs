//! Constant baseline predictor

use serde::{Deserialize, Serialize};

use super::Model;
use crate::table::Table;
use crate::Result;

/// Predicts the same value for every row, typically the training mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeanModel {
    value: f64,
}

impl MeanModel {
    /// Create a baseline predicting `value`.
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Self { value }
    }
}

impl Model for MeanModel {
    fn flavor(&self) -> &'static str {
        "mean"
    }

    fn predict(&self, features: &Table) -> Result<Vec<f64>> {
        Ok(vec![self.value; features.num_rows()])
    }
}
