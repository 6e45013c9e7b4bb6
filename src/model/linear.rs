//! Linear regression over named numeric features

use arrow::array::Array;
use serde::{Deserialize, Serialize};

use super::Model;
use crate::table::Table;
use crate::{Error, Result};

/// `prediction = intercept + sum(coefficient_i * feature_i)`.
///
/// Only the named features are read; any other columns are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    features: Vec<String>,
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LinearModel {
    /// Create a linear model.
    ///
    /// # Errors
    ///
    /// [`Error::ParseError`] when feature and coefficient counts differ.
    pub fn new(features: Vec<String>, coefficients: Vec<f64>, intercept: f64) -> Result<Self> {
        let model = Self {
            features,
            coefficients,
            intercept,
        };
        model.validate()?;
        Ok(model)
    }

    /// Feature names the model reads.
    #[must_use]
    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub(super) fn validate(&self) -> Result<()> {
        if self.features.len() != self.coefficients.len() {
            return Err(Error::ParseError(format!(
                "linear model has {} features but {} coefficients",
                self.features.len(),
                self.coefficients.len()
            )));
        }
        Ok(())
    }
}

impl Model for LinearModel {
    fn flavor(&self) -> &'static str {
        "linear"
    }

    fn predict(&self, features: &Table) -> Result<Vec<f64>> {
        let mut predictions = vec![self.intercept; features.num_rows()];

        for (name, coefficient) in self.features.iter().zip(&self.coefficients) {
            let column = features.numeric_column(name).map_err(|e| match e {
                Error::MissingColumn { column } => {
                    Error::PredictionError(format!("model expects feature '{column}'"))
                }
                other => Error::PredictionError(format!("feature '{name}': {other}")),
            })?;
            if column.null_count() > 0 {
                return Err(Error::PredictionError(format!(
                    "feature '{name}' has {} missing values",
                    column.null_count()
                )));
            }
            for (prediction, value) in predictions.iter_mut().zip(column.values().iter()) {
                *prediction += coefficient * value;
            }
        }

        Ok(predictions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::record_batch::RecordBatch;
    use std::sync::Arc;

    fn features() -> Table {
        let schema = Schema::new(vec![
            Field::new("minimum_nights", DataType::Int64, false),
            Field::new("reviews_per_month", DataType::Float64, false),
            Field::new("room_type", DataType::Utf8, false),
        ]);
        Table::new(
            RecordBatch::try_new(
                Arc::new(schema),
                vec![
                    Arc::new(Int64Array::from(vec![1, 3])),
                    Arc::new(Float64Array::from(vec![0.5, 2.0])),
                    Arc::new(StringArray::from(vec!["Private room", "Entire home/apt"])),
                ],
            )
            .unwrap(),
        )
    }

    fn model() -> LinearModel {
        LinearModel::new(
            vec!["minimum_nights".to_string(), "reviews_per_month".to_string()],
            vec![10.0, 4.0],
            100.0,
        )
        .unwrap()
    }

    #[test]
    fn test_predict() {
        let predictions = model().predict(&features()).unwrap();
        assert_eq!(predictions, vec![112.0, 138.0]);
    }

    #[test]
    fn test_score_uses_predictions() {
        let r2 = model().score(&features(), &[112.0, 138.0]).unwrap();
        assert!((r2 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_missing_feature_is_prediction_error() {
        let model = LinearModel::new(vec!["availability_365".to_string()], vec![1.0], 0.0).unwrap();
        assert!(matches!(
            model.predict(&features()),
            Err(Error::PredictionError(_))
        ));
    }

    #[test]
    fn test_text_feature_is_prediction_error() {
        let model = LinearModel::new(vec!["room_type".to_string()], vec![1.0], 0.0).unwrap();
        assert!(matches!(
            model.predict(&features()),
            Err(Error::PredictionError(_))
        ));
    }

    #[test]
    fn test_mismatched_coefficients_rejected() {
        assert!(matches!(
            LinearModel::new(vec!["a".to_string()], vec![], 0.0),
            Err(Error::ParseError(_))
        ));
    }
}
