//! Regression metrics

use crate::{Error, Result};

fn check_lengths(labels: &[f64], predictions: &[f64]) -> Result<()> {
    if labels.len() != predictions.len() {
        return Err(Error::PredictionError(format!(
            "{} labels but {} predictions",
            labels.len(),
            predictions.len()
        )));
    }
    if labels.is_empty() {
        return Err(Error::PredictionError(
            "cannot score an empty dataset".to_string(),
        ));
    }
    Ok(())
}

/// Mean of `|prediction - label|`.
///
/// # Errors
///
/// [`Error::PredictionError`] on length mismatch or empty input.
#[allow(clippy::cast_precision_loss)]
pub fn mean_absolute_error(labels: &[f64], predictions: &[f64]) -> Result<f64> {
    check_lengths(labels, predictions)?;
    let total: f64 = labels
        .iter()
        .zip(predictions)
        .map(|(y, p)| (p - y).abs())
        .sum();
    Ok(total / labels.len() as f64)
}

/// Coefficient of determination, `1 - SS_res / SS_tot`.
///
/// With constant labels `SS_tot` is zero; the score is then 1.0 for a
/// perfect prediction and 0.0 otherwise.
///
/// # Errors
///
/// [`Error::PredictionError`] on length mismatch or empty input.
#[allow(clippy::cast_precision_loss)]
pub fn r2_score(labels: &[f64], predictions: &[f64]) -> Result<f64> {
    check_lengths(labels, predictions)?;
    let mean = labels.iter().sum::<f64>() / labels.len() as f64;

    let ss_res: f64 = labels
        .iter()
        .zip(predictions)
        .map(|(y, p)| (y - p).powi(2))
        .sum();
    let ss_tot: f64 = labels.iter().map(|y| (y - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }
    Ok(1.0 - ss_res / ss_tot)
}
