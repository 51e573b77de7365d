//! Single-row DT inference

use crate::error::{describe_fields, PredictError};
use crate::models::regressor::ModelHandle;
use crate::types::features::FeatureVector;
use tracing::{debug, error, warn};

/// Predict DT for one row of well log values.
///
/// Only checks that all four features are present; range checks belong to
/// the caller. Every model-side failure is reported as
/// [`PredictError::PredictionFailed`] with the original message kept.
pub fn predict(model: &ModelHandle, features: &FeatureVector) -> Result<f64, PredictError> {
    let row = features.to_row().map_err(|errors| {
        warn!(errors = %describe_fields(&errors), "Prediction input incomplete");
        PredictError::InvalidInput(errors)
    })?;

    let outputs = model.predict_row(&row).map_err(|e| {
        error!(model = %model.strategy(), error = %format!("{:#}", e), "Prediction error");
        PredictError::PredictionFailed(format!("{:#}", e))
    })?;

    let dt = first_scalar(&outputs).map_err(|message| {
        error!(model = %model.strategy(), error = %message, "Prediction error");
        PredictError::PredictionFailed(message)
    })?;

    debug!(model = %model.strategy(), predicted_dt = dt, "Inference complete");
    Ok(dt)
}

/// Coerce model output to the single DT value
fn first_scalar(outputs: &[f64]) -> Result<f64, String> {
    match outputs.first() {
        None => Err("model returned no output".to_string()),
        Some(value) if !value.is_finite() => {
            Err(format!("model returned a non-finite value ({})", value))
        }
        Some(&value) => Ok(value),
    }
}
