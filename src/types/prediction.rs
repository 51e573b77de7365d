//! Prediction report shown to the user after a successful submission

use crate::types::features::{Feature, FeatureVector, FEATURE_COUNT};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unit of the predicted sonic log
pub const DT_UNIT: &str = "µs/ft";

/// Heading of the prediction column in the result table
pub const PREDICTION_COLUMN: &str = "Predicted DT (µs/ft)";

/// A successful DT prediction together with the inputs that produced it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionReport {
    /// Submitted well log values
    pub inputs: FeatureVector,

    /// Predicted sonic transit time
    pub predicted_dt: f64,

    pub unit: String,

    /// Deserialization strategy of the model that made the prediction
    pub model: String,

    pub timestamp: DateTime<Utc>,
}

impl PredictionReport {
    pub fn new(row: [f64; FEATURE_COUNT], predicted_dt: f64, model: &str) -> Self {
        Self {
            inputs: FeatureVector::from_row(row),
            predicted_dt,
            unit: DT_UNIT.to_string(),
            model: model.to_string(),
            timestamp: Utc::now(),
        }
    }

    /// Success notification text
    pub fn message(&self) -> String {
        format!("Predicted DT: {:.2} {}", self.predicted_dt, DT_UNIT)
    }

    /// Result table headings: the four inputs followed by the prediction
    pub fn columns() -> [&'static str; FEATURE_COUNT + 1] {
        [
            Feature::Rhob.name(),
            Feature::Gr.name(),
            Feature::Nphi.name(),
            Feature::Pef.name(),
            PREDICTION_COLUMN,
        ]
    }

    /// Result table cells, aligned with [`PredictionReport::columns`]
    pub fn cells(&self) -> Vec<String> {
        let mut cells: Vec<String> = Feature::ALL
            .into_iter()
            .map(|f| self.inputs.get(f).map(format_value).unwrap_or_default())
            .collect();
        cells.push(format!("{:.2}", self.predicted_dt));
        cells
    }
}

/// Render an input value without losing the precision it was entered with
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}
