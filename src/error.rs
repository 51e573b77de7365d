//! Error types for input validation, model loading and inference

use crate::types::features::Feature;
use std::path::PathBuf;
use thiserror::Error;

/// A problem with one submitted well log value
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("Missing value for {feature}.")]
    Missing { feature: Feature },

    #[error("Invalid value for {feature}: {value:?}. Must be between {min:?} and {max:?}.")]
    OutOfRange {
        feature: Feature,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Invalid value for {feature}: \"{raw}\". Must be a number.")]
    NotANumber { feature: Feature, raw: String },
}

impl FieldError {
    /// The feature this error refers to
    pub fn feature(&self) -> Feature {
        match self {
            FieldError::Missing { feature }
            | FieldError::OutOfRange { feature, .. }
            | FieldError::NotANumber { feature, .. } => *feature,
        }
    }
}

/// Failure reported by a single deserialization strategy
#[derive(Debug, Clone, Error)]
pub enum StrategyError {
    /// The bytes are not in the format this strategy understands.
    /// Only this kind lets the loader move on to the next strategy.
    #[error("unrecognized format: {0}")]
    Format(String),

    #[error("{0}")]
    Runtime(String),
}

impl StrategyError {
    pub fn is_format(&self) -> bool {
        matches!(self, StrategyError::Format(_))
    }
}

/// Why a model could not be loaded
#[derive(Debug, Error)]
pub enum LoadError {
    /// Absent or zero-length model file
    #[error("model file not found or empty: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read model file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no deserialization strategies configured")]
    NoStrategies,

    #[error("strategy '{strategy}' failed: {source}")]
    Strategy {
        strategy: String,
        #[source]
        source: StrategyError,
    },

    #[error("no strategy could deserialize {}: {}", .path.display(), describe_attempts(.attempts))]
    Unreadable {
        path: PathBuf,
        attempts: Vec<(String, StrategyError)>,
    },
}

fn describe_attempts(attempts: &[(String, StrategyError)]) -> String {
    attempts
        .iter()
        .map(|(name, err)| format!("{}: {}", name, err))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors raised at the inference boundary
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    #[error("invalid input: {}", describe_fields(.0))]
    InvalidInput(Vec<FieldError>),

    #[error("Failed to make prediction: {0}")]
    PredictionFailed(String),
}

/// Errors surfaced by the model service to the presentation layer
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    #[error("model unavailable")]
    ModelUnavailable,

    #[error("invalid input: {}", describe_fields(.0))]
    InvalidInput(Vec<FieldError>),

    #[error("Failed to make prediction: {0}")]
    PredictionFailed(String),
}

impl From<PredictError> for ServiceError {
    fn from(err: PredictError) -> Self {
        match err {
            PredictError::InvalidInput(errors) => ServiceError::InvalidInput(errors),
            PredictError::PredictionFailed(message) => ServiceError::PredictionFailed(message),
        }
    }
}

pub(crate) fn describe_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_error_messages() {
        let err = FieldError::OutOfRange {
            feature: Feature::Rhob,
            value: 3.5,
            min: 1.0,
            max: 3.0,
        };
        assert_eq!(
            err.to_string(),
            "Invalid value for RHOB: 3.5. Must be between 1.0 and 3.0."
        );

        let err = FieldError::Missing {
            feature: Feature::Pef,
        };
        assert_eq!(err.to_string(), "Missing value for PEF.");
        assert_eq!(err.feature(), Feature::Pef);

        let err = FieldError::NotANumber {
            feature: Feature::Gr,
            raw: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid value for GR: \"abc\". Must be a number.");
    }

    #[test]
    fn test_unreadable_lists_every_attempt() {
        let err = LoadError::Unreadable {
            path: PathBuf::from("models/cmodel.pkl"),
            attempts: vec![
                ("onnx".to_string(), StrategyError::Format("bad protobuf".to_string())),
                ("json".to_string(), StrategyError::Format("expected value".to_string())),
            ],
        };
        let message = err.to_string();
        assert!(message.contains("onnx: unrecognized format: bad protobuf"));
        assert!(message.contains("json: unrecognized format: expected value"));
    }

    #[test]
    fn test_predict_error_converts_to_service_error() {
        let err: ServiceError = PredictError::PredictionFailed("boom".to_string()).into();
        assert_eq!(err, ServiceError::PredictionFailed("boom".to_string()));
    }
}
