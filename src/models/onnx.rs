//! ONNX model strategy
//!
//! The primary model format. Graphs exported from scikit-learn regressors
//! take a `[1, 4]` float tensor and return a `[1, 1]` prediction.

use crate::error::StrategyError;
use crate::models::loader::DeserializeStrategy;
use crate::models::regressor::Regressor;
use crate::types::features::FEATURE_COUNT;
use anyhow::{anyhow, bail, Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::sync::Mutex;
use tracing::{debug, info};

/// Deserializes ONNX graphs through ONNX Runtime
#[derive(Debug)]
pub struct OnnxStrategy {
    /// Number of threads for ONNX inference
    intra_threads: usize,
}

impl OnnxStrategy {
    pub fn with_threads(intra_threads: usize) -> Self {
        Self {
            intra_threads: intra_threads.max(1),
        }
    }
}

impl Default for OnnxStrategy {
    fn default() -> Self {
        Self::with_threads(1)
    }
}

impl DeserializeStrategy for OnnxStrategy {
    fn name(&self) -> &str {
        "onnx"
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Box<dyn Regressor>, StrategyError> {
        let builder = Session::builder()
            .map_err(runtime_error)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(runtime_error)?
            .with_intra_threads(self.intra_threads)
            .map_err(runtime_error)?;

        // The bytes are already in memory, so a failed commit means they
        // are not a graph ONNX Runtime can load.
        let session = builder
            .commit_from_memory(bytes)
            .map_err(|e| StrategyError::Format(format!("not a loadable ONNX graph: {}", e)))?;

        Ok(Box::new(OnnxRegressor::new(session)))
    }
}

fn runtime_error(e: impl std::fmt::Display) -> StrategyError {
    StrategyError::Runtime(format!("ONNX Runtime error: {}", e))
}

/// A loaded ONNX session.
///
/// ONNX Runtime needs exclusive access to run a session, so it sits
/// behind a mutex held for one call.
pub struct OnnxRegressor {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
}

impl OnnxRegressor {
    pub fn new(session: Session) -> Self {
        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "variable".to_string());

        info!(input = %input_name, output = %output_name, "ONNX session ready");

        Self {
            session: Mutex::new(session),
            input_name,
            output_name,
        }
    }
}

impl Regressor for OnnxRegressor {
    fn predict_row(&self, row: &[f64; FEATURE_COUNT]) -> Result<Vec<f64>> {
        let features: Vec<f32> = row.iter().map(|&v| v as f32).collect();
        let shape = vec![1_i64, FEATURE_COUNT as i64];
        let input_tensor =
            Tensor::from_array((shape, features)).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow!("ONNX session lock poisoned: {}", e))?;

        let outputs = session.run(ort::inputs![&self.input_name => input_tensor])?;

        let output = outputs
            .get(self.output_name.as_str())
            .ok_or_else(|| anyhow!("model produced no output named '{}'", self.output_name))?;

        // Regressors usually emit float32, but accept any numeric tensor
        if let Ok((_, data)) = output.try_extract_tensor::<f32>() {
            debug!(values = data.len(), "Extracted f32 output");
            return Ok(data.iter().map(|&v| v as f64).collect());
        }
        if let Ok((_, data)) = output.try_extract_tensor::<f64>() {
            return Ok(data.to_vec());
        }
        if let Ok((_, data)) = output.try_extract_tensor::<i64>() {
            return Ok(data.iter().map(|&v| v as f64).collect());
        }

        bail!("output '{}' is not a numeric tensor", self.output_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_count_is_at_least_one() {
        assert_eq!(OnnxStrategy::with_threads(0).intra_threads, 1);
        assert_eq!(OnnxStrategy::with_threads(4).intra_threads, 4);
        assert_eq!(OnnxStrategy::default().name(), "onnx");
    }

    #[test]
    fn test_json_bytes_are_a_format_error() {
        let err = OnnxStrategy::default()
            .deserialize(br#"{"kind": "linear"}"#)
            .err()
            .unwrap();
        assert!(err.is_format(), "unexpected error: {}", err);
    }
}
