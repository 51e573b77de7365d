//! Stub sources, strategies and regressors for unit tests

use crate::error::{LoadError, StrategyError};
use crate::models::loader::{DeserializeStrategy, ModelLoader, ModelSource};
use crate::models::regressor::Regressor;
use crate::models::service::ModelService;
use crate::types::features::FEATURE_COUNT;
use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// In-memory model file that counts reads
pub struct CountingSource {
    location: PathBuf,
    bytes: Vec<u8>,
    reads: Arc<AtomicUsize>,
}

impl CountingSource {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            location: PathBuf::from("models/cmodel.pkl"),
            bytes,
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn reads(&self) -> Arc<AtomicUsize> {
        self.reads.clone()
    }
}

impl ModelSource for CountingSource {
    fn location(&self) -> &Path {
        &self.location
    }

    fn read(&self) -> Result<Vec<u8>, LoadError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.bytes.is_empty() {
            return Err(LoadError::NotFound(self.location.clone()));
        }
        Ok(self.bytes.clone())
    }
}

/// Returns fixed outputs and counts calls
pub struct FixedRegressor {
    outputs: Vec<f64>,
    calls: Arc<AtomicUsize>,
}

impl FixedRegressor {
    pub fn new(outputs: Vec<f64>) -> Self {
        Self {
            outputs,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl Regressor for FixedRegressor {
    fn predict_row(&self, _row: &[f64; FEATURE_COUNT]) -> Result<Vec<f64>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.outputs.clone())
    }
}

/// Always fails inference
pub struct ErrorRegressor;

impl Regressor for ErrorRegressor {
    fn predict_row(&self, _row: &[f64; FEATURE_COUNT]) -> Result<Vec<f64>> {
        bail!("shape mismatch: expected [1, 5]")
    }
}

/// Strategy that accepts any bytes and yields a [`FixedRegressor`]
pub struct FixedStrategy {
    value: f64,
    calls: Arc<AtomicUsize>,
}

impl FixedStrategy {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

impl DeserializeStrategy for FixedStrategy {
    fn name(&self) -> &str {
        "fixed"
    }

    fn deserialize(&self, _bytes: &[u8]) -> Result<Box<dyn Regressor>, StrategyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FixedRegressor::new(vec![self.value])))
    }
}

/// Strategy that yields an [`ErrorRegressor`]
pub struct BrokenModelStrategy;

impl DeserializeStrategy for BrokenModelStrategy {
    fn name(&self) -> &str {
        "broken"
    }

    fn deserialize(&self, _bytes: &[u8]) -> Result<Box<dyn Regressor>, StrategyError> {
        Ok(Box::new(ErrorRegressor))
    }
}

/// Strategy that always fails with the given error kind
pub struct FailingStrategy {
    name: String,
    error: StrategyError,
}

impl FailingStrategy {
    pub fn format(name: &str) -> Self {
        Self {
            name: name.to_string(),
            error: StrategyError::Format(format!("{} cannot parse these bytes", name)),
        }
    }

    pub fn runtime(name: &str) -> Self {
        Self {
            name: name.to_string(),
            error: StrategyError::Runtime(format!("{} runtime unavailable", name)),
        }
    }
}

impl DeserializeStrategy for FailingStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn deserialize(&self, _bytes: &[u8]) -> Result<Box<dyn Regressor>, StrategyError> {
        Err(self.error.clone())
    }
}

/// Service whose model always predicts `value`
pub fn fixed_service(value: f64) -> ModelService {
    let loader = ModelLoader::with_strategies(
        CountingSource::new(b"stub model".to_vec()),
        vec![Box::new(FixedStrategy::new(value))],
    );
    ModelService::eager(loader)
}

/// Service whose model file does not exist
pub fn unavailable_service() -> ModelService {
    let loader = ModelLoader::with_strategies(
        CountingSource::new(Vec::new()),
        vec![Box::new(FixedStrategy::new(0.0))],
    );
    ModelService::eager(loader)
}

/// Service whose model loads but fails every inference call
pub fn failing_service() -> ModelService {
    let loader = ModelLoader::with_strategies(
        CountingSource::new(b"stub model".to_vec()),
        vec![Box::new(BrokenModelStrategy)],
    );
    ModelService::eager(loader)
}
