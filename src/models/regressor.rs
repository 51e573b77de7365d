//! Regressor abstraction and the shared model handle

use crate::types::features::FEATURE_COUNT;
use anyhow::Result;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A deserialized model exposing a single-row inference call
pub trait Regressor: Send + Sync {
    /// Run inference on one row in model feature order.
    ///
    /// Returns every output element; callers take the first.
    fn predict_row(&self, row: &[f64; FEATURE_COUNT]) -> Result<Vec<f64>>;
}

struct LoadedModel {
    regressor: Box<dyn Regressor>,
    strategy: String,
    path: PathBuf,
}

/// Immutable, cheaply clonable reference to a loaded model
#[derive(Clone)]
pub struct ModelHandle {
    inner: Arc<LoadedModel>,
}

impl ModelHandle {
    pub fn new(regressor: Box<dyn Regressor>, strategy: &str, path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(LoadedModel {
                regressor,
                strategy: strategy.to_string(),
                path: path.into(),
            }),
        }
    }

    /// Name of the strategy that deserialized the model
    pub fn strategy(&self) -> &str {
        &self.inner.strategy
    }

    /// File the model was loaded from
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub fn predict_row(&self, row: &[f64; FEATURE_COUNT]) -> Result<Vec<f64>> {
        self.inner.regressor.predict_row(row)
    }
}

impl fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelHandle")
            .field("strategy", &self.inner.strategy)
            .field("path", &self.inner.path)
            .finish()
    }
}
