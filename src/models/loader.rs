//! Model loader
//!
//! Reads the model artifact once and hands the bytes to an ordered list of
//! deserialization strategies, moving to the next strategy only when the
//! current one does not recognize the format.

use crate::config::ModelConfig;
use crate::error::{LoadError, StrategyError};
use crate::models::native::JsonStrategy;
use crate::models::onnx::OnnxStrategy;
use crate::models::regressor::{ModelHandle, Regressor};
use anyhow::{bail, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Where model bytes come from
pub trait ModelSource: Send + Sync {
    /// Path reported in logs and errors
    fn location(&self) -> &Path;

    fn read(&self) -> Result<Vec<u8>, LoadError>;
}

/// Model file on the local filesystem
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Resolve `model_path` against the project root unless it is absolute
    pub fn resolve(project_root: &Path, model_path: &Path) -> Self {
        Self::new(resolve_model_path(project_root, model_path))
    }
}

impl ModelSource for FileSource {
    fn location(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Vec<u8>, LoadError> {
        std::fs::read(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => LoadError::NotFound(self.path.clone()),
            _ => LoadError::Io {
                path: self.path.clone(),
                source: e,
            },
        })
    }
}

/// Anchor for relative model paths: the directory the service is started
/// from, the same anchor `config/config.toml` is found against
pub fn project_root() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

pub fn resolve_model_path(project_root: &Path, model_path: &Path) -> PathBuf {
    if model_path.is_absolute() {
        model_path.to_path_buf()
    } else {
        project_root.join(model_path)
    }
}

/// One way of turning model bytes into a regressor
pub trait DeserializeStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Return [`StrategyError::Format`] when the bytes are not in this
    /// strategy's format so the loader can try the next one.
    fn deserialize(&self, bytes: &[u8]) -> Result<Box<dyn Regressor>, StrategyError>;
}

/// Look up a built-in strategy by its configured name
pub fn strategy_by_name(name: &str, onnx_threads: usize) -> Option<Box<dyn DeserializeStrategy>> {
    match name.trim().to_ascii_lowercase().as_str() {
        "onnx" => Some(Box::new(OnnxStrategy::with_threads(onnx_threads))),
        "json" => Some(Box::new(JsonStrategy)),
        _ => None,
    }
}

/// Loader for the DT model
pub struct ModelLoader {
    source: Box<dyn ModelSource>,
    strategies: Vec<Box<dyn DeserializeStrategy>>,
}

impl ModelLoader {
    /// Create a loader using the default strategy order (ONNX, then JSON)
    pub fn new(source: impl ModelSource + 'static) -> Self {
        Self::with_strategies(source, Self::default_strategies())
    }

    pub fn with_strategies(
        source: impl ModelSource + 'static,
        strategies: Vec<Box<dyn DeserializeStrategy>>,
    ) -> Self {
        Self {
            source: Box::new(source),
            strategies,
        }
    }

    /// Build a file-backed loader from configuration
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        let mut strategies = Vec::with_capacity(config.strategies.len());
        for name in &config.strategies {
            match strategy_by_name(name, config.onnx_threads) {
                Some(strategy) => strategies.push(strategy),
                None => bail!("Unknown model strategy '{}' (expected onnx or json)", name),
            }
        }

        Ok(Self::with_strategies(
            FileSource::resolve(&config.project_root, &config.path),
            strategies,
        ))
    }

    pub fn default_strategies() -> Vec<Box<dyn DeserializeStrategy>> {
        vec![Box::new(OnnxStrategy::default()), Box::new(JsonStrategy)]
    }

    pub fn location(&self) -> &Path {
        self.source.location()
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Load the model, reporting why it failed
    pub fn load(&self) -> Result<ModelHandle, LoadError> {
        let path = self.source.location().to_path_buf();

        if self.strategies.is_empty() {
            return Err(LoadError::NoStrategies);
        }

        let bytes = self.source.read()?;
        if bytes.is_empty() {
            warn!(path = %path.display(), "Model file is empty");
            return Err(LoadError::NotFound(path));
        }

        info!(path = %path.display(), size = bytes.len(), "Loading model");

        let mut attempts = Vec::new();
        for strategy in &self.strategies {
            match strategy.deserialize(&bytes) {
                Ok(regressor) => {
                    info!(
                        path = %path.display(),
                        strategy = strategy.name(),
                        fallbacks = attempts.len(),
                        "Model loaded successfully"
                    );
                    return Ok(ModelHandle::new(regressor, strategy.name(), path));
                }
                Err(e) if e.is_format() => {
                    debug!(strategy = strategy.name(), error = %e, "Format not recognized, trying next strategy");
                    attempts.push((strategy.name().to_string(), e));
                }
                Err(e) => {
                    return Err(LoadError::Strategy {
                        strategy: strategy.name().to_string(),
                        source: e,
                    });
                }
            }
        }

        Err(LoadError::Unreadable { path, attempts })
    }

    /// Load the model, signalling failure only as absence.
    ///
    /// Every failure is logged here; callers never see the error.
    pub fn load_model(&self) -> Option<ModelHandle> {
        match self.load() {
            Ok(handle) => Some(handle),
            Err(e) => {
                error!(path = %self.location().display(), error = %e, "Model loading failed");
                None
            }
        }
    }
}
