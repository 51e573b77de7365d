//! Configuration management for the DT prediction service

use crate::models::loader::{project_root, resolve_model_path};
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Model artifact configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model file, relative to `project_root` unless absolute
    pub path: PathBuf,
    /// Anchor for relative model paths (default: working directory)
    pub project_root: PathBuf,
    /// Deserialization strategies, tried in order: "onnx", "json"
    pub strategies: Vec<String>,
    /// Number of threads for ONNX inference
    pub onnx_threads: usize,
}

impl ModelConfig {
    /// Absolute location of the model file
    pub fn resolved_path(&self) -> PathBuf {
        resolve_model_path(&self.project_root, &self.path)
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("models/cmodel.pkl"),
            project_root: project_root(),
            strategies: vec!["onnx".to_string(), "json".to_string()],
            onnx_threads: 1,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

/// Metrics reporting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Seconds between metric summaries in the log; 0 disables them
    pub report_interval_secs: u64,
}

impl AppConfig {
    pub const DEFAULT_PATH: &'static str = "config/config.toml";

    /// Environment prefix for overrides, e.g. `WELL_LOG_DT__SERVER__PORT`
    pub const ENV_PREFIX: &'static str = "WELL_LOG_DT";

    /// Load configuration from the default file
    pub fn load() -> Result<Self> {
        Self::load_from_path(Self::DEFAULT_PATH)
    }

    /// Load configuration from a specific path.
    ///
    /// Built-in defaults come first, then the file if it exists, then
    /// environment overrides.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let defaults =
            Config::try_from(&AppConfig::default()).context("Failed to encode default configuration")?;

        let config = Config::builder()
            .add_source(defaults)
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(
                Environment::with_prefix(Self::ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Socket address the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8501,
            },
            model: ModelConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
            metrics: MetricsConfig {
                report_interval_secs: 300,
            },
        }
    }
}
