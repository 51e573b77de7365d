//! Well Log DT Prediction Library
//!
//! Predicts the sonic log (DT) from four well log measurements using a
//! pre-trained regression model, and serves the prediction through a
//! single-page web form.

pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod types;
pub mod web;

pub use config::AppConfig;
pub use error::{FieldError, LoadError, PredictError, ServiceError, StrategyError};
pub use models::{ModelHandle, ModelLoader, ModelService};
pub use types::{Feature, FeatureVector, PredictionReport};
