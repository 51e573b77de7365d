//! HTTP presentation layer
//!
//! A single-page form plus a JSON endpoint and a health check, all served
//! from one shared [`ModelService`].

pub mod error;
pub mod handlers;
pub mod render;

pub use error::{ApiError, AppError};

use crate::metrics::PredictionMetrics;
use crate::models::service::ModelService;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ModelService>,
    pub metrics: Arc<PredictionMetrics>,
}

impl AppState {
    pub fn new(service: Arc<ModelService>, metrics: Arc<PredictionMetrics>) -> Self {
        Self { service, metrics }
    }
}

/// Create the router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/predict", post(handlers::submit))
        .route("/api/predict", post(handlers::predict_json))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
