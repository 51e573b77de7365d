//! Model service
//!
//! Owns the loader and the memoized model handle. Constructed once at
//! startup and shared by reference with every request.

use crate::error::ServiceError;
use crate::models::inference;
use crate::models::loader::ModelLoader;
use crate::models::regressor::ModelHandle;
use crate::types::features::FeatureVector;
use crate::types::prediction::PredictionReport;
use once_cell::sync::OnceCell;
use std::path::Path;
use tracing::{info, warn};

pub struct ModelService {
    loader: ModelLoader,
    /// Outcome of the one load attempt, absence included
    handle: OnceCell<Option<ModelHandle>>,
}

impl ModelService {
    /// Create the service without touching the model file
    pub fn new(loader: ModelLoader) -> Self {
        Self {
            loader,
            handle: OnceCell::new(),
        }
    }

    /// Create the service and load the model immediately
    pub fn eager(loader: ModelLoader) -> Self {
        let service = Self::new(loader);
        service.handle();
        service
    }

    /// The loaded model, loading it on first use.
    ///
    /// The file is read at most once per service, even when several
    /// callers race on first access.
    pub fn handle(&self) -> Option<ModelHandle> {
        self.handle.get_or_init(|| self.loader.load_model()).clone()
    }

    pub fn model_location(&self) -> &Path {
        self.loader.location()
    }

    /// Validate the row against the feature ranges and predict DT
    pub fn predict(&self, features: &FeatureVector) -> Result<PredictionReport, ServiceError> {
        let model = self.handle().ok_or(ServiceError::ModelUnavailable)?;

        let row = features.validate().map_err(|errors| {
            for err in &errors {
                warn!(feature = %err.feature(), error = %err, "Invalid input");
            }
            ServiceError::InvalidInput(errors)
        })?;

        let predicted_dt = inference::predict(&model, features)?;

        info!(
            predicted_dt = format!("{:.2}", predicted_dt),
            rhob = row[0],
            gr = row[1],
            nphi = row[2],
            pef = row[3],
            "Prediction successful"
        );

        Ok(PredictionReport::new(row, predicted_dt, model.strategy()))
    }
}
