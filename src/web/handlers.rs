//! Route handlers

use crate::error::{FieldError, ServiceError};
use crate::metrics::MetricsSnapshot;
use crate::types::features::FeatureVector;
use crate::types::prediction::PredictionReport;
use crate::web::error::{ApiError, AppError};
use crate::web::render::{self, FormState, Notice};
use crate::web::AppState;
use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        State,
    },
    response::Html,
    Form, Json,
};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{error, info, warn};

/// Render the empty form, or the blocking error page without a model
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    require_model(&state)?;
    Ok(Html(render::form_page(&FormState::defaults(), &[], None)))
}

/// Handle a form submission
pub async fn submit(
    State(state): State<AppState>,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> Result<Html<String>, AppError> {
    require_model(&state)?;

    let Form(fields) = form.map_err(|rejection| {
        warn!(
            status = %rejection.status(),
            error = %rejection.body_text(),
            "Unreadable form submission"
        );
        state.metrics.record_rejection(&[]);
        AppError::MalformedForm {
            status: rejection.status(),
        }
    })?;

    let form = FormState::from_submission(&fields);
    let features = match FeatureVector::from_form(&fields) {
        Ok(features) => features,
        Err(errors) => {
            for err in &errors {
                warn!(feature = %err.feature(), error = %err, "Invalid input");
            }
            return Err(reject(&state, form, errors));
        }
    };

    let started = Instant::now();
    match state.service.predict(&features) {
        Ok(report) => {
            state
                .metrics
                .record_prediction(started.elapsed(), report.predicted_dt);
            Ok(Html(render::form_page(
                &form,
                &[],
                Some(Notice::Success(&report)),
            )))
        }
        Err(ServiceError::InvalidInput(errors)) => Err(reject(&state, form, errors)),
        Err(err @ ServiceError::PredictionFailed(_)) => {
            state.metrics.record_failure();
            error!(error = %err, "Prediction failed");
            Err(AppError::PredictionFailed {
                form,
                message: err.to_string(),
            })
        }
        Err(ServiceError::ModelUnavailable) => Err(AppError::ModelUnavailable {
            location: state.service.model_location().to_path_buf(),
        }),
    }
}

/// JSON prediction endpoint
pub async fn predict_json(
    State(state): State<AppState>,
    body: Result<Json<FeatureVector>, JsonRejection>,
) -> Result<Json<PredictionReport>, ApiError> {
    let Json(features) = body.map_err(|rejection| {
        warn!(
            status = %rejection.status(),
            error = %rejection.body_text(),
            "Unreadable prediction request"
        );
        state.metrics.record_rejection(&[]);
        ApiError::MalformedBody {
            status: rejection.status(),
        }
    })?;

    let started = Instant::now();
    match state.service.predict(&features) {
        Ok(report) => {
            state
                .metrics
                .record_prediction(started.elapsed(), report.predicted_dt);
            Ok(Json(report))
        }
        Err(err) => {
            match &err {
                ServiceError::InvalidInput(errors) => state.metrics.record_rejection(errors),
                ServiceError::PredictionFailed(message) => {
                    state.metrics.record_failure();
                    error!(error = %message, "Prediction failed");
                }
                ServiceError::ModelUnavailable => {
                    warn!("Prediction requested but no model is loaded");
                }
            }
            Err(ApiError::Service(err))
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub strategy: String,
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub model_loaded: bool,
    pub model: Option<ModelInfo>,
    pub metrics: MetricsSnapshot,
    pub timestamp: i64,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let model = state.service.handle().map(|handle| ModelInfo {
        strategy: handle.strategy().to_string(),
        path: handle.path().display().to_string(),
    });

    Json(HealthResponse {
        status: if model.is_some() { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        model_loaded: model.is_some(),
        model,
        metrics: state.metrics.snapshot(),
        timestamp: chrono::Utc::now().timestamp(),
    })
}

fn require_model(state: &AppState) -> Result<(), AppError> {
    if state.service.handle().is_some() {
        return Ok(());
    }
    error!(
        path = %state.service.model_location().display(),
        "Model unavailable, prediction form disabled"
    );
    Err(AppError::ModelUnavailable {
        location: state.service.model_location().to_path_buf(),
    })
}

fn reject(state: &AppState, form: FormState, errors: Vec<FieldError>) -> AppError {
    state.metrics.record_rejection(&errors);
    info!(fields = errors.len(), "Submission rejected");
    AppError::InvalidInput { form, errors }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::PredictionMetrics;
    use crate::models::testing::{failing_service, fixed_service, unavailable_service};
    use crate::models::service::ModelService;
    use crate::web::create_router;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        Router,
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(service: ModelService) -> (Router, Arc<PredictionMetrics>) {
        let metrics = Arc::new(PredictionMetrics::new());
        let state = AppState::new(Arc::new(service), metrics.clone());
        (create_router(state), metrics)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn form_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/predict")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn json_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/predict")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_index_renders_form() {
        let (app, _) = app(fixed_service(120.0));
        let request = Request::get("/").body(Body::empty()).unwrap();

        let (status, html) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("<h2>Input Well Log Parameters</h2>"));
        assert!(html.contains("value=\"2.5\""));
    }

    #[tokio::test]
    async fn test_submit_end_to_end() {
        let (app, metrics) = app(fixed_service(120.0));

        let (status, html) = send(app, form_request("RHOB=2.5&GR=50.0&NPHI=0.2&PEF=5.0")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Predicted DT: 120.00 µs/ft"));
        for column in PredictionReport::columns() {
            assert!(html.contains(&format!("<th>{}</th>", column)), "missing column {}", column);
        }
        assert!(html.contains("<td>2.5</td><td>50.0</td><td>0.2</td><td>5.0</td><td>120.00</td>"));
        assert_eq!(metrics.snapshot().predictions_served, 1);
    }

    #[tokio::test]
    async fn test_boundary_values_are_accepted() {
        let (app, _) = app(fixed_service(120.0));
        let (status, html) = send(app, form_request("RHOB=3.0&GR=0&NPHI=1.0&PEF=10")).await;

        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Predicted DT: 120.00 µs/ft"));
    }

    #[tokio::test]
    async fn test_out_of_range_is_reported_per_field() {
        let (app, metrics) = app(fixed_service(120.0));

        let (status, html) = send(app, form_request("RHOB=4.0&GR=50&NPHI=0.2&PEF=11")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(html.contains("Invalid value for RHOB: 4.0. Must be between 1.0 and 3.0."));
        assert!(html.contains("Invalid value for PEF: 11.0. Must be between 0.0 and 10.0."));
        assert!(!html.contains("Predicted DT:"));
        // Form stays editable with the submitted values
        assert!(html.contains("value=\"4.0\""));
        assert!(html.contains("<form"));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.inputs_rejected, 1);
        assert_eq!(snapshot.predictions_served, 0);
    }

    #[tokio::test]
    async fn test_non_numeric_and_missing_fields() {
        let (app, _) = app(fixed_service(120.0));

        let (status, html) = send(app, form_request("RHOB=2.5&GR=abc&NPHI=0.2")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(html.contains("Invalid value for GR: &quot;abc&quot;. Must be a number."));
        assert!(html.contains("Missing value for PEF."));
    }

    #[tokio::test]
    async fn test_model_unavailable_blocks_the_page() {
        let (app, _) = app(unavailable_service());

        let request = Request::get("/").body(Body::empty()).unwrap();
        let (status, html) = send(app.clone(), request).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(html.contains("Failed to load the model."));
        assert!(html.contains("'cmodel.pkl' is available in the 'models' directory"));
        assert!(!html.contains("<form"));

        let (status, _) = send(app, form_request("RHOB=2.5&GR=50&NPHI=0.2&PEF=5")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_json_prediction() {
        let (app, _) = app(fixed_service(120.0));

        let (status, body) =
            send(app, json_request(r#"{"RHOB": 2.5, "GR": 50.0, "NPHI": 0.2, "PEF": 5.0}"#)).await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["predicted_dt"], 120.0);
        assert_eq!(json["unit"], "µs/ft");
        assert_eq!(json["inputs"]["GR"], 50.0);
    }

    #[tokio::test]
    async fn test_json_missing_field() {
        let (app, _) = app(fixed_service(120.0));

        let (status, body) = send(app, json_request(r#"{"RHOB": 2.5, "GR": 50.0, "NPHI": 0.2}"#)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["fields"][0]["feature"], "PEF");
        assert_eq!(json["fields"][0]["message"], "Missing value for PEF.");
    }

    #[tokio::test]
    async fn test_json_without_model() {
        let (app, _) = app(unavailable_service());

        let (status, body) =
            send(app, json_request(r#"{"RHOB": 2.5, "GR": 50.0, "NPHI": 0.2, "PEF": 5.0}"#)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.contains("model unavailable"));
    }

    #[tokio::test]
    async fn test_model_error_keeps_the_form_usable() {
        let (app, metrics) = app(failing_service());

        let (status, html) = send(app, form_request("RHOB=2.5&GR=50.0&NPHI=0.2&PEF=5.0")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(html.contains(
            "Error making prediction: Failed to make prediction: shape mismatch: expected [1, 5]"
        ));
        assert!(html.contains("<form"));
        assert!(html.contains("value=\"50.0\""));
        assert_eq!(metrics.snapshot().predictions_failed, 1);
    }

    #[tokio::test]
    async fn test_form_with_wrong_content_type() {
        let (app, metrics) = app(fixed_service(120.0));
        let request = Request::builder()
            .method("POST")
            .uri("/predict")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"RHOB": 2.5}"#))
            .unwrap();

        let (status, html) = send(app, request).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(html.contains("The submission could not be read."));
        assert!(html.contains("<form"));
        assert_eq!(metrics.snapshot().inputs_rejected, 1);
    }

    #[tokio::test]
    async fn test_json_with_wrong_value_type() {
        let (app, metrics) = app(fixed_service(120.0));

        let response = app
            .oneshot(json_request(
                r#"{"RHOB": "abc", "GR": 50.0, "NPHI": 0.2, "PEF": 5.0}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], 422);
        assert_eq!(json["error"], "Request body is not a valid well log reading.");
        assert!(!json["error"].as_str().unwrap().contains("invalid type"));
        assert_eq!(metrics.snapshot().inputs_rejected, 1);
    }

    #[tokio::test]
    async fn test_health_reports_model() {
        let (app, _) = app(fixed_service(120.0));
        let request = Request::get("/health").body(Body::empty()).unwrap();

        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["model_loaded"], true);
        assert_eq!(json["model"]["strategy"], "fixed");
    }
}
