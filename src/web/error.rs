//! Error responses for the web layer

use crate::error::{FieldError, ServiceError};
use crate::web::render::{self, FormState, Notice};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::path::PathBuf;

/// Failures rendered as HTML pages
#[derive(Debug)]
pub enum AppError {
    /// No model could be loaded; blocks the whole page
    ModelUnavailable { location: PathBuf },

    /// Submission rejected; the form stays editable
    InvalidInput {
        form: FormState,
        errors: Vec<FieldError>,
    },

    /// Inference failed; the form stays usable for another try.
    /// `message` is the service error text.
    PredictionFailed { form: FormState, message: String },

    /// The request body could not be read as a form
    MalformedForm { status: StatusCode },
}

const MALFORMED_FORM: &str = "The submission could not be read. Please use the form below.";
const MALFORMED_BODY: &str = "Request body is not a valid well log reading.";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::ModelUnavailable { location } => (
                StatusCode::SERVICE_UNAVAILABLE,
                Html(render::unavailable_page(&location)),
            )
                .into_response(),
            AppError::InvalidInput { form, errors } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Html(render::form_page(&form, &errors, None)),
            )
                .into_response(),
            AppError::PredictionFailed { form, message } => {
                let notice = format!("Error making prediction: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(render::form_page(&form, &[], Some(Notice::Failure(&notice)))),
                )
                    .into_response()
            }
            AppError::MalformedForm { status } => (
                status,
                Html(render::form_page(
                    &FormState::defaults(),
                    &[],
                    Some(Notice::Failure(MALFORMED_FORM)),
                )),
            )
                .into_response(),
        }
    }
}

/// Failures rendered as JSON for the API endpoint
#[derive(Debug)]
pub enum ApiError {
    Service(ServiceError),

    /// The body was not a JSON well log reading; carries the rejection status
    MalformedBody { status: StatusCode },
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::Service(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, fields): (StatusCode, String, Vec<Value>) = match &self {
            ApiError::Service(err) => {
                let (status, fields) = match err {
                    ServiceError::ModelUnavailable => (StatusCode::SERVICE_UNAVAILABLE, Vec::new()),
                    ServiceError::InvalidInput(errors) => (
                        StatusCode::UNPROCESSABLE_ENTITY,
                        errors
                            .iter()
                            .map(|e| json!({ "feature": e.feature(), "message": e.to_string() }))
                            .collect(),
                    ),
                    ServiceError::PredictionFailed(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, Vec::new())
                    }
                };
                (status, err.to_string(), fields)
            }
            ApiError::MalformedBody { status } => (*status, MALFORMED_BODY.to_string(), Vec::new()),
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
            "fields": fields,
        }));

        (status, body).into_response()
    }
}
