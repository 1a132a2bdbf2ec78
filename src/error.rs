//! Error handling

use axum::{
    extract::rejection::QueryRejection,
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;

use crate::pipeline::{InputError, PipelineError};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Availability errors
    ModelUnavailable,
    ReferenceDataUnavailable,

    // Request errors
    MalformedInput(String),
    ValidationError(String),
    InsufficientFeatures {
        required: &'static [&'static str],
        minimum: usize,
    },
    UnknownIdentifier(String),

    // Pipeline errors
    Preprocessing(String),
    Scoring(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::ModelUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "error": "Model not loaded" }),
            ),
            AppError::ReferenceDataUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({ "error": "Reference data not loaded" }),
            ),
            AppError::MalformedInput(msg) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": msg,
                    "help": "Send a JSON object with the client's features; see /features"
                }),
            ),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::InsufficientFeatures { required, minimum } => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "Key features missing",
                    "required_minimum": required,
                    "help": format!("Provide at least {} of the listed key features", minimum)
                }),
            ),
            AppError::UnknownIdentifier(id) => (
                StatusCode::NOT_FOUND,
                json!({ "error": format!("Client {} not found", id) }),
            ),
            AppError::Preprocessing(msg) => {
                tracing::error!("Preprocessing error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Prediction failed during preprocessing", "details": msg }),
                )
            }
            AppError::Scoring(msg) => {
                tracing::error!("Scoring error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Prediction failed during scoring", "details": msg }),
                )
            }
        };

        let mut body = body;
        body["status"] = json!(status.as_u16());

        (status, Json(body)).into_response()
    }
}

impl From<InputError> for AppError {
    fn from(err: InputError) -> Self {
        AppError::MalformedInput(err.to_string())
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Preprocessing(msg) => AppError::Preprocessing(msg),
            PipelineError::Scoring(msg) => AppError::Scoring(msg),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::ValidationError(err.to_string())
    }
}
