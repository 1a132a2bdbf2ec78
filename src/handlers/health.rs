//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    model_loaded: bool,
    reference_data_loaded: bool,
    version: &'static str,
    timestamp: i64,
}

/// Always answers 200; a missing model is reported as "unhealthy"
pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    let model_loaded = state.model.is_some();

    Json(HealthResponse {
        status: if model_loaded { "healthy" } else { "unhealthy" },
        model_loaded,
        reference_data_loaded: state.reference.is_some(),
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().timestamp(),
    })
}
