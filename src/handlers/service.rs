//! Service banner

use axum::{extract::State, Json};
use serde::Serialize;

use crate::{AppState, AppResult};

#[derive(Debug, Serialize)]
pub struct Endpoint {
    pub path: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub message: &'static str,
    pub version: &'static str,
    pub model: String,
    pub optimal_threshold: f64,
    pub features_count: usize,
    pub missing_value_policy: &'static str,
    pub endpoints: Vec<Endpoint>,
}

const ENDPOINTS: &[(&str, &str)] = &[
    ("GET /health", "Service health"),
    ("GET /model-info", "Model details"),
    ("GET /features", "Features expected by the model"),
    ("POST /predict", "Prediction from submitted JSON features"),
    ("POST /predict/simple", "Prediction from a few key features"),
    ("GET /test_prediction", "Smoke test on a deterministic random vector"),
    ("GET /clients", "Paginated client identifiers"),
    ("GET /client/:id/info", "Stored characteristics of a client"),
    ("GET /predict/:id", "Prediction for a stored client"),
];

pub async fn index(State(state): State<AppState>) -> AppResult<Json<ServiceInfo>> {
    let bundle = state.bundle()?;

    Ok(Json(ServiceInfo {
        message: "Credit Default Prediction API",
        version: env!("CARGO_PKG_VERSION"),
        model: bundle.name().to_string(),
        optimal_threshold: bundle.threshold(),
        features_count: bundle.feature_count(),
        missing_value_policy: state.config.missing_value_policy.as_str(),
        endpoints: ENDPOINTS
            .iter()
            .map(|&(path, description)| Endpoint { path, description })
            .collect(),
    }))
}
