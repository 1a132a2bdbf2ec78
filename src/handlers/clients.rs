//! Lookup-by-ID handlers backed by the reference dataset

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::pipeline::{self, InputRecord, PredictionResponse};
use crate::reference::ClientPage;
use crate::{AppError, AppResult, AppState};

#[derive(Debug, Deserialize, Validate)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    #[validate(range(min = 1))]
    pub page: usize,

    #[serde(default = "default_per_page")]
    #[validate(range(min = 1, max = 100))]
    pub per_page: usize,
}

fn default_page() -> usize {
    1
}

fn default_per_page() -> usize {
    10
}

#[derive(Debug, Serialize)]
pub struct ClientInfo {
    pub client_id: i64,
    pub characteristics: InputRecord,
}

#[derive(Debug, Serialize)]
pub struct ClientPrediction {
    pub client_id: i64,
    #[serde(flatten)]
    pub prediction: PredictionResponse,
}

/// Unparseable identifiers can never match a stored record
fn parse_client_id(raw: &str) -> AppResult<i64> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::UnknownIdentifier(raw.to_string()))
}

/// List client identifiers
pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> AppResult<Json<ClientPage>> {
    let Query(query) = query?;
    query.validate()?;
    let dataset = state.reference()?;
    Ok(Json(dataset.page(query.page, query.per_page)))
}

/// Stored characteristics of one client
pub async fn info(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ClientInfo>> {
    let dataset = state.reference()?;
    let client_id = parse_client_id(&id)?;

    let record = dataset
        .get(client_id)
        .ok_or_else(|| AppError::UnknownIdentifier(id.clone()))?;

    Ok(Json(ClientInfo {
        client_id,
        characteristics: record.clone(),
    }))
}

/// Score a stored client through the same pipeline as submitted records
pub async fn predict(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ClientPrediction>> {
    let bundle = state.bundle()?;
    let dataset = state.reference()?;
    let client_id = parse_client_id(&id)?;

    let record = dataset
        .get(client_id)
        .ok_or_else(|| AppError::UnknownIdentifier(id.clone()))?;

    let prediction = pipeline::run(bundle, record, state.config.missing_value_policy)?;
    tracing::info!(client_id, decision = ?prediction.outcome.decision, "Client scored");

    Ok(Json(ClientPrediction {
        client_id,
        prediction: prediction.into_response(bundle),
    }))
}
