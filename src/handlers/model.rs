//! Model information handlers

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::bundle::ThresholdSource;
use crate::{AppState, AppResult};

#[derive(Debug, Serialize)]
pub struct Preprocessing {
    pub scaler: String,
    pub imputer: String,
    pub missing_value_strategy: String,
    pub missing_value_policy: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Artifact {
    pub source: String,
    pub size_bytes: u64,
    pub sha256: String,
    pub loaded_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub model_name: String,
    pub model_type: String,
    pub version: &'static str,
    pub optimal_threshold: f64,
    pub threshold_source: ThresholdSource,
    pub features: Vec<String>,
    pub features_count: usize,
    pub preprocessing: Preprocessing,
    pub artifact: Artifact,
}

#[derive(Debug, Serialize)]
pub struct FeatureList {
    pub features_count: usize,
    pub features: Vec<String>,
    pub important_features: Vec<String>,
}

/// Number of schema features echoed as a sample
const SAMPLE_SIZE: usize = 10;

pub async fn info(State(state): State<AppState>) -> AppResult<Json<ModelInfo>> {
    let bundle = state.bundle()?;
    let meta = bundle.metadata();

    Ok(Json(ModelInfo {
        model_name: bundle.name().to_string(),
        model_type: bundle.classifier().kind().to_string(),
        version: env!("CARGO_PKG_VERSION"),
        optimal_threshold: bundle.threshold(),
        threshold_source: meta.threshold_source,
        features: bundle.features().to_vec(),
        features_count: bundle.feature_count(),
        preprocessing: Preprocessing {
            scaler: bundle.scaler().kind().to_string(),
            imputer: "SimpleImputer".to_string(),
            missing_value_strategy: bundle.imputer().strategy().to_string(),
            missing_value_policy: state.config.missing_value_policy.as_str(),
        },
        artifact: Artifact {
            source: meta.source.clone(),
            size_bytes: meta.size_bytes,
            sha256: meta.sha256.clone(),
            loaded_at: meta.loaded_at,
        },
    }))
}

pub async fn features(State(state): State<AppState>) -> AppResult<Json<FeatureList>> {
    let bundle = state.bundle()?;

    Ok(Json(FeatureList {
        features_count: bundle.feature_count(),
        features: bundle.features().to_vec(),
        important_features: bundle.features().iter().take(SAMPLE_SIZE).cloned().collect(),
    }))
}
