//! Prediction handlers for submitted records

use axum::{body::Bytes, extract::State, Json};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;
use serde_json::json;

use crate::pipeline::{self, parse_record, Decision, InputRecord, PredictionResponse, RiskTier};
use crate::pipeline::response::round4;
use crate::{AppError, AppResult, AppState};

/// Features the simplified endpoint checks for
pub const KEY_FEATURES: &[&str] = &[
    "EXT_SOURCE_2",
    "EXT_SOURCE_3",
    "AMT_CREDIT",
    "AMT_ANNUITY",
    "DAYS_BIRTH",
    "DAYS_EMPLOYED",
    "AMT_INCOME_TOTAL",
];

/// Minimum number of key features for `/predict/simple`
pub const MIN_KEY_FEATURES: usize = 3;

/// Seed of the smoke-test vector, fixed for reproducibility
const SMOKE_TEST_SEED: u64 = 42;

#[derive(Debug, Serialize)]
pub struct SimplePredictionResponse {
    pub probability_default: f64,
    pub decision: Decision,
    pub risk_level: RiskTier,
    pub prediction_quality: &'static str,
    pub key_features_provided: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SmokeTestResponse {
    pub message: &'static str,
    pub probability_default: f64,
    pub probability_percent: String,
    pub optimal_threshold: f64,
    pub decision: Decision,
    pub confidence_level: &'static str,
    pub seed: u64,
}

/// Score a submitted record
pub async fn predict(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<PredictionResponse>> {
    let bundle = state.bundle()?;
    let record = parse_record(&body)?;
    tracing::debug!(keys = record.len(), "Record received");

    let prediction = pipeline::run(bundle, &record, state.config.missing_value_policy)?;
    Ok(Json(prediction.into_response(bundle)))
}

/// Score a record carrying at least a few key features
pub async fn predict_simple(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<SimplePredictionResponse>> {
    let bundle = state.bundle()?;
    let record = parse_record(&body)?;

    let key_features_provided: Vec<String> = KEY_FEATURES
        .iter()
        .filter(|name| record.get(**name).is_some_and(|v| !v.is_null()))
        .map(|name| name.to_string())
        .collect();

    if key_features_provided.len() < MIN_KEY_FEATURES {
        return Err(AppError::InsufficientFeatures {
            required: KEY_FEATURES,
            minimum: MIN_KEY_FEATURES,
        });
    }

    let prediction = pipeline::run(bundle, &record, state.config.missing_value_policy)?;

    Ok(Json(SimplePredictionResponse {
        probability_default: round4(prediction.probability),
        decision: prediction.outcome.decision,
        risk_level: prediction.outcome.risk_tier,
        prediction_quality: "simplified",
        key_features_provided,
    }))
}

/// Deterministic pseudo-random record over the full schema
fn smoke_test_record(features: &[String]) -> InputRecord {
    let mut rng = StdRng::seed_from_u64(SMOKE_TEST_SEED);
    features
        .iter()
        .map(|name| (name.clone(), json!(rng.gen::<f64>())))
        .collect()
}

/// End-to-end smoke test of the loaded bundle
pub async fn smoke_test(State(state): State<AppState>) -> AppResult<Json<SmokeTestResponse>> {
    let bundle = state.bundle()?;
    let record = smoke_test_record(bundle.features());

    let prediction = pipeline::run(bundle, &record, state.config.missing_value_policy)?;
    let probability = prediction.probability;

    Ok(Json(SmokeTestResponse {
        message: "Test prediction succeeded",
        probability_default: round4(probability),
        probability_percent: format!("{:.2}%", probability * 100.0),
        optimal_threshold: bundle.threshold(),
        decision: prediction.outcome.decision,
        confidence_level: if (probability - 0.5).abs() > 0.3 { "high" } else { "medium" },
        seed: SMOKE_TEST_SEED,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::testing::{sample_bundle, scenario_bundle};

    fn state() -> AppState {
        AppState::new(Config::default(), Some(sample_bundle()), None)
    }

    fn post(state: AppState, body: &str) -> AppResult<Json<PredictionResponse>> {
        tokio_test::block_on(predict(State(state), Bytes::from(body.to_string())))
    }

    #[test]
    fn test_predict_full_record() {
        let Json(response) = post(
            state(),
            r#"{"EXT_SOURCE_2": 0.1, "EXT_SOURCE_3": 0.1, "AMT_CREDIT": 900000, "UNUSED": "x"}"#,
        )
        .unwrap();

        assert!((0.0..=1.0).contains(&response.probability_default));
        assert_eq!(response.completeness.provided, 3);
        assert!(response.warning.is_none());
        assert_eq!(response.model_info.threshold_used, 0.52);
        // low external scores and a large credit push towards default
        assert_eq!(response.decision, Decision::Reject);
    }

    #[test]
    fn test_predict_partial_record_warns() {
        let Json(response) = post(state(), r#"{"AMT_CREDIT": 250000}"#).unwrap();
        assert_eq!(response.completeness.missing, 2);
        assert!(response.warning.is_some());
    }

    #[test]
    fn test_predict_malformed_payloads() {
        for body in ["", "{}", "[1, 2, 3]", "\"text\"", "{broken"] {
            let err = post(state(), body).unwrap_err();
            assert!(matches!(err, AppError::MalformedInput(_)), "body {:?}", body);
        }
    }

    #[test]
    fn test_predict_without_model() {
        let degraded = AppState::new(Config::default(), None, None);
        let err = post(degraded, r#"{"AMT_CREDIT": 1}"#).unwrap_err();
        assert!(matches!(err, AppError::ModelUnavailable));
    }

    #[test]
    fn test_predict_non_numeric_is_preprocessing_error() {
        let err = post(state(), r#"{"AMT_CREDIT": "lots"}"#).unwrap_err();
        assert!(matches!(err, AppError::Preprocessing(_)));
    }

    #[test]
    fn test_predict_scenario_bundle() {
        let state = AppState::new(Config::default(), Some(scenario_bundle(0.52)), None);
        let Json(response) = post(state, r#"{"a": 5, "b": 2, "c": 3}"#).unwrap();
        assert_eq!(response.probability_default, 0.1);
        assert_eq!(response.decision, Decision::Accept);
        assert_eq!(response.risk_level, RiskTier::Low);
        assert_eq!(response.confidence, 0.8);
    }

    #[test]
    fn test_simple_requires_key_features() {
        let err = tokio_test::block_on(predict_simple(
            State(state()),
            Bytes::from_static(br#"{"EXT_SOURCE_2": 0.5, "AMT_CREDIT": null}"#),
        ))
        .unwrap_err();
        assert!(matches!(err, AppError::InsufficientFeatures { minimum: 3, .. }));
    }

    #[test]
    fn test_simple_prediction() {
        let Json(response) = tokio_test::block_on(predict_simple(
            State(state()),
            Bytes::from_static(br#"{"EXT_SOURCE_2": 0.7, "EXT_SOURCE_3": 0.6, "AMT_ANNUITY": 2000, "AMT_CREDIT": 300000}"#),
        ))
        .unwrap();
        assert_eq!(response.prediction_quality, "simplified");
        assert_eq!(response.key_features_provided.len(), 4);
        assert_eq!(response.decision, Decision::Accept);
    }

    #[test]
    fn test_smoke_test_is_deterministic() {
        let Json(first) = tokio_test::block_on(smoke_test(State(state()))).unwrap();
        let Json(second) = tokio_test::block_on(smoke_test(State(state()))).unwrap();
        assert_eq!(first.probability_default, second.probability_default);
        assert_eq!(first.seed, 42);
        assert_eq!(first.optimal_threshold, 0.52);
    }

    #[test]
    fn test_smoke_record_covers_schema() {
        let schema = vec!["x".to_string(), "y".to_string()];
        let record = smoke_test_record(&schema);
        assert_eq!(record.len(), 2);
        assert!(record.values().all(|v| (0.0..1.0).contains(&v.as_f64().unwrap())));
    }
}
