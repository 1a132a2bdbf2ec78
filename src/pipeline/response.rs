//! Response Assembler - fixed-shape prediction payload

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::aligner::Completeness;
use super::decision::{Decision, DecisionOutcome, RiskTier};

pub const PARTIAL_FEATURES_WARNING: &str = "Prediction based on partial features - indicative only";

/// Identification of the model that produced a prediction
#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
    pub name: String,
    pub version: &'static str,
    pub threshold_used: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Interpretation {
    pub result: &'static str,
    pub recommendation: &'static str,
}

impl Interpretation {
    pub fn new(decision: Decision, tier: RiskTier) -> Self {
        Self {
            result: match decision {
                Decision::Reject => "Default predicted",
                Decision::Accept => "No default predicted",
            },
            recommendation: if tier.needs_attention() {
                "Particular attention required"
            } else {
                "Acceptable risk"
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletenessReport {
    pub provided: usize,
    pub missing: usize,
    pub total: usize,
    pub ratio: String,
}

impl From<Completeness> for CompletenessReport {
    fn from(c: Completeness) -> Self {
        Self {
            provided: c.provided,
            missing: c.missing,
            total: c.total,
            ratio: format!("{:.1}%", c.ratio() * 100.0),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PredictionResponse {
    pub prediction_id: Uuid,
    pub prediction: u8,
    pub decision: Decision,
    pub probability_default: f64,
    pub probability_no_default: f64,
    pub risk_level: RiskTier,
    pub confidence: f64,
    pub model_info: ModelSummary,
    pub interpretation: Interpretation,
    pub completeness: CompletenessReport,
    pub warning: Option<&'static str>,
    pub timestamp: DateTime<Utc>,
}

/// Round to 4 decimal places
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

pub fn assemble(
    probability: f64,
    outcome: &DecisionOutcome,
    completeness: Completeness,
    model: ModelSummary,
) -> PredictionResponse {
    PredictionResponse {
        prediction_id: Uuid::new_v4(),
        prediction: outcome.decision.as_prediction(),
        decision: outcome.decision,
        probability_default: round4(probability),
        probability_no_default: round4(1.0 - probability),
        risk_level: outcome.risk_tier,
        confidence: round4(outcome.confidence),
        model_info: model,
        interpretation: Interpretation::new(outcome.decision, outcome.risk_tier),
        completeness: completeness.into(),
        warning: completeness.is_partial().then_some(PARTIAL_FEATURES_WARNING),
        timestamp: Utc::now(),
    }
}
