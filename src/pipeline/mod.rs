//! Inference Pipeline
//!
//! ```text
//! record ─▶ align ─▶ impute ─▶ scale ─▶ score ─▶ decide ─▶ assemble
//! ```
//!
//! Every stage is a pure function of its input and the shared, read-only
//! `ModelBundle`; requests never touch each other.

pub mod aligner;
pub mod decision;
pub mod preprocess;
pub mod response;
pub mod scoring;

pub use aligner::{align_with_policy, parse_record, InputError, InputRecord, MissingValuePolicy};
pub use decision::{decide, Decision, DecisionOutcome, RiskTier};
pub use response::{assemble, ModelSummary, PredictionResponse};

use crate::model::ModelBundle;
use aligner::Completeness;

/// Internal computation failure; the request itself was well-formed
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    #[error("preprocessing error: {0}")]
    Preprocessing(String),

    #[error("scoring error: {0}")]
    Scoring(String),
}

/// Everything the pipeline computed for one record
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub probability: f64,
    pub outcome: DecisionOutcome,
    pub completeness: Completeness,
}

/// Run one record through the full pipeline
pub fn run(
    bundle: &ModelBundle,
    record: &InputRecord,
    policy: MissingValuePolicy,
) -> Result<Prediction, PipelineError> {
    let vector = align_with_policy(record, bundle.features(), policy);
    let completeness = vector.completeness();

    let features = preprocess::preprocess(&vector, bundle.features(), bundle.imputer(), bundle.scaler())?;
    let probability = scoring::score(&features, bundle.classifier())?;
    let outcome = decide(probability, bundle.threshold());

    tracing::info!(
        decision = ?outcome.decision,
        probability = %format!("{:.3}", probability),
        risk_tier = ?outcome.risk_tier,
        provided = completeness.provided,
        total = completeness.total,
        "Prediction computed"
    );

    Ok(Prediction { probability, outcome, completeness })
}

impl Prediction {
    pub fn into_response(self, bundle: &ModelBundle) -> PredictionResponse {
        assemble(
            self.probability,
            &self.outcome,
            self.completeness,
            ModelSummary {
                name: bundle.name().to_string(),
                version: env!("CARGO_PKG_VERSION"),
                threshold_used: bundle.threshold(),
            },
        )
    }
}
