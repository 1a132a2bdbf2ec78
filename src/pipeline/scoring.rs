//! Scoring Stage

use crate::model::Classifier;

use super::PipelineError;

/// Probability of the "default" class for a preprocessed vector
pub fn score(features: &[f64], classifier: &dyn Classifier) -> Result<f64, PipelineError> {
    let probability = classifier
        .predict_probability(features)
        .map_err(|e| PipelineError::Scoring(format!("{} failed: {}", classifier.kind(), e)))?;

    if !(0.0..=1.0).contains(&probability) {
        return Err(PipelineError::Scoring(format!(
            "{} returned probability {} outside [0, 1]",
            classifier.kind(),
            probability
        )));
    }

    Ok(probability)
}
