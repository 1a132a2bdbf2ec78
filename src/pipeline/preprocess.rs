//! Preprocessing Stage - coercion, imputation, then scaling

use crate::model::{Imputer, Scaler};

use super::aligner::{AlignedVector, RawValue};
use super::PipelineError;

fn coerce(name: &str, value: &RawValue) -> Result<Option<f64>, PipelineError> {
    match value {
        RawValue::Number(n) => Ok(Some(*n)),
        RawValue::Bool(b) => Ok(Some(if *b { 1.0 } else { 0.0 })),
        RawValue::Text(s) if s.trim().is_empty() => Ok(None),
        RawValue::Text(s) => s.trim().parse::<f64>().map(Some).map_err(|_| {
            PipelineError::Preprocessing(format!(
                "feature '{}' has non-numeric value '{}'",
                name, s
            ))
        }),
    }
}

/// Impute then scale. `schema` gives the width and names the model expects.
pub fn preprocess(
    vector: &AlignedVector,
    schema: &[String],
    imputer: &dyn Imputer,
    scaler: &dyn Scaler,
) -> Result<Vec<f64>, PipelineError> {
    if vector.len() != schema.len() {
        return Err(PipelineError::Preprocessing(format!(
            "aligned vector has {} slots, model expects {}",
            vector.len(),
            schema.len()
        )));
    }

    let numeric = vector
        .slots()
        .iter()
        .zip(schema)
        .map(|(slot, name)| match slot {
            Some(raw) => coerce(name, raw),
            None => Ok(None),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let imputed = imputer
        .transform(&numeric)
        .map_err(|e| PipelineError::Preprocessing(format!("imputation failed: {}", e)))?;

    scaler
        .transform(&imputed)
        .map_err(|e| PipelineError::Preprocessing(format!("scaling failed: {}", e)))
}
