//! Model Module - Scoring Artifact
//!
//! Typed view of the serialized bundle: classifier, paired preprocessing
//! transforms, feature schema and decision threshold.

pub mod bundle;
pub mod classifier;
pub mod transform;

pub use bundle::{ArtifactError, ModelBundle};
pub use classifier::Classifier;
pub use transform::{Imputer, Scaler};

/// Numeric failure raised by a transform or classifier
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("dimension mismatch: expected {expected} values, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("numerical failure: {0}")]
    Numerical(String),
}

/// Ensure a vector has the width a component was fitted on
pub(crate) fn check_width(expected: usize, actual: usize) -> Result<(), ModelError> {
    if expected != actual {
        return Err(ModelError::DimensionMismatch { expected, actual });
    }
    Ok(())
}
