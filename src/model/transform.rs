//! Preprocessing transforms fixed at training time
//!
//! Imputation fills absent slots from a per-feature statistic, scaling then
//! applies a per-feature center/scale. Neither is ever refitted per request.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use super::{check_width, ModelError};

// ============================================================================
// TRAITS
// ============================================================================

/// Fills absent values of an aligned vector
pub trait Imputer: Debug + Send + Sync {
    fn transform(&self, values: &[Option<f64>]) -> Result<Vec<f64>, ModelError>;

    /// Strategy label reported by `/model-info`
    fn strategy(&self) -> &str;
}

/// Per-feature linear transform
pub trait Scaler: Debug + Send + Sync {
    fn transform(&self, values: &[f64]) -> Result<Vec<f64>, ModelError>;

    fn kind(&self) -> &str;
}

// ============================================================================
// SIMPLE IMPUTER
// ============================================================================

/// Imputation strategy the statistics were computed with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImputeStrategy {
    Median,
    Mean,
    Constant,
}

impl ImputeStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Median => "median",
            Self::Mean => "mean",
            Self::Constant => "constant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleImputer {
    pub strategy: ImputeStrategy,
    pub statistics: Vec<f64>,
}

impl SimpleImputer {
    pub fn new(strategy: ImputeStrategy, statistics: Vec<f64>) -> Self {
        Self { strategy, statistics }
    }
}

impl Imputer for SimpleImputer {
    fn transform(&self, values: &[Option<f64>]) -> Result<Vec<f64>, ModelError> {
        check_width(self.statistics.len(), values.len())?;

        Ok(values
            .iter()
            .zip(&self.statistics)
            .map(|(value, fill)| match value {
                Some(v) if !v.is_nan() => *v,
                _ => *fill,
            })
            .collect())
    }

    fn strategy(&self) -> &str {
        self.strategy.as_str()
    }
}

// ============================================================================
// SCALERS
// ============================================================================

/// Standardization: `(x - mean) / scale`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Self {
        Self { mean, scale }
    }
}

impl Scaler for StandardScaler {
    fn transform(&self, values: &[f64]) -> Result<Vec<f64>, ModelError> {
        check_width(self.mean.len(), values.len())?;

        values
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .enumerate()
            .map(|(i, (x, (mean, scale)))| {
                let scaled = (x - mean) / scale;
                if scaled.is_finite() {
                    Ok(scaled)
                } else {
                    Err(ModelError::Numerical(format!("non-finite scaled value at position {}", i)))
                }
            })
            .collect()
    }

    fn kind(&self) -> &str {
        "StandardScaler"
    }
}

/// Pass-through scaler for bundles shipped without scaling
#[derive(Debug, Clone, Default)]
pub struct IdentityScaler;

impl Scaler for IdentityScaler {
    fn transform(&self, values: &[f64]) -> Result<Vec<f64>, ModelError> {
        Ok(values.to_vec())
    }

    fn kind(&self) -> &str {
        "identity"
    }
}
