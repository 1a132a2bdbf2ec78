//! Classifiers - Default Probability Estimators
//!
//! Both implementations return the probability mass of class 1 ("default")
//! in the binary {no-default, default} scheme.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use super::{check_width, ModelError};

/// Trait for probability estimators (logistic, boosted trees, ...)
pub trait Classifier: Debug + Send + Sync {
    fn predict_probability(&self, features: &[f64]) -> Result<f64, ModelError>;

    /// Human readable model family, e.g. "LogisticRegression"
    fn kind(&self) -> &str;
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

// ============================================================================
// LOGISTIC REGRESSION
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl Classifier for LogisticRegression {
    fn predict_probability(&self, features: &[f64]) -> Result<f64, ModelError> {
        check_width(self.coefficients.len(), features.len())?;

        let logit: f64 = self.intercept
            + self.coefficients.iter().zip(features).map(|(w, x)| w * x).sum::<f64>();

        if logit.is_nan() {
            return Err(ModelError::Numerical("logit is NaN".to_string()));
        }
        Ok(sigmoid(logit))
    }

    fn kind(&self) -> &str {
        "LogisticRegression"
    }
}

// ============================================================================
// GRADIENT BOOSTED TREES
// ============================================================================

/// One node of a regression tree, addressed by index inside its tree
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        #[serde(default = "default_missing_left")]
        missing_left: bool,
    },
    Leaf {
        value: f64,
    },
}

fn default_missing_left() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

impl Tree {
    /// Walk from the root to a leaf. `x[f] <= t` goes left.
    fn evaluate(&self, features: &[f64]) -> Result<f64, ModelError> {
        let mut index = 0;
        // A well-formed tree reaches a leaf in fewer steps than it has nodes
        for _ in 0..=self.nodes.len() {
            let node = self.nodes.get(index).ok_or_else(|| {
                ModelError::Numerical(format!("tree node {} out of range", index))
            })?;

            match node {
                TreeNode::Leaf { value } => return Ok(*value),
                TreeNode::Split { feature, threshold, left, right, missing_left } => {
                    let x = features.get(*feature).copied().ok_or(ModelError::DimensionMismatch {
                        expected: feature + 1,
                        actual: features.len(),
                    })?;
                    index = if x.is_nan() {
                        if *missing_left { *left } else { *right }
                    } else if x <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
        Err(ModelError::Numerical("tree traversal did not terminate".to_string()))
    }

    /// Largest feature index referenced by a split
    pub fn max_feature(&self) -> Option<usize> {
        self.nodes
            .iter()
            .filter_map(|n| match n {
                TreeNode::Split { feature, .. } => Some(*feature),
                TreeNode::Leaf { .. } => None,
            })
            .max()
    }

    /// Every child reference points inside the tree
    pub fn is_well_formed(&self) -> bool {
        !self.nodes.is_empty()
            && self.nodes.iter().all(|n| match n {
                TreeNode::Split { left, right, .. } => {
                    *left < self.nodes.len() && *right < self.nodes.len()
                }
                TreeNode::Leaf { .. } => true,
            })
    }
}

/// Additive tree ensemble on the logit scale
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoosting {
    #[serde(default)]
    pub base_score: f64,
    pub trees: Vec<Tree>,
    /// Width of the vector the ensemble was trained on
    #[serde(skip)]
    pub n_features: usize,
}

impl Classifier for GradientBoosting {
    fn predict_probability(&self, features: &[f64]) -> Result<f64, ModelError> {
        check_width(self.n_features, features.len())?;

        let mut raw = self.base_score;
        for tree in &self.trees {
            raw += tree.evaluate(features)?;
        }

        if raw.is_nan() {
            return Err(ModelError::Numerical("raw score is NaN".to_string()));
        }
        Ok(sigmoid(raw))
    }

    fn kind(&self) -> &str {
        "GradientBoosting"
    }
}
