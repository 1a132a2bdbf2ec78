//! Model Bundle - Artifact Loading & Validation
//!
//! The artifact is read once at start-up. Every required component is
//! checked here so a broken artifact fails at load time, never at the
//! first request.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::classifier::{Classifier, GradientBoosting, LogisticRegression};
use super::transform::{IdentityScaler, Imputer, Scaler, SimpleImputer, StandardScaler};

/// Threshold used when the artifact does not carry one
pub const DEFAULT_THRESHOLD: f64 = 0.52;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("failed to read artifact {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("artifact is missing required component '{0}'")]
    MissingField(&'static str),

    #[error("invalid artifact: {0}")]
    Invalid(String),
}

// ============================================================================
// ON-DISK FORMAT
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ClassifierSection {
    LogisticRegression(LogisticRegression),
    GradientBoosting(GradientBoosting),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ScalerSection {
    Standard(StandardScaler),
    Identity,
}

/// Raw artifact; every component optional so absence is reported by name
#[derive(Debug, Deserialize)]
struct ArtifactFile {
    model_name: Option<String>,
    model: Option<ClassifierSection>,
    scaler: Option<ScalerSection>,
    imputer: Option<SimpleImputer>,
    features: Option<Vec<String>>,
    optimal_threshold: Option<f64>,
}

// ============================================================================
// BUNDLE
// ============================================================================

/// Where the decision threshold came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdSource {
    Artifact,
    Fallback,
}

#[derive(Debug, Clone, Serialize)]
pub struct BundleMetadata {
    pub model_name: String,
    pub source: String,
    pub size_bytes: u64,
    pub sha256: String,
    pub threshold_source: ThresholdSource,
    pub loaded_at: DateTime<Utc>,
}

/// Immutable, process-lifetime model bundle shared by all requests
#[derive(Debug)]
pub struct ModelBundle {
    classifier: Box<dyn Classifier>,
    scaler: Box<dyn Scaler>,
    imputer: Box<dyn Imputer>,
    features: Vec<String>,
    threshold: f64,
    metadata: BundleMetadata,
}

impl ModelBundle {
    /// Assemble a bundle from already-built components
    #[cfg(test)]
    pub fn new(
        model_name: impl Into<String>,
        classifier: Box<dyn Classifier>,
        scaler: Box<dyn Scaler>,
        imputer: Box<dyn Imputer>,
        features: Vec<String>,
        threshold: f64,
    ) -> Result<Self, ArtifactError> {
        let metadata = BundleMetadata {
            model_name: model_name.into(),
            source: "<memory>".to_string(),
            size_bytes: 0,
            sha256: String::new(),
            threshold_source: ThresholdSource::Artifact,
            loaded_at: Utc::now(),
        };
        validate_features(&features)?;
        validate_threshold(threshold)?;

        Ok(Self { classifier, scaler, imputer, features, threshold, metadata })
    }

    /// Load and validate the artifact at `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        tracing::info!(path = %path.display(), "Loading model artifact");

        let bytes = std::fs::read(path).map_err(|source| ArtifactError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_slice(&bytes, &path.display().to_string())
    }

    /// Parse and validate an artifact held in memory
    pub fn from_slice(bytes: &[u8], source: &str) -> Result<Self, ArtifactError> {
        let raw: ArtifactFile = serde_json::from_slice(bytes)?;

        let features = raw.features.ok_or(ArtifactError::MissingField("features"))?;
        let model = raw.model.ok_or(ArtifactError::MissingField("model"))?;
        let scaler = raw.scaler.ok_or(ArtifactError::MissingField("scaler"))?;
        let imputer = raw.imputer.ok_or(ArtifactError::MissingField("imputer"))?;

        validate_features(&features)?;
        let width = features.len();

        let classifier: Box<dyn Classifier> = match model {
            ClassifierSection::LogisticRegression(lr) => {
                expect_width("model.coefficients", width, lr.coefficients.len())?;
                Box::new(lr)
            }
            ClassifierSection::GradientBoosting(mut gb) => {
                if gb.trees.is_empty() {
                    return Err(ArtifactError::Invalid("model.trees is empty".to_string()));
                }
                for (i, tree) in gb.trees.iter().enumerate() {
                    if !tree.is_well_formed() {
                        return Err(ArtifactError::Invalid(format!("model.trees[{}] is malformed", i)));
                    }
                    if tree.max_feature().is_some_and(|f| f >= width) {
                        return Err(ArtifactError::Invalid(format!(
                            "model.trees[{}] references a feature outside the schema",
                            i
                        )));
                    }
                }
                gb.n_features = width;
                Box::new(gb)
            }
        };

        let scaler: Box<dyn Scaler> = match scaler {
            ScalerSection::Standard(s) => {
                expect_width("scaler.mean", width, s.mean.len())?;
                expect_width("scaler.scale", width, s.scale.len())?;
                if s.scale.iter().any(|v| *v == 0.0 || !v.is_finite()) {
                    return Err(ArtifactError::Invalid("scaler.scale contains zero or non-finite entries".to_string()));
                }
                Box::new(s)
            }
            ScalerSection::Identity => Box::new(IdentityScaler),
        };

        expect_width("imputer.statistics", width, imputer.statistics.len())?;

        let (threshold, threshold_source) = match raw.optimal_threshold {
            Some(t) => (t, ThresholdSource::Artifact),
            None => {
                tracing::warn!(fallback = DEFAULT_THRESHOLD, "Artifact carries no threshold, using fallback");
                (DEFAULT_THRESHOLD, ThresholdSource::Fallback)
            }
        };
        validate_threshold(threshold)?;

        let metadata = BundleMetadata {
            model_name: raw.model_name.unwrap_or_else(|| classifier.kind().to_string()),
            source: source.to_string(),
            size_bytes: bytes.len() as u64,
            sha256: hex::encode(Sha256::digest(bytes)),
            threshold_source,
            loaded_at: Utc::now(),
        };

        Ok(Self {
            classifier,
            scaler,
            imputer: Box::new(imputer),
            features,
            threshold,
            metadata,
        })
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    pub fn scaler(&self) -> &dyn Scaler {
        self.scaler.as_ref()
    }

    pub fn imputer(&self) -> &dyn Imputer {
        self.imputer.as_ref()
    }

    /// Ordered feature schema; position defines vector slot
    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn name(&self) -> &str {
        &self.metadata.model_name
    }

    pub fn metadata(&self) -> &BundleMetadata {
        &self.metadata
    }
}

// ============================================================================
// VALIDATION
// ============================================================================

fn validate_features(features: &[String]) -> Result<(), ArtifactError> {
    if features.is_empty() {
        return Err(ArtifactError::Invalid("feature list is empty".to_string()));
    }
    let mut seen = HashSet::with_capacity(features.len());
    for name in features {
        if !seen.insert(name.as_str()) {
            return Err(ArtifactError::Invalid(format!("duplicate feature '{}'", name)));
        }
    }
    Ok(())
}

fn validate_threshold(threshold: f64) -> Result<(), ArtifactError> {
    if !(threshold > 0.0 && threshold < 1.0) {
        return Err(ArtifactError::Invalid(format!(
            "threshold {} outside (0, 1)",
            threshold
        )));
    }
    Ok(())
}

fn expect_width(component: &str, expected: usize, actual: usize) -> Result<(), ArtifactError> {
    if expected != actual {
        return Err(ArtifactError::Invalid(format!(
            "{} has {} entries, feature list has {}",
            component, actual, expected
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_artifact;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_load_sample_artifact() {
        let bytes = serde_json::to_vec(&sample_artifact()).unwrap();
        let bundle = ModelBundle::from_slice(&bytes, "sample").unwrap();

        assert_eq!(bundle.feature_count(), 3);
        assert_eq!(bundle.features()[0], "EXT_SOURCE_2");
        assert_eq!(bundle.threshold(), 0.52);
        assert_eq!(bundle.name(), "LogisticRegression-test");
        assert_eq!(bundle.metadata().threshold_source, ThresholdSource::Artifact);
        assert_eq!(bundle.metadata().sha256.len(), 64);
        assert_eq!(bundle.metadata().size_bytes, bytes.len() as u64);
        assert_eq!(bundle.imputer().strategy(), "median");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(sample_artifact().to_string().as_bytes()).unwrap();

        let bundle = ModelBundle::load(file.path()).unwrap();
        assert_eq!(bundle.scaler().kind(), "StandardScaler");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ModelBundle::load("/nonexistent/model_complet.json").unwrap_err();
        assert!(matches!(err, ArtifactError::Io { .. }));
    }

    #[test]
    fn test_missing_components_are_named() {
        for field in ["model", "scaler", "imputer", "features"] {
            let mut artifact = sample_artifact();
            artifact.as_object_mut().unwrap().remove(field);
            let err = ModelBundle::from_slice(artifact.to_string().as_bytes(), "t").unwrap_err();
            match err {
                ArtifactError::MissingField(name) => assert_eq!(name, field),
                other => panic!("unexpected error: {}", other),
            }
        }
    }

    #[test]
    fn test_threshold_fallback() {
        let mut artifact = sample_artifact();
        artifact.as_object_mut().unwrap().remove("optimal_threshold");
        let bundle = ModelBundle::from_slice(artifact.to_string().as_bytes(), "t").unwrap();
        assert_eq!(bundle.threshold(), DEFAULT_THRESHOLD);
        assert_eq!(bundle.metadata().threshold_source, ThresholdSource::Fallback);
    }

    #[test]
    fn test_threshold_out_of_range() {
        let mut artifact = sample_artifact();
        artifact["optimal_threshold"] = json!(1.0);
        let err = ModelBundle::from_slice(artifact.to_string().as_bytes(), "t").unwrap_err();
        assert!(matches!(err, ArtifactError::Invalid(_)));
    }

    #[test]
    fn test_width_mismatch_rejected() {
        let mut artifact = sample_artifact();
        artifact["imputer"]["statistics"] = json!([0.5, 0.5]);
        let err = ModelBundle::from_slice(artifact.to_string().as_bytes(), "t").unwrap_err();
        assert!(err.to_string().contains("imputer.statistics"));
    }

    #[test]
    fn test_duplicate_features_rejected() {
        let mut artifact = sample_artifact();
        artifact["features"] = json!(["a", "b", "a"]);
        assert!(ModelBundle::from_slice(artifact.to_string().as_bytes(), "t").is_err());
    }

    #[test]
    fn test_zero_scale_rejected() {
        let mut artifact = sample_artifact();
        artifact["scaler"]["scale"] = json!([1.0, 0.0, 1.0]);
        assert!(ModelBundle::from_slice(artifact.to_string().as_bytes(), "t").is_err());
    }

    #[test]
    fn test_gradient_boosting_artifact() {
        let mut artifact = sample_artifact();
        artifact["model"] = json!({
            "kind": "gradient_boosting",
            "base_score": -0.2,
            "trees": [{"nodes": [
                {"type": "split", "feature": 2, "threshold": 0.0, "left": 1, "right": 2},
                {"type": "leaf", "value": -0.5},
                {"type": "leaf", "value": 0.5}
            ]}]
        });
        artifact["scaler"] = json!({"kind": "identity"});
        let bundle = ModelBundle::from_slice(artifact.to_string().as_bytes(), "t").unwrap();
        assert_eq!(bundle.classifier().kind(), "GradientBoosting");

        artifact["model"]["trees"][0]["nodes"][0]["feature"] = json!(7);
        assert!(ModelBundle::from_slice(artifact.to_string().as_bytes(), "t").is_err());
    }

    #[test]
    fn test_shipped_artifact_loads() {
        let bytes = include_bytes!("../../models/model_complet.json");
        let bundle = ModelBundle::from_slice(bytes, "models/model_complet.json").unwrap();
        assert_eq!(bundle.name(), "LightGBM");
        assert_eq!(bundle.feature_count(), 8);
        assert_eq!(bundle.threshold(), DEFAULT_THRESHOLD);
    }

    #[test]
    fn test_not_json() {
        let err = ModelBundle::from_slice(b"\x80\x04pickle", "t").unwrap_err();
        assert!(matches!(err, ArtifactError::Parse(_)));
    }
}
