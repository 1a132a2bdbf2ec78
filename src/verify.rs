//! Artifact verification command
//!
//! `credit-scoring-api verify [PATH]` checks an artifact without starting
//! the server.

use std::fmt;
use std::path::Path;

use serde_json::Value;

use crate::model::bundle::DEFAULT_THRESHOLD;
use crate::model::{ArtifactError, ModelBundle};

/// Components a usable artifact must carry
pub const REQUIRED_COMPONENTS: &[&str] = &["model", "features", "scaler", "imputer"];

/// Components the loader can do without
pub const OPTIONAL_COMPONENTS: &[&str] = &["optimal_threshold"];

#[derive(Debug)]
pub struct ComponentStatus {
    pub name: &'static str,
    pub required: bool,
    pub present: bool,
}

impl ComponentStatus {
    fn label(&self) -> String {
        match (self.present, self.required) {
            (true, _) => "present".to_string(),
            (false, true) => "MISSING".to_string(),
            (false, false) if self.name == "optimal_threshold" => {
                format!("absent, fallback {}", DEFAULT_THRESHOLD)
            }
            (false, false) => "absent (optional)".to_string(),
        }
    }
}

#[derive(Debug)]
pub struct BundleSummary {
    pub model_name: String,
    pub model_type: String,
    pub features_count: usize,
    pub threshold: f64,
    pub sha256: String,
}

#[derive(Debug)]
pub struct VerificationReport {
    pub path: String,
    pub size_bytes: u64,
    pub components: Vec<ComponentStatus>,
    pub outcome: Result<BundleSummary, String>,
}

impl VerificationReport {
    pub fn is_valid(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Inspect an artifact. Only an unreadable file is an `Err`; validation
/// failures are recorded in the report.
pub fn verify(path: impl AsRef<Path>) -> Result<VerificationReport, ArtifactError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let keys = serde_json::from_slice::<Value>(&bytes)
        .ok()
        .and_then(|v| v.as_object().cloned())
        .unwrap_or_default();

    let components = REQUIRED_COMPONENTS
        .iter()
        .map(|&name| (name, true))
        .chain(OPTIONAL_COMPONENTS.iter().map(|&name| (name, false)))
        .map(|(name, required)| ComponentStatus { name, required, present: keys.contains_key(name) })
        .collect();

    let outcome = ModelBundle::from_slice(&bytes, &path.display().to_string())
        .map(|bundle| BundleSummary {
            model_name: bundle.name().to_string(),
            model_type: bundle.classifier().kind().to_string(),
            features_count: bundle.feature_count(),
            threshold: bundle.threshold(),
            sha256: bundle.metadata().sha256.clone(),
        })
        .map_err(|e| e.to_string());

    Ok(VerificationReport {
        path: path.display().to_string(),
        size_bytes: bytes.len() as u64,
        components,
        outcome,
    })
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Artifact: {}", self.path)?;
        writeln!(f, "Size: {:.2} MB", self.size_bytes as f64 / 1024.0 / 1024.0)?;
        for c in &self.components {
            writeln!(f, "  {:<18} {}", c.name, c.label())?;
        }
        match &self.outcome {
            Ok(s) => {
                writeln!(f, "Model: {} ({})", s.model_name, s.model_type)?;
                writeln!(f, "Features: {}", s.features_count)?;
                writeln!(f, "Threshold: {:.4}", s.threshold)?;
                writeln!(f, "SHA-256: {}", s.sha256)?;
                write!(f, "Artifact valid")
            }
            Err(e) => write!(f, "Artifact invalid: {}", e),
        }
    }
}

/// Entry point of the `verify` subcommand; returns the process exit code
pub fn run(path: &str) -> i32 {
    match verify(path) {
        Ok(report) => {
            println!("{}", report);
            if report.is_valid() { 0 } else { 1 }
        }
        Err(e) => {
            eprintln!("{}", e);
            1
        }
    }
}
