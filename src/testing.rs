//! Shared test fixtures

use serde_json::{json, Value};

use crate::model::transform::{IdentityScaler, ImputeStrategy, SimpleImputer};
use crate::model::{Classifier, ModelBundle, ModelError};

/// Stub classifier answering from an exact-match lookup table
#[derive(Debug, Clone)]
pub struct TableClassifier {
    pub table: Vec<(Vec<f64>, f64)>,
    pub otherwise: f64,
}

impl TableClassifier {
    pub fn constant(probability: f64) -> Self {
        Self { table: Vec::new(), otherwise: probability }
    }
}

impl Classifier for TableClassifier {
    fn predict_probability(&self, features: &[f64]) -> Result<f64, ModelError> {
        Ok(self
            .table
            .iter()
            .find(|(input, _)| input.as_slice() == features)
            .map(|(_, p)| *p)
            .unwrap_or(self.otherwise))
    }

    fn kind(&self) -> &str {
        "TableClassifier"
    }
}

/// Schema [a, b, c], median imputer [1, 2, 3], identity scaler;
/// [1, 2, 3] scores 0.8 and [5, 2, 3] scores 0.1
pub fn scenario_bundle(threshold: f64) -> ModelBundle {
    ModelBundle::new(
        "scenario",
        Box::new(TableClassifier {
            table: vec![(vec![1.0, 2.0, 3.0], 0.8), (vec![5.0, 2.0, 3.0], 0.1)],
            otherwise: 0.5,
        }),
        Box::new(IdentityScaler),
        Box::new(SimpleImputer::new(ImputeStrategy::Median, vec![1.0, 2.0, 3.0])),
        vec!["a".to_string(), "b".to_string(), "c".to_string()],
        threshold,
    )
    .unwrap()
}

/// Small logistic artifact over three key credit features
pub fn sample_artifact() -> Value {
    json!({
        "model_name": "LogisticRegression-test",
        "model": {
            "kind": "logistic_regression",
            "coefficients": [-1.2, -1.0, 0.3],
            "intercept": -0.1
        },
        "scaler": {
            "kind": "standard",
            "mean": [0.5, 0.5, 500000.0],
            "scale": [0.2, 0.2, 300000.0]
        },
        "imputer": {
            "strategy": "median",
            "statistics": [0.55, 0.5, 450000.0]
        },
        "features": ["EXT_SOURCE_2", "EXT_SOURCE_3", "AMT_CREDIT"],
        "optimal_threshold": 0.52
    })
}

pub fn sample_bundle() -> ModelBundle {
    let bytes = serde_json::to_vec(&sample_artifact()).unwrap();
    ModelBundle::from_slice(&bytes, "sample").unwrap()
}
