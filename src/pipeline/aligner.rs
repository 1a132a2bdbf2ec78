//! Feature Aligner
//!
//! Maps an arbitrary JSON record onto the ordered feature vector the model
//! expects. Missing keys become absent slots, unknown keys are dropped.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Raw request record: feature name -> raw value, arbitrary keys allowed
pub type InputRecord = Map<String, Value>;

// ============================================================================
// INPUT VALIDATION
// ============================================================================

/// Structurally malformed payload on the submit-record path
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("No data provided")]
    EmptyBody,

    #[error("Invalid JSON payload: {0}")]
    InvalidJson(String),

    #[error("Expected a JSON object of feature values, got {0}")]
    NotAMapping(&'static str),

    #[error("Empty record: send a JSON object with the client's features")]
    EmptyRecord,
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Parse a request body into a non-empty record
pub fn parse_record(body: &[u8]) -> Result<InputRecord, InputError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(InputError::EmptyBody);
    }

    let value: Value =
        serde_json::from_slice(body).map_err(|e| InputError::InvalidJson(e.to_string()))?;

    match value {
        Value::Object(map) if map.is_empty() => Err(InputError::EmptyRecord),
        Value::Object(map) => Ok(map),
        other => Err(InputError::NotAMapping(kind_of(&other))),
    }
}

// ============================================================================
// ALIGNED VECTOR
// ============================================================================

/// A present slot value, still uncoerced
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Number(f64),
    Bool(bool),
    Text(String),
}

impl RawValue {
    /// `None` for JSON null, which counts as absent
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => n.as_f64().map(Self::Number),
            Value::String(s) => Some(Self::Text(s.clone())),
            other => Some(Self::Text(other.to_string())),
        }
    }
}

/// How absent slots are treated before imputation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingValuePolicy {
    /// Leave slots absent; the imputer fills them with its statistic
    #[default]
    Impute,
    /// Backfill absent slots with 0 so the imputer never sees them
    ZeroFill,
}

impl MissingValuePolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "impute" => Some(Self::Impute),
            "zero_fill" | "zero-fill" | "zero" => Some(Self::ZeroFill),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Impute => "impute",
            Self::ZeroFill => "zero_fill",
        }
    }
}

/// Fixed-length vector in schema order
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedVector {
    slots: Vec<Option<RawValue>>,
    provided: usize,
}

impl AlignedVector {
    pub fn slots(&self) -> &[Option<RawValue>] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Count of schema features the record supplied a value for
    pub fn provided(&self) -> usize {
        self.provided
    }

    #[cfg(test)]
    pub fn absent_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_none()).count()
    }

    pub fn completeness(&self) -> Completeness {
        Completeness::new(self.provided, self.slots.len())
    }

    /// Replace every absent slot with the placeholder 0
    fn zero_fill(&mut self) {
        for slot in self.slots.iter_mut().filter(|s| s.is_none()) {
            *slot = Some(RawValue::Number(0.0));
        }
    }
}

/// Provided vs missing feature counts for a request
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Completeness {
    pub provided: usize,
    pub missing: usize,
    pub total: usize,
}

impl Completeness {
    pub fn new(provided: usize, total: usize) -> Self {
        Self { provided, missing: total - provided, total }
    }

    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.provided as f64 / self.total as f64
        }
    }

    /// More than half of the schema was missing
    pub fn is_partial(&self) -> bool {
        self.missing * 2 > self.total
    }
}

// ============================================================================
// ALIGNMENT
// ============================================================================

/// Place each schema feature's value at its position; never fails
pub fn align(record: &InputRecord, schema: &[String]) -> AlignedVector {
    let slots: Vec<Option<RawValue>> = schema
        .iter()
        .map(|name| record.get(name).and_then(RawValue::from_json))
        .collect();
    let provided = slots.iter().filter(|s| s.is_some()).count();

    AlignedVector { slots, provided }
}

/// Align, then apply the deployment's missing-value policy
pub fn align_with_policy(
    record: &InputRecord,
    schema: &[String],
    policy: MissingValuePolicy,
) -> AlignedVector {
    let mut vector = align(record, schema);
    if policy == MissingValuePolicy::ZeroFill {
        vector.zero_fill();
    }
    vector
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> Vec<String> {
        vec!["a".to_string(), "b".to_string(), "c".to_string()]
    }

    fn record(value: Value) -> InputRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_full_record_in_schema_order() {
        let v = align(&record(json!({"c": 3, "a": 1, "b": 2})), &schema());
        assert_eq!(v.len(), 3);
        assert_eq!(v.absent_count(), 0);
        assert_eq!(
            v.slots(),
            &[Some(RawValue::Number(1.0)), Some(RawValue::Number(2.0)), Some(RawValue::Number(3.0))]
        );
    }

    #[test]
    fn test_empty_record_all_absent() {
        let v = align(&InputRecord::new(), &schema());
        assert_eq!(v.len(), 3);
        assert_eq!(v.absent_count(), 3);
        assert_eq!(v.provided(), 0);
        assert_eq!(v.completeness().missing, 3);
    }

    #[test]
    fn test_unknown_keys_dropped_and_null_absent() {
        let v = align(&record(json!({"a": 1, "zzz": 9, "b": null})), &schema());
        assert_eq!(v.provided(), 1);
        assert_eq!(v.slots()[1], None);
        assert_eq!(v.slots()[2], None);
    }

    #[test]
    fn test_text_values_kept_raw() {
        let v = align(&record(json!({"a": "12.5", "b": true})), &schema());
        assert_eq!(v.slots()[0], Some(RawValue::Text("12.5".to_string())));
        assert_eq!(v.slots()[1], Some(RawValue::Bool(true)));
    }

    #[test]
    fn test_zero_fill_policy() {
        let v = align_with_policy(&record(json!({"b": 4})), &schema(), MissingValuePolicy::ZeroFill);
        assert_eq!(v.absent_count(), 0);
        assert_eq!(v.slots()[0], Some(RawValue::Number(0.0)));
        // counts still reflect what the caller sent
        assert_eq!(v.provided(), 1);
        assert_eq!(v.completeness().missing, 2);
    }

    #[test]
    fn test_partial_warning_threshold() {
        assert!(Completeness::new(1, 3).is_partial());
        assert!(!Completeness::new(2, 4).is_partial());
        assert!(!Completeness::new(3, 3).is_partial());
        assert!((Completeness::new(2, 3).ratio() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_parse_record() {
        assert_eq!(parse_record(b"").unwrap_err(), InputError::EmptyBody);
        assert_eq!(parse_record(b"  \n").unwrap_err(), InputError::EmptyBody);
        assert_eq!(parse_record(b"{}").unwrap_err(), InputError::EmptyRecord);
        assert_eq!(parse_record(b"[1, 2]").unwrap_err(), InputError::NotAMapping("an array"));
        assert_eq!(parse_record(b"42").unwrap_err(), InputError::NotAMapping("a number"));
        assert!(matches!(parse_record(b"{oops"), Err(InputError::InvalidJson(_))));
        assert_eq!(parse_record(br#"{"a": 1}"#).unwrap().len(), 1);
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!(MissingValuePolicy::parse("ZERO_FILL"), Some(MissingValuePolicy::ZeroFill));
        assert_eq!(MissingValuePolicy::parse("impute"), Some(MissingValuePolicy::Impute));
        assert_eq!(MissingValuePolicy::parse("median"), None);
    }
}
