//! Reference Dataset - stored client records looked up by identifier

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::pipeline::InputRecord;

#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    #[error("failed to read reference data {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("reference data is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("reference data must be a JSON array of objects")]
    NotAnArray,
}

/// One page of identifiers
#[derive(Debug, Clone, Serialize)]
pub struct ClientPage {
    pub id_field: String,
    pub clients: Vec<ClientSummary>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientSummary {
    pub client_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub total_pages: usize,
}

#[derive(Debug, Clone)]
pub struct ReferenceDataset {
    id_field: String,
    records: BTreeMap<i64, InputRecord>,
}

/// Whole floats inside the i64 range; `i64::MAX as f64` rounds up to 2^63
fn is_integral_i64(f: f64) -> bool {
    f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64
}

fn parse_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| is_integral_i64(*f)).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl ReferenceDataset {
    pub fn load(path: impl AsRef<Path>, id_field: &str) -> Result<Self, ReferenceError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| ReferenceError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let dataset = Self::from_slice(&bytes, id_field)?;
        if dataset.is_empty() {
            tracing::warn!(path = %path.display(), id_field = %id_field, "Reference dataset has no usable records");
        }

        tracing::info!(
            path = %path.display(),
            records = dataset.len(),
            id_field = %id_field,
            "Reference dataset loaded"
        );
        Ok(dataset)
    }

    pub fn from_slice(bytes: &[u8], id_field: &str) -> Result<Self, ReferenceError> {
        let value: Value = serde_json::from_slice(bytes)?;
        let Value::Array(rows) = value else {
            return Err(ReferenceError::NotAnArray);
        };

        let mut records = BTreeMap::new();
        let mut skipped = 0usize;

        for row in rows {
            let Value::Object(record) = row else {
                skipped += 1;
                continue;
            };
            match record.get(id_field).and_then(parse_id) {
                Some(id) if !records.contains_key(&id) => {
                    records.insert(id, record);
                }
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            tracing::warn!(skipped, id_field = %id_field, "Skipped reference rows without a usable unique identifier");
        }

        Ok(Self { id_field: id_field.to_string(), records })
    }

    pub fn get(&self, id: i64) -> Option<&InputRecord> {
        self.records.get(&id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// Identifiers in ascending order; `page` is 1-based. A page whose
    /// offset does not fit in `usize` is past the end and comes back empty.
    pub fn page(&self, page: usize, per_page: usize) -> ClientPage {
        let total = self.records.len();
        let per_page = per_page.max(1);
        let clients = match page.saturating_sub(1).checked_mul(per_page) {
            Some(offset) => self
                .records
                .keys()
                .skip(offset)
                .take(per_page)
                .map(|&client_id| ClientSummary { client_id })
                .collect(),
            None => Vec::new(),
        };

        ClientPage {
            id_field: self.id_field.clone(),
            clients,
            pagination: Pagination {
                page,
                per_page,
                total,
                total_pages: total.div_ceil(per_page),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dataset() -> ReferenceDataset {
        let rows = json!([
            {"SK_ID_CURR": 100003, "EXT_SOURCE_2": 0.62},
            {"SK_ID_CURR": 100001, "EXT_SOURCE_2": 0.79},
            {"SK_ID_CURR": "100002", "EXT_SOURCE_2": 0.26},
            {"SK_ID_CURR": 100001, "EXT_SOURCE_2": 0.0},
            {"EXT_SOURCE_2": 0.5},
            "not a record"
        ]);
        ReferenceDataset::from_slice(rows.to_string().as_bytes(), "SK_ID_CURR").unwrap()
    }

    #[test]
    fn test_indexes_by_identifier() {
        let ds = dataset();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.get(100002).unwrap()["EXT_SOURCE_2"], json!(0.26));
        assert!(ds.get(999999999).is_none());
    }

    #[test]
    fn test_duplicate_keeps_first() {
        assert_eq!(dataset().get(100001).unwrap()["EXT_SOURCE_2"], json!(0.79));
    }

    #[test]
    fn test_pagination() {
        let ds = dataset();
        let first = ds.page(1, 2);
        assert_eq!(first.clients.iter().map(|c| c.client_id).collect::<Vec<_>>(), vec![100001, 100002]);
        assert_eq!(first.pagination.total_pages, 2);

        let second = ds.page(2, 2);
        assert_eq!(second.clients.len(), 1);
        assert_eq!(second.clients[0].client_id, 100003);

        assert!(ds.page(5, 2).clients.is_empty());
        assert_eq!(first.id_field, "SK_ID_CURR");
    }

    #[test]
    fn test_page_offset_overflow_is_empty() {
        let ds = dataset();
        let page = ds.page(usize::MAX / 2, 10);
        assert!(page.clients.is_empty());
        assert_eq!(page.pagination.total, 3);

        assert!(ds.page(usize::MAX, usize::MAX).clients.is_empty());
    }

    #[test]
    fn test_out_of_range_float_ids_skipped() {
        let rows = json!([
            {"ID": 1e20, "AMT_CREDIT": 1},
            {"ID": 2e20, "AMT_CREDIT": 2},
            {"ID": -1e20, "AMT_CREDIT": 3},
            {"ID": 42.0, "AMT_CREDIT": 4},
            {"ID": 7.5, "AMT_CREDIT": 5}
        ]);
        let ds = ReferenceDataset::from_slice(rows.to_string().as_bytes(), "ID").unwrap();
        assert_eq!(ds.len(), 1);
        assert!(ds.get(42).is_some());
        assert!(ds.get(i64::MAX).is_none());
        assert!(ds.get(i64::MIN).is_none());
    }

    #[test]
    fn test_empty_dataset() {
        let ds = ReferenceDataset::from_slice(b"[]", "SK_ID_CURR").unwrap();
        assert!(ds.is_empty());
        assert_eq!(ds.page(1, 10).pagination.total_pages, 0);
    }

    #[test]
    fn test_not_an_array() {
        let err = ReferenceDataset::from_slice(br#"{"SK_ID_CURR": 1}"#, "SK_ID_CURR").unwrap_err();
        assert!(matches!(err, ReferenceError::NotAnArray));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("clients.json");
        std::fs::write(&path, r#"[{"ID": 7, "AMT_CREDIT": 1000}]"#).unwrap();

        let ds = ReferenceDataset::load(&path, "ID").unwrap();
        assert_eq!(ds.id_field(), "ID");
        assert!(ds.get(7).is_some());
    }
}
