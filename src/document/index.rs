//! BTreeMap-based secondary indexes for document collections
//!
//! Indexes map a normalised key to the ascending positions of the documents
//! holding it. Null, missing, array and object values are never indexed and
//! never join.

use std::collections::BTreeMap;

use serde_json::Value;

/// Normalised key of a scalar field value.
///
/// Integral floats collapse onto `Int` so that `1994` and `1994.0` join.
/// Ordering is deterministic: Bool < Int < Float < String.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexKey {
    Bool(bool),
    Int(i64),
    /// Float bits, remapped for total ordering
    Float(u64),
    String(String),
}

impl IndexKey {
    /// Create a key from a float
    pub fn from_float(v: f64) -> Self {
        if v.fract() == 0.0 && v.is_finite() && v.abs() < i64::MAX as f64 {
            return IndexKey::Int(v as i64);
        }
        let bits = v.to_bits();
        let ordered = if (bits >> 63) == 1 {
            !bits
        } else {
            bits ^ (1 << 63)
        };
        IndexKey::Float(ordered)
    }

    /// Create a key from a JSON value; `None` for values that never join
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(IndexKey::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(IndexKey::Int(i)),
                None => n.as_f64().map(IndexKey::from_float),
            },
            Value::String(s) => Some(IndexKey::String(s.clone())),
            _ => None,
        }
    }

    /// Group key: like `from_json` but null and missing form their own key
    pub fn group_key(value: Option<&Value>) -> Option<Self> {
        value.and_then(Self::from_json)
    }
}

/// Document position within its collection
pub type Position = usize;

/// A single field index
#[derive(Debug, Default, Clone)]
pub struct IndexTree {
    tree: BTreeMap<IndexKey, Vec<Position>>,
}

impl IndexTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index over `field` of every document
    pub fn build(documents: &[Value], field: &str) -> Self {
        let mut index = Self::new();
        for (position, doc) in documents.iter().enumerate() {
            if let Some(key) = super::get_path(doc, field).and_then(IndexKey::from_json) {
                index.insert(key, position);
            }
        }
        index
    }

    /// Insert a position for a key, keeping positions ascending
    pub fn insert(&mut self, key: IndexKey, position: Position) {
        let positions = self.tree.entry(key).or_default();
        if let Err(pos) = positions.binary_search(&position) {
            positions.insert(pos, position);
        }
    }

    /// Positions holding exactly `key`
    pub fn lookup_eq(&self, key: &IndexKey) -> &[Position] {
        self.tree.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct keys
    pub fn key_count(&self) -> usize {
        self.tree.len()
    }

    /// Number of indexed positions
    pub fn entry_count(&self) -> usize {
        self.tree.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_integral_float_matches_int() {
        assert_eq!(IndexKey::from_json(&json!(1994.0)), IndexKey::from_json(&json!(1994)));
        assert_ne!(IndexKey::from_json(&json!(1994.5)), IndexKey::from_json(&json!(1994)));
    }

    #[test]
    fn test_null_never_indexed() {
        assert_eq!(IndexKey::from_json(&Value::Null), None);
        assert_eq!(IndexKey::group_key(None), None);
    }

    #[test]
    fn test_build_and_lookup() {
        let docs = vec![
            json!({"movie_id": "tt1", "genre": "Drama"}),
            json!({"movie_id": "tt2", "genre": "Comedy"}),
            json!({"movie_id": "tt3", "genre": "Drama"}),
            json!({"movie_id": "tt4", "genre": null}),
        ];
        let index = IndexTree::build(&docs, "genre");

        let key = IndexKey::String("Drama".into());
        assert_eq!(index.lookup_eq(&key), &[0, 2]);
        assert_eq!(index.key_count(), 2);
        assert_eq!(index.entry_count(), 3);
        assert!(index.lookup_eq(&IndexKey::String("Horror".into())).is_empty());
    }

    #[test]
    fn test_insert_keeps_positions_sorted_and_unique() {
        let mut index = IndexTree::new();
        let key = IndexKey::Int(7);
        index.insert(key.clone(), 5);
        index.insert(key.clone(), 1);
        index.insert(key.clone(), 5);
        assert_eq!(index.lookup_eq(&key), &[1, 5]);
    }
}
