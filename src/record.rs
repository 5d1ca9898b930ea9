//! Flat result records shared by both backends
//!
//! Every computation, whatever backend runs it, yields an ordered sequence of
//! `Record`s: a field-name → scalar mapping kept in projection order.

use std::cmp::Ordering;
use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

/// Default tolerance for comparing averaged ratings across backends
pub const FLOAT_TOLERANCE: f64 = 1e-6;

/// A single scalar cell
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    /// Returns true for `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Numeric view of the scalar, if any
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Integer view; floats are accepted only when integral
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Int(i) => Some(*i),
            Scalar::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            _ => None,
        }
    }

    /// Text view
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Converts a JSON value into a scalar.
    ///
    /// Integral numbers become `Int`; nested arrays and objects are kept as
    /// their JSON text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Scalar::Null,
            Value::Bool(b) => Scalar::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Scalar::Int(i),
                None => Scalar::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Scalar::Text(s.clone()),
            other => Scalar::Text(other.to_string()),
        }
    }

    /// Compares two scalars allowing `eps` of drift between numbers
    pub fn approx_eq(&self, other: &Scalar, eps: f64) -> bool {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => (a - b).abs() <= eps,
            _ => self == other,
        }
    }

    /// Canonical text used for fingerprints and multiset comparison
    fn canonical(&self) -> String {
        match self {
            Scalar::Null => "null".to_string(),
            Scalar::Bool(b) => format!("b:{}", b),
            Scalar::Int(i) => format!("n:{}", i),
            Scalar::Float(f) => format!("n:{:.6}", f),
            Scalar::Text(s) => format!("s:{}", s),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => write!(f, ""),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Float(v) => write!(f, "{}", v),
            Scalar::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Float(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Text(v.to_string())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Scalar::Text(v)
    }
}

/// An ordered, flat result row
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Vec<(String, Scalar)>,
}

impl Record {
    /// Creates an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field, replacing an earlier field of the same name
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Scalar>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Builder form of `push`
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.push(name, value);
        self
    }

    /// Looks up a field by name
    pub fn get(&self, name: &str) -> Option<&Scalar> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Field names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    /// Fields in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Scalar)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the record has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Flattens a JSON object into a record, keeping its key order
    pub fn from_document(doc: &Value) -> Self {
        let mut record = Record::new();
        if let Value::Object(map) = doc {
            for (key, value) in map {
                record.push(key.clone(), Scalar::from_json(value));
            }
        }
        record
    }

    /// Compares field-by-name, tolerating numeric drift.
    ///
    /// Field order does not matter, the field sets must be identical.
    pub fn approx_eq(&self, other: &Record, eps: f64) -> bool {
        self.len() == other.len()
            && self.iter().all(|(name, value)| {
                other
                    .get(name)
                    .map_or(false, |theirs| value.approx_eq(theirs, eps))
            })
    }

    /// Canonical text of the record with fields sorted by name
    pub fn canonical(&self) -> String {
        let mut parts: Vec<String> = self
            .fields
            .iter()
            .map(|(n, v)| format!("{}={}", n, v.canonical()))
            .collect();
        parts.sort();
        parts.join("\u{1f}")
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Compares two result sequences as multisets.
///
/// Used to verify that both backends of a computation agree, independent of
/// tie-break order.
pub fn records_equivalent(a: &[Record], b: &[Record], eps: f64) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut left: Vec<&Record> = a.iter().collect();
    let mut right: Vec<&Record> = b.iter().collect();
    left.sort_by(|x, y| x.canonical().cmp(&y.canonical()));
    right.sort_by(|x, y| x.canonical().cmp(&y.canonical()));

    // Canonical order can differ when floats straddle a rounding boundary,
    // so fall back to a greedy match on mismatch.
    if left.iter().zip(&right).all(|(x, y)| x.approx_eq(y, eps)) {
        return true;
    }
    let mut used = vec![false; right.len()];
    left.iter().all(|x| {
        match right
            .iter()
            .enumerate()
            .find(|(i, y)| !used[*i] && x.approx_eq(y, eps))
        {
            Some((i, _)) => {
                used[i] = true;
                true
            }
            None => false,
        }
    })
}

/// CRC-32 fingerprint of an ordered result sequence
pub fn fingerprint(records: &[Record]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    for record in records {
        hasher.update(record.canonical().as_bytes());
        hasher.update(b"\n");
    }
    hasher.finalize()
}

/// Orders scalars the way both backends order them: null first, then
/// booleans, numbers, text.
pub fn compare_scalars(a: &Scalar, b: &Scalar) -> Ordering {
    fn rank(s: &Scalar) -> u8 {
        match s {
            Scalar::Null => 0,
            Scalar::Bool(_) => 1,
            Scalar::Int(_) | Scalar::Float(_) => 2,
            Scalar::Text(_) => 3,
        }
    }
    match (a, b) {
        (Scalar::Bool(x), Scalar::Bool(y)) => x.cmp(y),
        (Scalar::Text(x), Scalar::Text(y)) => x.cmp(y),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => rank(a).cmp(&rank(b)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_document_keeps_order_and_types() {
        let doc = json!({"title": "Heat", "year": 1995, "average_rating": 8.3, "character": null});
        let record = Record::from_document(&doc);

        let names: Vec<&str> = record.names().collect();
        assert_eq!(names, vec!["title", "year", "average_rating", "character"]);
        assert_eq!(record.get("year"), Some(&Scalar::Int(1995)));
        assert_eq!(record.get("average_rating"), Some(&Scalar::Float(8.3)));
        assert_eq!(record.get("character"), Some(&Scalar::Null));
    }

    #[test]
    fn test_approx_eq_ignores_field_order_and_rounding() {
        let a = Record::new().with("genre", "Drama").with("avg_rating", 7.1234567);
        let b = Record::new().with("avg_rating", 7.1234568).with("genre", "Drama");
        assert!(a.approx_eq(&b, FLOAT_TOLERANCE));

        let c = Record::new().with("avg_rating", 7.2).with("genre", "Drama");
        assert!(!a.approx_eq(&c, FLOAT_TOLERANCE));
    }

    #[test]
    fn test_int_and_integral_float_compare_equal() {
        let a = Record::new().with("decade", 1990_i64);
        let b = Record::new().with("decade", 1990.0);
        assert!(a.approx_eq(&b, FLOAT_TOLERANCE));
    }

    #[test]
    fn test_records_equivalent_is_order_insensitive() {
        let a = vec![
            Record::new().with("name", "A").with("n", 1_i64),
            Record::new().with("name", "B").with("n", 2_i64),
        ];
        let b = vec![a[1].clone(), a[0].clone()];
        assert!(records_equivalent(&a, &b, FLOAT_TOLERANCE));
        assert!(!records_equivalent(&a, &b[..1], FLOAT_TOLERANCE));
    }

    #[test]
    fn test_fingerprint_is_order_sensitive() {
        let a = vec![Record::new().with("x", 1_i64), Record::new().with("x", 2_i64)];
        let b = vec![a[1].clone(), a[0].clone()];
        assert_eq!(fingerprint(&a), fingerprint(&a.clone()));
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_serializes_as_flat_object() {
        let record = Record::new().with("title", "Heat").with("year", 1995_i64).with("character", Scalar::Null);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"title":"Heat","year":1995,"character":null}"#);
    }

    #[test]
    fn test_compare_scalars_null_first() {
        assert_eq!(compare_scalars(&Scalar::Null, &Scalar::Int(1)), Ordering::Less);
        assert_eq!(compare_scalars(&Scalar::Int(2), &Scalar::Float(1.5)), Ordering::Greater);
        assert_eq!(compare_scalars(&"a".into(), &"b".into()), Ordering::Less);
    }
}
