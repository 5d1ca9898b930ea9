//! Predicate filtering for `match` stages
//!
//! Missing and null fields never match. Numbers compare numerically across
//! integer and float representations; there is no other type coercion.

use std::cmp::Ordering;

use regex::Regex;
use serde_json::Value;

use super::get_path;
use crate::error::{EngineError, EngineResult};
use crate::text::needle_pattern;

/// Filter operation types
#[derive(Debug, Clone)]
pub enum FilterOp {
    /// field = value
    Eq(Value),
    /// field is one of the values
    In(Vec<Value>),
    /// field >= value
    Gte(Value),
    /// field > value
    Gt(Value),
    /// field <= value
    Lte(Value),
    /// field < value
    Lt(Value),
    /// Case-insensitive substring match on a text field
    Contains(Regex),
}

impl FilterOp {
    /// Returns true if an equality index can serve this operation
    pub fn is_equality(&self) -> bool {
        matches!(self, FilterOp::Eq(_) | FilterOp::In(_))
    }

    /// Operation name for explain output
    pub fn op_name(&self) -> &'static str {
        match self {
            FilterOp::Eq(_) => "eq",
            FilterOp::In(_) => "in",
            FilterOp::Gte(_) => "gte",
            FilterOp::Gt(_) => "gt",
            FilterOp::Lte(_) => "lte",
            FilterOp::Lt(_) => "lt",
            FilterOp::Contains(_) => "contains",
        }
    }
}

/// A single predicate (dotted field path + operation)
#[derive(Debug, Clone)]
pub struct Predicate {
    pub field: String,
    pub op: FilterOp,
}

impl Predicate {
    pub fn eq(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Eq(value),
        }
    }

    pub fn one_of(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::In(values),
        }
    }

    pub fn gte(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Gte(value),
        }
    }

    pub fn gt(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Gt(value),
        }
    }

    pub fn lte(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Lte(value),
        }
    }

    pub fn lt(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Lt(value),
        }
    }

    /// Unicode case-insensitive substring predicate. The needle is matched literally.
    pub fn contains_ignore_case(field: impl Into<String>, needle: &str) -> EngineResult<Self> {
        let regex = needle_pattern(needle)
            .map_err(|e| EngineError::backend("documents", format!("bad pattern: {}", e)))?;
        Ok(Self {
            field: field.into(),
            op: FilterOp::Contains(regex),
        })
    }
}

/// Evaluates predicates against documents
pub struct PredicateFilter;

impl PredicateFilter {
    /// Checks if a document matches all predicates
    pub fn matches(document: &Value, predicates: &[Predicate]) -> bool {
        predicates
            .iter()
            .all(|pred| Self::matches_predicate(document, pred))
    }

    fn matches_predicate(document: &Value, predicate: &Predicate) -> bool {
        let field_value = match get_path(document, &predicate.field) {
            Some(v) if !v.is_null() => v,
            _ => return false,
        };

        match &predicate.op {
            FilterOp::Eq(expected) => values_equal(field_value, expected),
            FilterOp::In(candidates) => candidates.iter().any(|c| values_equal(field_value, c)),
            FilterOp::Gte(bound) => {
                matches!(compare_same_kind(field_value, bound), Some(Ordering::Greater | Ordering::Equal))
            }
            FilterOp::Gt(bound) => compare_same_kind(field_value, bound) == Some(Ordering::Greater),
            FilterOp::Lte(bound) => {
                matches!(compare_same_kind(field_value, bound), Some(Ordering::Less | Ordering::Equal))
            }
            FilterOp::Lt(bound) => compare_same_kind(field_value, bound) == Some(Ordering::Less),
            FilterOp::Contains(regex) => field_value.as_str().map_or(false, |s| regex.is_match(s)),
        }
    }
}

/// Equality with numeric comparison across int/float
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(xi), Some(yi)) => xi == yi,
            _ => x.as_f64() == y.as_f64(),
        },
        _ => a == b,
    }
}

/// Orders two values of the same kind (number/number or string/string)
pub fn compare_same_kind(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(xi), Some(yi)) = (x.as_i64(), y.as_i64()) {
                return Some(xi.cmp(&yi));
            }
            x.as_f64()?.partial_cmp(&y.as_f64()?)
        }
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_equality_match() {
        let doc = json!({"genre": "Drama", "movie_id": "tt01"});
        assert!(PredicateFilter::matches(&doc, &[Predicate::eq("genre", json!("Drama"))]));
        assert!(!PredicateFilter::matches(&doc, &[Predicate::eq("genre", json!("Comedy"))]));
    }

    #[test]
    fn test_int_float_equality() {
        let doc = json!({"year": 1994});
        assert!(PredicateFilter::matches(&doc, &[Predicate::eq("year", json!(1994.0))]));
        assert!(!PredicateFilter::matches(&doc, &[Predicate::eq("year", json!("1994"))]));
    }

    #[test]
    fn test_in_match() {
        let doc = json!({"category": "actress"});
        let pred = Predicate::one_of("category", vec![json!("actor"), json!("actress")]);
        assert!(PredicateFilter::matches(&doc, &[pred]));

        let pred = Predicate::one_of("category", vec![json!("director")]);
        assert!(!PredicateFilter::matches(&doc, &[pred]));
    }

    #[test]
    fn test_range_predicates_on_nested_path() {
        let doc = json!({"m": {"start_year": 2001}});
        let preds = vec![
            Predicate::gte("m.start_year", json!(1990)),
            Predicate::lte("m.start_year", json!(2020)),
        ];
        assert!(PredicateFilter::matches(&doc, &preds));
        assert!(!PredicateFilter::matches(&doc, &[Predicate::gt("m.start_year", json!(2001))]));
        assert!(!PredicateFilter::matches(&doc, &[Predicate::lt("m.start_year", json!(2001))]));
    }

    #[test]
    fn test_null_and_missing_never_match() {
        let doc = json!({"start_year": null});
        assert!(!PredicateFilter::matches(&doc, &[Predicate::gte("start_year", json!(0))]));
        assert!(!PredicateFilter::matches(&doc, &[Predicate::gte("end_year", json!(0))]));
    }

    #[test]
    fn test_contains_ignore_case_is_literal() {
        let doc = json!({"name": "Tom Hanks"});
        let pred = Predicate::contains_ignore_case("name", "tom h").unwrap();
        assert!(PredicateFilter::matches(&doc, &[pred]));

        // Regex metacharacters in the needle are not interpreted
        let pred = Predicate::contains_ignore_case("name", "T.m").unwrap();
        assert!(!PredicateFilter::matches(&doc, &[pred]));
    }

    #[test]
    fn test_type_mismatch_range_no_match() {
        let doc = json!({"num_votes": "many"});
        assert!(!PredicateFilter::matches(&doc, &[Predicate::gt("num_votes", json!(1))]));
    }
}
