//! Document sorting for `sort` stages
//!
//! Multi-key, stable and deterministic. Missing fields sort as null, which
//! places them first ascending and last descending, like SQLite NULLs.

use std::cmp::Ordering;

use serde_json::Value;

use super::get_path;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// One sort key: dotted path and direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Sorts documents
pub struct DocumentSorter;

impl DocumentSorter {
    /// Sorts documents by the keys in order; later keys break ties.
    pub fn sort(documents: &mut [Value], keys: &[SortKey]) {
        documents.sort_by(|a, b| {
            for key in keys {
                let ordering = compare_values(get_path(a, &key.field), get_path(b, &key.field));
                let ordering = match key.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
    }
}

/// Compares two JSON values for sorting.
///
/// Ordering rules:
/// - missing = null < bool < number < string < array < object
/// - For same types, natural ordering
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.unwrap_or(&Value::Null);
    let b = b.unwrap_or(&Value::Null);

    let type_order = |v: &Value| -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    };

    let a_type = type_order(a);
    let b_type = type_order(b);
    if a_type != b_type {
        return a_type.cmp(&b_type);
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(xi), Some(yi)) => xi.cmp(&yi),
            _ => {
                let xf = x.as_f64().unwrap_or(0.0);
                let yf = y.as_f64().unwrap_or(0.0);
                xf.partial_cmp(&yf).unwrap_or(Ordering::Equal)
            }
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn titles(docs: &[Value]) -> Vec<&str> {
        docs.iter().map(|d| d["title"].as_str().unwrap()).collect()
    }

    #[test]
    fn test_multi_key_tie_break() {
        let mut docs = vec![
            json!({"title": "C", "rating": 8.0, "votes": 10}),
            json!({"title": "B", "rating": 8.0, "votes": 20}),
            json!({"title": "A", "rating": 8.0, "votes": 20}),
            json!({"title": "D", "rating": 9.0, "votes": 1}),
        ];
        DocumentSorter::sort(
            &mut docs,
            &[SortKey::desc("rating"), SortKey::desc("votes"), SortKey::asc("title")],
        );
        assert_eq!(titles(&docs), vec!["D", "A", "B", "C"]);
    }

    #[test]
    fn test_sort_stable() {
        let mut docs = vec![
            json!({"title": "x", "n": 1}),
            json!({"title": "y", "n": 1}),
            json!({"title": "z", "n": 1}),
        ];
        DocumentSorter::sort(&mut docs, &[SortKey::asc("n")]);
        assert_eq!(titles(&docs), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_missing_sorts_last_descending() {
        let mut docs = vec![
            json!({"title": "none"}),
            json!({"title": "old", "year": 1980}),
            json!({"title": "new", "year": 2020}),
        ];
        DocumentSorter::sort(&mut docs, &[SortKey::desc("year")]);
        assert_eq!(titles(&docs), vec!["new", "old", "none"]);
    }

    #[test]
    fn test_int_and_float_interleave() {
        assert_eq!(compare_values(Some(&json!(2)), Some(&json!(1.5))), Ordering::Greater);
        assert_eq!(compare_values(Some(&json!(1990)), Some(&json!(1990.0))), Ordering::Equal);
        assert_eq!(compare_values(None, Some(&json!(false))), Ordering::Less);
    }
}
