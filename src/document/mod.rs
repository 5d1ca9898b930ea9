//! Document store backend
//!
//! Collections of JSON documents queried through typed aggregation
//! pipelines:
//! - `match` / `match_expr` filter documents
//! - `lookup` joins a foreign collection on one or more equal keys
//! - `unwind` flattens an array field, optionally keeping empty ones
//! - `group` aggregates by named keys in first-seen order
//! - `project` / `add_fields` compute fields from expressions
//! - `sort` / `limit` order and truncate
//!
//! Secondary hash indexes serve lookups and a leading equality match.

mod executor;
mod expr;
mod filters;
mod index;
pub mod migrate;
mod persist;
mod pipeline;
mod sorter;
mod store;

pub use executor::PipelineExecutor;
pub use expr::{Accumulator, Expr};
pub use filters::{FilterOp, Predicate, PredicateFilter};
pub use index::{IndexKey, IndexTree};
pub use migrate::{flatten, TableMigration};
pub use pipeline::{Group, Lookup, Pipeline, Stage, Unwind};
pub use sorter::{compare_values, DocumentSorter, SortDirection, SortKey};
pub use store::{Collection, DocumentStore, DOCUMENT_BACKEND};

use serde_json::Value;

use crate::error::EngineResult;

/// Document backend handle
pub trait DocumentBackend {
    /// Backend identity for errors and reports
    fn name(&self) -> &str;

    /// One document of the collection, or `None` when it is empty
    fn sample(&self, collection: &str) -> EngineResult<Option<Value>>;

    /// Runs a pipeline and materialises every output document
    fn aggregate(&self, pipeline: &Pipeline) -> EngineResult<Vec<Value>>;

    /// Creates a hash index on `field`; returns false if it already existed
    fn create_index(&mut self, collection: &str, field: &str) -> EngineResult<bool>;

    /// Removes every secondary index; returns how many were dropped
    fn drop_indexes(&mut self) -> EngineResult<usize>;

    /// Collection names in order
    fn collection_names(&self) -> EngineResult<Vec<String>>;

    /// Document count of a collection
    fn count(&self, collection: &str) -> EngineResult<usize>;
}

/// Resolves a dotted path inside a document
pub fn get_path<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |current, segment| current.get(segment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_path() {
        let doc = json!({"m": {"primary_title": "Heat", "start_year": 1995}, "n": 1});
        assert_eq!(get_path(&doc, "m.primary_title"), Some(&json!("Heat")));
        assert_eq!(get_path(&doc, "n"), Some(&json!(1)));
        assert_eq!(get_path(&doc, "m.missing"), None);
        assert_eq!(get_path(&doc, "n.deeper"), None);
    }
}
