//! Relational backend
//!
//! A backend handle accepts parameterised query text with bound scalar
//! parameters and returns rows addressable by column name. It also runs DDL
//! and answers introspection calls (tables, columns, row counts, indexes,
//! storage footprint).

mod backend;
pub mod functions;
pub mod schema;

pub use backend::{SqliteBackend, SQLITE_BACKEND};
pub use schema::{create_schema, verify_schema, TableCheck};

use serde::Serialize;

use crate::error::EngineResult;
use crate::record::Record;

/// Bound query parameter
pub type SqlParam = rusqlite::types::Value;

/// A user-created secondary index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexInfo {
    pub name: String,
    pub table: String,
}

/// Relational backend handle
pub trait RelationalBackend {
    /// Backend identity for errors and reports
    fn name(&self) -> &str;

    /// Runs a query and materialises every row
    fn query(&self, sql: &str, params: &[SqlParam]) -> EngineResult<Vec<Record>>;

    /// Runs one or more statements without results
    fn execute_batch(&self, sql: &str) -> EngineResult<()>;

    /// User tables in name order
    fn table_names(&self) -> EngineResult<Vec<String>>;

    /// Column names of a table in declaration order
    fn table_columns(&self, table: &str) -> EngineResult<Vec<String>>;

    /// Row count of a table
    fn row_count(&self, table: &str) -> EngineResult<u64>;

    /// Explicitly created indexes (primary-key structures excluded)
    fn indexes(&self) -> EngineResult<Vec<IndexInfo>>;

    /// Bytes used by live pages
    fn footprint_bytes(&self) -> EngineResult<u64>;
}
