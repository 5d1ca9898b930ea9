//! Relational → document flattening job
//!
//! Copies every relational table into a same-named collection, one document
//! per row with column names as field names, then compares row and document
//! counts.

use serde::Serialize;

use super::store::DocumentStore;
use super::DocumentBackend;
use crate::error::EngineResult;
use crate::observability::{log_event_with_fields, Event};
use crate::relational::RelationalBackend;

/// Outcome for one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableMigration {
    pub table: String,
    pub expected: u64,
    pub copied: u64,
}

impl TableMigration {
    pub fn is_ok(&self) -> bool {
        self.expected == self.copied
    }

    pub fn status(&self) -> &'static str {
        if self.is_ok() {
            "OK"
        } else {
            "MISMATCH"
        }
    }
}

/// Flattens all relational tables into `store`.
///
/// Existing collections of the same name are replaced.
pub fn flatten(
    relational: &dyn RelationalBackend,
    store: &mut DocumentStore,
) -> EngineResult<Vec<TableMigration>> {
    let mut report = Vec::new();
    for table in relational.table_names()? {
        let expected = relational.row_count(&table)?;
        let sql = format!("SELECT * FROM \"{}\"", table.replace('"', "\"\""));
        let rows = relational.query(&sql, &[])?;

        let mut docs = Vec::with_capacity(rows.len());
        for row in &rows {
            docs.push(serde_json::to_value(row)?);
        }

        store.drop_collection(&table)?;
        store.insert_many(&table, docs)?;
        let copied = store.count(&table)? as u64;

        let entry = TableMigration {
            table,
            expected,
            copied,
        };
        let expected = entry.expected.to_string();
        let copied = entry.copied.to_string();
        log_event_with_fields(
            Event::MigrationTableCopied,
            &[
                ("table", entry.table.as_str()),
                ("expected", expected.as_str()),
                ("copied", copied.as_str()),
                ("status", entry.status()),
            ],
        );
        report.push(entry);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relational::SqliteBackend;
    use serde_json::json;

    #[test]
    fn test_flatten_copies_rows_as_documents() {
        let sqlite = SqliteBackend::open_in_memory().unwrap();
        sqlite
            .execute_batch(
                "CREATE TABLE movies (movie_id TEXT PRIMARY KEY, primary_title TEXT, start_year INTEGER);
                 INSERT INTO movies VALUES ('tt1', 'Alpha', 1994), ('tt2', 'Beta', NULL);
                 CREATE TABLE ratings (movie_id TEXT, average_rating REAL);",
            )
            .unwrap();

        let mut store = DocumentStore::new();
        let report = flatten(&sqlite, &mut store).unwrap();

        assert_eq!(report.len(), 2);
        assert!(report.iter().all(TableMigration::is_ok));
        assert_eq!(
            store.sample("movies").unwrap().unwrap(),
            json!({"movie_id": "tt1", "primary_title": "Alpha", "start_year": 1994})
        );
        assert_eq!(store.count("ratings").unwrap(), 0);
    }

    #[test]
    fn test_flatten_replaces_existing_collection() {
        let sqlite = SqliteBackend::open_in_memory().unwrap();
        sqlite
            .execute_batch("CREATE TABLE genres (movie_id TEXT, genre TEXT); INSERT INTO genres VALUES ('tt1', 'Drama');")
            .unwrap();

        let mut store = DocumentStore::new();
        store.insert_many("genres", vec![json!({"stale": true})]).unwrap();
        flatten(&sqlite, &mut store).unwrap();
        assert_eq!(store.count("genres").unwrap(), 1);
    }

    #[test]
    fn test_status_labels() {
        let ok = TableMigration { table: "t".into(), expected: 3, copied: 3 };
        let bad = TableMigration { table: "t".into(), expected: 3, copied: 2 };
        assert_eq!(ok.status(), "OK");
        assert_eq!(bad.status(), "MISMATCH");
    }
}
