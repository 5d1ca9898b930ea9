//! SQLite backend handle
//!
//! Wraps one `rusqlite::Connection`. Every query is fully materialised into
//! `Record`s before returning; no cursor outlives the call.

use std::path::{Path, PathBuf};

use rusqlite::types::ValueRef;
use rusqlite::{params_from_iter, Connection, OpenFlags};

use super::{functions, IndexInfo, RelationalBackend, SqlParam};
use crate::error::{EngineError, EngineResult};
use crate::record::{Record, Scalar};

/// Backend identity used in errors and reports
pub const SQLITE_BACKEND: &str = "sqlite";

/// An owned SQLite connection
pub struct SqliteBackend {
    conn: Option<Connection>,
    location: String,
}

impl SqliteBackend {
    /// Opens an existing database file read-write. Fails if absent.
    pub fn open(path: &Path) -> EngineResult<Self> {
        if !path.exists() {
            return Err(EngineError::backend(
                SQLITE_BACKEND,
                format!("database not found: {}", path.display()),
            ));
        }
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_WRITE)?;
        Self::wrap(conn, path.display().to_string())
    }

    /// Opens or creates a database file
    pub fn create(path: &Path) -> EngineResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::wrap(conn, path.display().to_string())
    }

    /// Opens a private in-memory database
    pub fn open_in_memory() -> EngineResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::wrap(conn, ":memory:".to_string())
    }

    fn wrap(conn: Connection, location: String) -> EngineResult<Self> {
        functions::register(&conn)?;
        Ok(Self {
            conn: Some(conn),
            location,
        })
    }

    /// Where the database lives
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Path of an on-disk database
    pub fn path(&self) -> Option<PathBuf> {
        (self.location != ":memory:").then(|| PathBuf::from(&self.location))
    }

    /// Closes the connection; later calls fail as unavailable
    pub fn close(&mut self) -> EngineResult<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| EngineError::from(e))?;
        }
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Borrow the live connection
    pub fn connection(&self) -> EngineResult<&Connection> {
        self.conn
            .as_ref()
            .ok_or_else(|| EngineError::backend(SQLITE_BACKEND, "connection is closed"))
    }

    /// Borrow the live connection mutably (transactions)
    pub fn connection_mut(&mut self) -> EngineResult<&mut Connection> {
        self.conn
            .as_mut()
            .ok_or_else(|| EngineError::backend(SQLITE_BACKEND, "connection is closed"))
    }

    fn pragma_u64(&self, pragma: &str) -> EngineResult<u64> {
        let value: i64 = self
            .connection()?
            .query_row(&format!("PRAGMA {}", pragma), [], |row| row.get(0))?;
        Ok(value.max(0) as u64)
    }
}

impl RelationalBackend for SqliteBackend {
    fn name(&self) -> &str {
        SQLITE_BACKEND
    }

    fn query(&self, sql: &str, params: &[SqlParam]) -> EngineResult<Vec<Record>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Record::new();
            for (i, name) in names.iter().enumerate() {
                record.push(name.clone(), scalar_from(row.get_ref(i)?));
            }
            records.push(record);
        }
        Ok(records)
    }

    fn execute_batch(&self, sql: &str) -> EngineResult<()> {
        self.connection()?.execute_batch(sql)?;
        Ok(())
    }

    fn table_names(&self) -> EngineResult<Vec<String>> {
        let rows = self.query(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
            &[],
        )?;
        Ok(rows
            .iter()
            .filter_map(|r| r.get("name").and_then(Scalar::as_str).map(String::from))
            .collect())
    }

    fn table_columns(&self, table: &str) -> EngineResult<Vec<String>> {
        let rows = self.query(
            "SELECT name FROM pragma_table_info(?1) ORDER BY cid",
            &[SqlParam::Text(table.to_string())],
        )?;
        Ok(rows
            .iter()
            .filter_map(|r| r.get("name").and_then(Scalar::as_str).map(String::from))
            .collect())
    }

    fn row_count(&self, table: &str) -> EngineResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM \"{}\"", table.replace('"', "\"\""));
        let count: i64 = self.connection()?.query_row(&sql, [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    fn indexes(&self) -> EngineResult<Vec<IndexInfo>> {
        let rows = self.query(
            "SELECT name, tbl_name FROM sqlite_master \
             WHERE type = 'index' AND sql IS NOT NULL ORDER BY name",
            &[],
        )?;
        Ok(rows
            .iter()
            .filter_map(|r| {
                Some(IndexInfo {
                    name: r.get("name")?.as_str()?.to_string(),
                    table: r.get("tbl_name")?.as_str()?.to_string(),
                })
            })
            .collect())
    }

    fn footprint_bytes(&self) -> EngineResult<u64> {
        let pages = self.pragma_u64("page_count")?;
        let free = self.pragma_u64("freelist_count")?;
        let size = self.pragma_u64("page_size")?;
        Ok(pages.saturating_sub(free) * size)
    }
}

impl Drop for SqliteBackend {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

fn scalar_from(value: ValueRef<'_>) -> Scalar {
    match value {
        ValueRef::Null => Scalar::Null,
        ValueRef::Integer(i) => Scalar::Int(i),
        ValueRef::Real(f) => Scalar::Float(f),
        ValueRef::Text(bytes) => Scalar::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Scalar::Text(format!("<{} bytes>", bytes.len())),
    }
}
