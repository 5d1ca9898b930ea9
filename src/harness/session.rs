//! Benchmark session
//!
//! Owns the backend connections of one run. They are acquired once when the
//! session opens and released exactly once, either by `close` or when the
//! session is dropped on an error path.

use std::path::Path;

use crate::config::BenchConfig;
use crate::document::{DocumentStore, DOCUMENT_BACKEND};
use crate::error::EngineResult;
use crate::observability::{log_event_with_fields, Event, Logger};
use crate::relational::{SqliteBackend, SQLITE_BACKEND};

pub struct BenchSession {
    relational: SqliteBackend,
    document: Option<DocumentStore>,
    released: bool,
}

impl BenchSession {
    /// Wraps already opened backends
    pub fn new(relational: SqliteBackend, document: Option<DocumentStore>) -> Self {
        let location = relational.location().to_string();
        log_event_with_fields(
            Event::BackendAcquired,
            &[("backend", SQLITE_BACKEND), ("location", location.as_str())],
        );
        if document.is_some() {
            log_event_with_fields(Event::BackendAcquired, &[("backend", DOCUMENT_BACKEND)]);
        }
        Self {
            relational,
            document,
            released: false,
        }
    }

    /// Opens the configured SQLite database and, if its directory exists,
    /// the document store.
    pub fn open(config: &BenchConfig) -> EngineResult<Self> {
        let relational = SqliteBackend::open(&config.sqlite_path)?;
        let document = open_document_dir(&config.document_dir)?;
        Ok(Self::new(relational, document))
    }

    pub fn relational(&self) -> &SqliteBackend {
        &self.relational
    }

    pub fn document(&self) -> Option<&DocumentStore> {
        self.document.as_ref()
    }

    pub fn document_mut(&mut self) -> Option<&mut DocumentStore> {
        self.document.as_mut()
    }

    /// Both backends at once, the document side mutable
    pub fn split_mut(&mut self) -> (&SqliteBackend, Option<&mut DocumentStore>) {
        (&self.relational, self.document.as_mut())
    }

    /// Releases both backends
    pub fn close(mut self) -> EngineResult<()> {
        self.release()
    }

    fn release(&mut self) -> EngineResult<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        if let Some(store) = self.document.as_mut() {
            store.close();
            log_event_with_fields(Event::BackendReleased, &[("backend", DOCUMENT_BACKEND)]);
        }
        let result = self.relational.close();
        log_event_with_fields(Event::BackendReleased, &[("backend", SQLITE_BACKEND)]);
        result
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl Drop for BenchSession {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            let reason = err.to_string();
            Logger::warn("BACKEND_RELEASE_FAILED", &[("reason", reason.as_str())]);
        }
    }
}

fn open_document_dir(dir: &Path) -> EngineResult<Option<DocumentStore>> {
    if dir.is_dir() {
        DocumentStore::load_dir(dir).map(Some)
    } else {
        Logger::warn(
            "DOCUMENT_STORE_ABSENT",
            &[("dir", dir.display().to_string().as_str())],
        );
        Ok(None)
    }
}
