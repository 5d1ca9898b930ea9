//! In-process document store
//!
//! Collections are ordered vectors of JSON objects with optional secondary
//! indexes. The store is opened once per harness run and closed when the
//! owning session ends; a closed store refuses every call.

use std::collections::BTreeMap;

use serde_json::Value;

use super::executor::PipelineExecutor;
use super::index::IndexTree;
use super::pipeline::Pipeline;
use super::DocumentBackend;
use crate::error::{EngineError, EngineResult};

/// Backend identity used in errors and reports
pub const DOCUMENT_BACKEND: &str = "documents";

/// One collection and its indexes
#[derive(Debug, Default, Clone)]
pub struct Collection {
    documents: Vec<Value>,
    indexes: BTreeMap<String, IndexTree>,
}

impl Collection {
    pub fn documents(&self) -> &[Value] {
        &self.documents
    }

    /// Index over `field`, if one was created
    pub fn index(&self, field: &str) -> Option<&IndexTree> {
        self.indexes.get(field)
    }

    /// Indexed field names in order
    pub fn indexed_fields(&self) -> impl Iterator<Item = &str> {
        self.indexes.keys().map(String::as_str)
    }

    fn append(&mut self, docs: Vec<Value>) -> usize {
        let start = self.documents.len();
        let added = docs.len();
        self.documents.extend(docs);
        for (field, index) in self.indexes.iter_mut() {
            for position in start..self.documents.len() {
                let key = super::get_path(&self.documents[position], field)
                    .and_then(super::index::IndexKey::from_json);
                if let Some(key) = key {
                    index.insert(key, position);
                }
            }
        }
        added
    }
}

/// The document store
#[derive(Debug, Clone)]
pub struct DocumentStore {
    collections: BTreeMap<String, Collection>,
    open: bool,
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore {
    /// Creates an empty, open store
    pub fn new() -> Self {
        Self {
            collections: BTreeMap::new(),
            open: true,
        }
    }

    /// Appends documents to a collection, creating it if needed.
    ///
    /// Existing indexes are maintained. Returns the number inserted.
    pub fn insert_many(&mut self, collection: &str, docs: Vec<Value>) -> EngineResult<usize> {
        self.ensure_open()?;
        Ok(self
            .collections
            .entry(collection.to_string())
            .or_default()
            .append(docs))
    }

    /// Removes a collection; returns whether it existed
    pub fn drop_collection(&mut self, collection: &str) -> EngineResult<bool> {
        self.ensure_open()?;
        Ok(self.collections.remove(collection).is_some())
    }

    /// Borrow a collection
    pub fn collection(&self, name: &str) -> Option<&Collection> {
        self.collections.get(name)
    }

    /// Iterate collections in name order
    pub fn collections(&self) -> impl Iterator<Item = (&str, &Collection)> {
        self.collections.iter().map(|(n, c)| (n.as_str(), c))
    }

    /// Releases the store; later calls fail as unavailable
    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    fn ensure_open(&self) -> EngineResult<()> {
        if self.open {
            Ok(())
        } else {
            Err(EngineError::backend(DOCUMENT_BACKEND, "store is closed"))
        }
    }
}

impl DocumentBackend for DocumentStore {
    fn name(&self) -> &str {
        DOCUMENT_BACKEND
    }

    fn sample(&self, collection: &str) -> EngineResult<Option<Value>> {
        self.ensure_open()?;
        Ok(self
            .collections
            .get(collection)
            .and_then(|c| c.documents.first())
            .cloned())
    }

    fn aggregate(&self, pipeline: &Pipeline) -> EngineResult<Vec<Value>> {
        self.ensure_open()?;
        Ok(PipelineExecutor::new(self).execute(pipeline))
    }

    fn create_index(&mut self, collection: &str, field: &str) -> EngineResult<bool> {
        self.ensure_open()?;
        let coll = self.collections.entry(collection.to_string()).or_default();
        if coll.indexes.contains_key(field) {
            return Ok(false);
        }
        let index = IndexTree::build(&coll.documents, field);
        coll.indexes.insert(field.to_string(), index);
        Ok(true)
    }

    fn drop_indexes(&mut self) -> EngineResult<usize> {
        self.ensure_open()?;
        let mut dropped = 0;
        for coll in self.collections.values_mut() {
            dropped += coll.indexes.len();
            coll.indexes.clear();
        }
        Ok(dropped)
    }

    fn collection_names(&self) -> EngineResult<Vec<String>> {
        self.ensure_open()?;
        Ok(self.collections.keys().cloned().collect())
    }

    fn count(&self, collection: &str) -> EngineResult<usize> {
        self.ensure_open()?;
        Ok(self
            .collections
            .get(collection)
            .map_or(0, |c| c.documents.len()))
    }
}
