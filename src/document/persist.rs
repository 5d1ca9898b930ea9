//! JSON-lines persistence
//!
//! A store directory holds one `<collection>.jsonl` file per collection, one
//! document per line. Indexes are not persisted; they are rebuilt on demand.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde_json::Value;

use super::store::DocumentStore;
use crate::error::{EngineError, EngineResult};

const EXTENSION: &str = "jsonl";

impl DocumentStore {
    /// Loads every `*.jsonl` file in `dir` as a collection
    pub fn load_dir(dir: &Path) -> EngineResult<Self> {
        let mut store = DocumentStore::new();
        if !dir.is_dir() {
            return Err(EngineError::backend(
                super::DOCUMENT_BACKEND,
                format!("document directory not found: {}", dir.display()),
            ));
        }

        let mut files: Vec<_> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().map_or(false, |ext| ext == EXTENSION))
            .collect();
        files.sort();

        for path in files {
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let reader = BufReader::new(File::open(&path)?);
            let mut docs = Vec::new();
            for (line_no, line) in reader.lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let doc: Value = serde_json::from_str(&line).map_err(|e| {
                    EngineError::Io(format!("{}:{}: {}", path.display(), line_no + 1, e))
                })?;
                docs.push(doc);
            }
            store.insert_many(name, docs)?;
        }
        Ok(store)
    }

    /// Writes every collection to `dir`, replacing existing files.
    ///
    /// Each file is written to a temporary name and renamed into place.
    /// Returns the number of documents written.
    pub fn save_dir(&self, dir: &Path) -> EngineResult<usize> {
        fs::create_dir_all(dir)?;
        let mut written = 0;
        for (name, collection) in self.collections() {
            let target = dir.join(format!("{}.{}", name, EXTENSION));
            let temp = dir.join(format!("{}.{}.tmp", name, EXTENSION));
            {
                let mut writer = BufWriter::new(File::create(&temp)?);
                for doc in collection.documents() {
                    serde_json::to_writer(&mut writer, doc)?;
                    writer.write_all(b"\n")?;
                    written += 1;
                }
                writer.flush()?;
            }
            fs::rename(&temp, &target)?;
        }
        Ok(written)
    }
}
