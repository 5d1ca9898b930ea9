//! Benchmark configuration
//!
//! Read from a JSON file (default `./cinebench.json`). Every field has a
//! default; a missing file yields the defaults. The loaded configuration is
//! validated before use and may then be overridden from the command line.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalogue::{Computation, Params};
use crate::error::{EngineError, EngineResult};
use crate::index::{default_document_roles, default_index_set, IndexSpec};
use crate::observability::{log_event_with_fields, Event, Severity};
use crate::schema::FieldRole;

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "./cinebench.json";

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchConfig {
    /// SQLite database file
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: PathBuf,

    /// Directory of `<collection>.jsonl` files
    #[serde(default = "default_document_dir")]
    pub document_dir: PathBuf,

    /// Timed invocations per variant (must be >= 1)
    #[serde(default = "default_repeats")]
    pub repeats: u32,

    /// Untimed invocations before timing
    #[serde(default = "default_warmup")]
    pub warmup: u32,

    /// Extra attempts on transport failure (default: none)
    #[serde(default)]
    pub retry_attempts: u32,

    /// Minimum log severity: trace, info, warn, error
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Report CSV written after a run
    #[serde(default)]
    pub report_csv: Option<PathBuf>,

    /// Field delimiter of delimited report output (one byte)
    #[serde(default = "default_delimiter")]
    pub report_delimiter: String,

    /// Relational secondary index set for the indexed regime
    #[serde(default = "default_index_set")]
    pub indexes: Vec<IndexSpec>,

    /// Roles hash-indexed in the document store before timing
    #[serde(default = "default_document_roles")]
    pub document_indexes: Vec<FieldRole>,

    /// Computation parameters
    #[serde(default)]
    pub params: Params,

    /// Catalogue subset by key; empty means all nine
    #[serde(default)]
    pub computations: Vec<String>,
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("data/imdb.db")
}
fn default_document_dir() -> PathBuf {
    PathBuf::from("data/documents")
}
fn default_repeats() -> u32 {
    3
}
fn default_warmup() -> u32 {
    1
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_delimiter() -> String {
    ",".to_string()
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            sqlite_path: default_sqlite_path(),
            document_dir: default_document_dir(),
            repeats: default_repeats(),
            warmup: default_warmup(),
            retry_attempts: 0,
            log_level: default_log_level(),
            report_csv: None,
            report_delimiter: default_delimiter(),
            indexes: default_index_set(),
            document_indexes: default_document_roles(),
            params: Params::default(),
            computations: Vec::new(),
        }
    }
}

impl BenchConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> EngineResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            EngineError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        let config: BenchConfig = serde_json::from_str(&content)
            .map_err(|e| EngineError::Config(format!("invalid config JSON: {}", e)))?;

        config.validate()?;

        let path_str = path.display().to_string();
        log_event_with_fields(Event::ConfigLoaded, &[("path", path_str.as_str())]);
        Ok(config)
    }

    /// Loads `path` if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> EngineResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> EngineResult<()> {
        if self.repeats == 0 {
            return Err(EngineError::Config("repeats must be >= 1".to_string()));
        }

        self.severity()?;
        self.delimiter()?;

        for spec in &self.indexes {
            spec.validate()?;
        }

        self.params.validate()?;
        self.selected_computations()?;

        Ok(())
    }

    /// Parsed log severity
    pub fn severity(&self) -> EngineResult<Severity> {
        self.log_level
            .parse()
            .map_err(EngineError::Config)
    }

    /// Delimiter byte
    pub fn delimiter(&self) -> EngineResult<u8> {
        match self.report_delimiter.as_bytes() {
            [b] => Ok(*b),
            _ => Err(EngineError::Config(format!(
                "report_delimiter must be a single byte, got '{}'",
                self.report_delimiter
            ))),
        }
    }

    /// Computations to run, in catalogue order
    ///
    /// An unknown key fails with `UnknownComputation`.
    pub fn selected_computations(&self) -> EngineResult<Vec<Computation>> {
        if self.computations.is_empty() {
            return Ok(Computation::ALL.to_vec());
        }
        let mut chosen = Vec::with_capacity(self.computations.len());
        for key in &self.computations {
            let computation: Computation = key.parse()?;
            if !chosen.contains(&computation) {
                chosen.push(computation);
            }
        }
        chosen.sort();
        Ok(chosen)
    }
}
