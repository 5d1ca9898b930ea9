//! Engine error taxonomy
//!
//! Error codes:
//! - CINE_SCHEMA_RESOLUTION (ERROR) - a logical field is absent from a sampled document
//! - CINE_UNKNOWN_COMPUTATION (FATAL) - caller asked for a catalogue entry that does not exist
//! - CINE_BACKEND_UNAVAILABLE (ERROR) - connection loss, timeout or backend-side failure
//! - CINE_INVALID_INDEX (FATAL) - index specification is not a plain identifier list
//! - CINE_CONFIG_INVALID (FATAL) - configuration rejected
//! - CINE_IO_FAILED (ERROR) - local file I/O failed
//!
//! A schema resolution failure only disables the document variant of the
//! affected computation; the benchmark run continues and records a skip.

use std::fmt;

use thiserror::Error;

/// Severity levels for engine errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The current operation failed, the run can continue
    Error,
    /// The run must stop
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Errors raised by the query engine and benchmark harness
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("cannot resolve field role '{role}' in collection '{collection}': {reason}")]
    SchemaResolution {
        role: String,
        collection: String,
        reason: String,
    },

    #[error("unknown computation: {0}")]
    UnknownComputation(String),

    #[error("backend '{backend}' unavailable{}: {reason}", computation_suffix(.computation))]
    BackendUnavailable {
        backend: String,
        computation: Option<String>,
        reason: String,
    },

    #[error("invalid index specification: {0}")]
    InvalidIndexSpec(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("i/o failure: {0}")]
    Io(String),
}

fn computation_suffix(computation: &Option<String>) -> String {
    match computation {
        Some(label) => format!(" while running '{}'", label),
        None => String::new(),
    }
}

impl EngineError {
    /// Create a backend transport error without computation context
    pub fn backend(backend: impl Into<String>, reason: impl Into<String>) -> Self {
        EngineError::BackendUnavailable {
            backend: backend.into(),
            computation: None,
            reason: reason.into(),
        }
    }

    /// Create a schema resolution error
    pub fn schema(
        role: impl Into<String>,
        collection: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        EngineError::SchemaResolution {
            role: role.into(),
            collection: collection.into(),
            reason: reason.into(),
        }
    }

    /// Attach the failing computation label to a backend error.
    ///
    /// Other variants are returned unchanged.
    pub fn with_computation(self, label: &str) -> Self {
        match self {
            EngineError::BackendUnavailable {
                backend,
                computation: None,
                reason,
            } => EngineError::BackendUnavailable {
                backend,
                computation: Some(label.to_string()),
                reason,
            },
            other => other,
        }
    }

    /// Stable error code string
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::SchemaResolution { .. } => "CINE_SCHEMA_RESOLUTION",
            EngineError::UnknownComputation(_) => "CINE_UNKNOWN_COMPUTATION",
            EngineError::BackendUnavailable { .. } => "CINE_BACKEND_UNAVAILABLE",
            EngineError::InvalidIndexSpec(_) => "CINE_INVALID_INDEX",
            EngineError::Config(_) => "CINE_CONFIG_INVALID",
            EngineError::Io(_) => "CINE_IO_FAILED",
        }
    }

    /// Severity of this error
    pub fn severity(&self) -> Severity {
        match self {
            EngineError::UnknownComputation(_)
            | EngineError::InvalidIndexSpec(_)
            | EngineError::Config(_) => Severity::Fatal,
            _ => Severity::Error,
        }
    }

    /// Returns whether this error must abort the run
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }

    /// Returns whether this error only disables one backend variant
    pub fn is_schema_resolution(&self) -> bool {
        matches!(self, EngineError::SchemaResolution { .. })
    }

    /// Returns whether a retry could help
    pub fn is_transport(&self) -> bool {
        matches!(self, EngineError::BackendUnavailable { .. })
    }
}

impl From<rusqlite::Error> for EngineError {
    fn from(e: rusqlite::Error) -> Self {
        EngineError::backend("sqlite", e.to_string())
    }
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Io(format!("JSON error: {}", e))
    }
}

impl From<csv::Error> for EngineError {
    fn from(e: csv::Error) -> Self {
        EngineError::Io(format!("CSV error: {}", e))
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
