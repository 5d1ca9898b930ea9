//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero exit.

use std::fmt;
use std::io;

use crate::error::EngineError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file or flag error
    ConfigError,
    /// I/O error (stdout, fixture, report files)
    IoError,
    /// A backend could not be opened or failed
    BackendError,
    /// Requested computation does not exist
    UnknownComputation,
    /// Field roles did not resolve against the document store
    SchemaError,
    /// Migrated counts differ from the source tables
    MigrationMismatch,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "CINE_CLI_CONFIG_ERROR",
            Self::IoError => "CINE_CLI_IO_ERROR",
            Self::BackendError => "CINE_CLI_BACKEND_ERROR",
            Self::UnknownComputation => "CINE_CLI_UNKNOWN_COMPUTATION",
            Self::SchemaError => "CINE_CLI_SCHEMA_ERROR",
            Self::MigrationMismatch => "CINE_CLI_MIGRATION_MISMATCH",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn migration_mismatch(tables: &[String]) -> Self {
        Self::new(
            CliErrorCode::MigrationMismatch,
            format!("copied counts differ for: {}", tables.join(", ")),
        )
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<EngineError> for CliError {
    fn from(e: EngineError) -> Self {
        let code = match &e {
            EngineError::Config(_) | EngineError::InvalidIndexSpec(_) => CliErrorCode::ConfigError,
            EngineError::UnknownComputation(_) => CliErrorCode::UnknownComputation,
            EngineError::SchemaResolution { .. } => CliErrorCode::SchemaError,
            EngineError::BackendUnavailable { .. } => CliErrorCode::BackendError,
            EngineError::Io(_) => CliErrorCode::IoError,
        };
        Self::new(code, e.to_string())
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
