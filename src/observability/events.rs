//! Observable benchmark events
//!
//! Events are explicit and typed.

use std::fmt;

/// Observable events during a benchmark run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Run lifecycle
    /// Benchmark run begins
    RunBegin,
    /// Benchmark run complete
    RunComplete,
    /// Configuration loaded
    ConfigLoaded,

    // Backend connections
    /// Backend connection acquired
    BackendAcquired,
    /// Backend connection released
    BackendReleased,

    // Schema resolution
    /// Document field roles resolved
    SchemaResolved,

    // Index controller
    /// Index set applied
    IndexesApplied,
    /// Index set dropped
    IndexesDropped,

    // Computations
    /// A computation variant was timed
    ComputationTimed,
    /// A computation variant was skipped
    ComputationSkipped,
    /// A computation variant failed
    ComputationFailed,
    /// Transport failure retried
    ComputationRetried,

    // Output
    /// Report file written
    ReportWritten,

    // Data movement
    /// One relational table copied into a collection
    MigrationTableCopied,
    /// Fixture dataset loaded into the relational store
    SeedLoaded,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::RunBegin => "BENCH_RUN_BEGIN",
            Event::RunComplete => "BENCH_RUN_COMPLETE",
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::BackendAcquired => "BACKEND_ACQUIRED",
            Event::BackendReleased => "BACKEND_RELEASED",

            Event::SchemaResolved => "SCHEMA_RESOLVED",

            Event::IndexesApplied => "INDEXES_APPLIED",
            Event::IndexesDropped => "INDEXES_DROPPED",

            Event::ComputationTimed => "COMPUTATION_TIMED",
            Event::ComputationSkipped => "COMPUTATION_SKIPPED",
            Event::ComputationFailed => "COMPUTATION_FAILED",
            Event::ComputationRetried => "COMPUTATION_RETRIED",

            Event::ReportWritten => "REPORT_WRITTEN",

            Event::MigrationTableCopied => "MIGRATION_TABLE_COPIED",
            Event::SeedLoaded => "SEED_LOADED",
        }
    }

    /// Returns the severity this event is logged at
    pub fn severity(&self) -> super::Severity {
        match self {
            Event::ComputationFailed => super::Severity::Error,
            Event::ComputationSkipped | Event::ComputationRetried => super::Severity::Warn,
            Event::BackendAcquired | Event::BackendReleased => super::Severity::Trace,
            _ => super::Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
