//! Timing Harness subsystem for cinebench
//!
//! Runs each catalogue computation on the relational backend without and
//! with secondary indexes, then on the document store, and tabulates the
//! comparison.
//!
//! # Design Principles
//!
//! - Sequential: no computation overlaps another or an index change
//! - Warm-up invocations are never timed
//! - The full result is materialised inside the timed window
//! - One failing computation never stops the run
//! - Connections are owned by a session and always released

mod report;
mod runner;
mod session;
mod timing;

pub use report::{BenchReport, ComparisonRow, VariantOutcome};
pub use runner::{run_benchmark, BenchRunner, RunPlan};
pub use session::BenchSession;
pub use timing::{gain_percent, time_computation, time_invocations, Timing};
