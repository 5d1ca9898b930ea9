//! CLI module for cinebench
//!
//! Provides command-line interface for:
//! - bench: time every computation on both backends and report
//! - run: one computation on one backend, records as JSON lines
//! - explain: relational query plans
//! - indexes: apply, drop or inspect the index set
//! - status: table, index and collection counts
//! - migrate: copy relational tables into the document store
//! - seed: create the schema and load a JSON fixture

mod args;
mod commands;
mod errors;
mod io;

pub use args::{BackendArg, Cli, Command, CommonArgs, IndexAction, OutputFormat, ParamArgs};
pub use commands::{bench, explain, indexes, migrate, run, run_command, run_one, seed, status};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_error, write_records, write_response, write_text};
