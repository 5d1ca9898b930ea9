//! CLI command implementations
//!
//! Every command loads the configuration first (a missing file means
//! defaults), applies its flag overrides, validates, then opens only the
//! backends it needs. Connections are closed before the command returns.

use std::path::Path;

use serde_json::json;

use crate::adapter::{BackendHandle, ExecutionAdapter};
use crate::catalogue::{self, Computation};
use crate::config::BenchConfig;
use crate::dataset::Dataset;
use crate::document::{flatten, DocumentBackend, DocumentStore};
use crate::harness::{run_benchmark, BenchSession};
use crate::index::IndexController;
use crate::observability::Logger;
use crate::relational::{create_schema, verify_schema, RelationalBackend, SqliteBackend};
use crate::schema::SchemaResolver;

use super::args::{BackendArg, Command, CommonArgs, IndexAction, OutputFormat, ParamArgs};
use super::errors::{CliError, CliResult};
use super::io::{write_records, write_response, write_text};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Bench {
            common,
            params,
            repeats,
            warmup,
            only,
            csv,
            format,
        } => {
            let mut config = load_config(&common, &params)?;
            if let Some(repeats) = repeats {
                config.repeats = repeats;
            }
            if let Some(warmup) = warmup {
                config.warmup = warmup;
            }
            if !only.is_empty() {
                config.computations = only;
            }
            if csv.is_some() {
                config.report_csv = csv;
            }
            bench(&config, format)
        }
        Command::Run {
            computation,
            common,
            params,
            backend,
        } => run_one(&load_config(&common, &params)?, &computation, backend),
        Command::Explain {
            computation,
            common,
            params,
        } => explain(&load_config(&common, &params)?, computation.as_deref()),
        Command::Indexes { common, action } => {
            indexes(&load_config(&common, &ParamArgs::default())?, action)
        }
        Command::Status { common } => status(&load_config(&common, &ParamArgs::default())?),
        Command::Migrate { common } => migrate(&load_config(&common, &ParamArgs::default())?),
        Command::Seed {
            common,
            fixture,
            migrate: also_migrate,
        } => {
            let config = load_config(&common, &ParamArgs::default())?;
            seed(&config, &fixture)?;
            if also_migrate {
                migrate(&config)?;
            }
            Ok(())
        }
    }
}

/// Loads the configuration, applies overrides and sets the log level
fn load_config(common: &CommonArgs, params: &ParamArgs) -> CliResult<BenchConfig> {
    let mut config = BenchConfig::load_or_default(&common.config)?;
    if let Some(level) = &common.log_level {
        config.log_level = level.clone();
    }
    params.apply(&mut config.params);
    Logger::set_min_severity(config.severity()?);
    Ok(config)
}

/// Runs the full benchmark and prints the report
pub fn bench(config: &BenchConfig, format: OutputFormat) -> CliResult<()> {
    config.validate()?;
    let report = run_benchmark(config)?;
    match format {
        OutputFormat::Table => write_text(&report.render_table()),
        OutputFormat::Csv => write_text(&report.to_delimited(config.delimiter()?)?),
        OutputFormat::Json => write_text(&report.to_json()?),
    }
}

/// Runs one computation once and prints its records
pub fn run_one(config: &BenchConfig, name: &str, backend: BackendArg) -> CliResult<()> {
    config.params.validate()?;
    // Unknown names fail before any backend is opened
    let computation: Computation = name.parse()?;
    let adapter = ExecutionAdapter::new().with_retries(config.retry_attempts);

    let session = BenchSession::open(config)?;
    let records = match backend {
        BackendArg::Relational => adapter.run_computation(
            computation,
            BackendHandle::Relational(session.relational()),
            &config.params,
        )?,
        BackendArg::Document => {
            let store = session.document().ok_or_else(|| {
                CliError::config_error(format!(
                    "no document store at {}; run 'cinebench migrate' first",
                    config.document_dir.display()
                ))
            })?;
            let fields = SchemaResolver::resolve(store)?;
            adapter.run_computation(
                computation,
                BackendHandle::Document {
                    store,
                    fields: &fields,
                },
                &config.params,
            )?
        }
    };
    session.close()?;
    write_records(&records)
}

/// Prints the relational query plan of one or every computation
pub fn explain(config: &BenchConfig, name: Option<&str>) -> CliResult<()> {
    config.params.validate()?;
    let computations = match name {
        Some(name) => vec![name.parse::<Computation>()?],
        None => config.selected_computations()?,
    };

    let mut backend = SqliteBackend::open(&config.sqlite_path)?;
    let mut out = String::new();
    for computation in computations {
        let plan = catalogue::explain(&backend, computation, &config.params)?;
        out.push_str(&plan.to_string());
        out.push('\n');
    }
    backend.close()?;
    write_text(&out)
}

/// Applies, drops or reports the configured index set
pub fn indexes(config: &BenchConfig, action: IndexAction) -> CliResult<()> {
    config.validate()?;
    let mut backend = SqliteBackend::open(&config.sqlite_path)?;
    let controller = IndexController::new(&backend);
    let data = match action {
        IndexAction::Apply => serde_json::to_value(controller.apply(&config.indexes)?)?,
        IndexAction::Drop => serde_json::to_value(controller.drop(&config.indexes)?)?,
        IndexAction::DropAll => serde_json::to_value(controller.drop_all()?)?,
        IndexAction::Status => json!({
            "indexes": controller.status(&config.indexes)?,
            "footprint_bytes": controller.footprint()?,
        }),
    };
    backend.close()?;
    write_response(data)
}

/// Reports table counts, indexes and document collections
pub fn status(config: &BenchConfig) -> CliResult<()> {
    let mut backend = SqliteBackend::open(&config.sqlite_path)?;
    let mut tables = Vec::new();
    for check in verify_schema(&backend)? {
        let rows = if check.present {
            Some(backend.row_count(&check.table)?)
        } else {
            None
        };
        tables.push(json!({
            "table": check.table,
            "rows": rows,
            "missing_columns": check.missing_columns,
        }));
    }
    let indexes: Vec<_> = backend
        .indexes()?
        .into_iter()
        .map(|info| json!({"name": info.name, "table": info.table}))
        .collect();
    let footprint = backend.footprint_bytes()?;
    backend.close()?;

    let collections = if config.document_dir.is_dir() {
        let store = DocumentStore::load_dir(&config.document_dir)?;
        let mut collections = Vec::new();
        for name in store.collection_names()? {
            let count = store.count(&name)?;
            collections.push(json!({"collection": name, "documents": count}));
        }
        Some(collections)
    } else {
        None
    };

    write_response(json!({
        "relational": {
            "location": config.sqlite_path.display().to_string(),
            "tables": tables,
            "indexes": indexes,
            "footprint_bytes": footprint,
        },
        "document": collections.map(|c| json!({
            "dir": config.document_dir.display().to_string(),
            "collections": c,
        })),
    }))
}

/// Flattens the relational tables into the document store directory
pub fn migrate(config: &BenchConfig) -> CliResult<()> {
    let mut backend = SqliteBackend::open(&config.sqlite_path)?;
    let mut store = DocumentStore::new();
    let report = flatten(&backend, &mut store)?;
    backend.close()?;
    let written = store.save_dir(&config.document_dir)?;

    let mismatched: Vec<String> = report
        .iter()
        .filter(|t| !t.is_ok())
        .map(|t| t.table.clone())
        .collect();
    let tables: Vec<_> = report
        .iter()
        .map(|t| {
            json!({
                "table": t.table,
                "expected": t.expected,
                "copied": t.copied,
                "status": t.status(),
            })
        })
        .collect();
    write_response(json!({"documents_written": written, "tables": tables}))?;

    if mismatched.is_empty() {
        Ok(())
    } else {
        Err(CliError::migration_mismatch(&mismatched))
    }
}

/// Recreates the relational schema and loads a fixture into it
pub fn seed(config: &BenchConfig, fixture: &Path) -> CliResult<()> {
    let dataset = Dataset::from_json_file(fixture)?;
    let mut backend = SqliteBackend::create(&config.sqlite_path)?;
    create_schema(&backend)?;
    let rows = dataset.load_into(&mut backend)?;
    backend.close()?;
    write_response(json!({
        "database": config.sqlite_path.display().to_string(),
        "rows": rows,
    }))
}
