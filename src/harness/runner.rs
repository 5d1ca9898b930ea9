//! Benchmark runner
//!
//! Phases, strictly sequential:
//! 1. drop every relational secondary index, record the footprint
//! 2. time each computation on the relational backend (baseline)
//! 3. apply the index set, record the footprint
//! 4. time each computation again (indexed)
//! 5. resolve document fields, build document indexes, time each
//!    computation on the document store
//!
//! Index changes complete before the timings that follow them begin. A
//! failing computation is annotated in the report and the run moves on.

use chrono::Utc;

use super::report::{BenchReport, ComparisonRow, VariantOutcome};
use super::session::BenchSession;
use super::timing::{gain_percent, time_computation};
use crate::adapter::{BackendHandle, ExecutionAdapter};
use crate::catalogue::{Computation, Params};
use crate::config::BenchConfig;
use crate::document::DocumentStore;
use crate::error::{EngineError, EngineResult};
use crate::index::{IndexController, IndexSpec};
use crate::observability::{log_event_with_fields, Event, HarnessMetrics, ObservationScope};
use crate::record::{fingerprint, records_equivalent, Record, FLOAT_TOLERANCE};
use crate::schema::{FieldRole, SchemaResolver};

/// What one run measures
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub computations: Vec<Computation>,
    pub params: Params,
    pub repeats: u32,
    pub warmup: u32,
    pub retry_attempts: u32,
    pub indexes: Vec<IndexSpec>,
    pub document_indexes: Vec<FieldRole>,
}

impl RunPlan {
    pub fn from_config(config: &BenchConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self {
            computations: config.selected_computations()?,
            params: config.params.clone(),
            repeats: config.repeats,
            warmup: config.warmup,
            retry_attempts: config.retry_attempts,
            indexes: config.indexes.clone(),
            document_indexes: config.document_indexes.clone(),
        })
    }
}

type Measured = (VariantOutcome, Option<Vec<Record>>);

pub struct BenchRunner {
    plan: RunPlan,
    metrics: HarnessMetrics,
}

impl BenchRunner {
    pub fn new(plan: RunPlan) -> Self {
        Self {
            plan,
            metrics: HarnessMetrics::new(),
        }
    }

    pub fn plan(&self) -> &RunPlan {
        &self.plan
    }

    pub fn metrics(&self) -> &HarnessMetrics {
        &self.metrics
    }

    /// Runs every phase against the session's backends.
    ///
    /// Fails only when an index change fails or a fatal error occurs;
    /// per-computation failures are recorded in the report.
    pub fn run(&self, session: &mut BenchSession) -> EngineResult<BenchReport> {
        let plan = &self.plan;
        let mut report = BenchReport::new(plan.repeats, plan.warmup);
        let run_id = report.run_id.to_string();
        let count = plan.computations.len().to_string();
        log_event_with_fields(
            Event::RunBegin,
            &[("run_id", run_id.as_str()), ("computations", count.as_str())],
        );

        let adapter = ExecutionAdapter::new()
            .with_retries(plan.retry_attempts)
            .with_metrics(&self.metrics);
        let mut rows: Vec<ComparisonRow> =
            plan.computations.iter().copied().map(ComparisonRow::new).collect();

        let (relational, document) = session.split_mut();
        let controller = IndexController::new(relational);

        // Baseline
        let scope = ObservationScope::with_fields("BASELINE_PHASE", &[("run_id", run_id.as_str())]);
        report.footprint_baseline = match controller.drop_all() {
            Ok(change) => change.footprint_after,
            Err(err) => {
                scope.fail(&err.to_string());
                return Err(err);
            }
        };
        let mut baseline_records = Vec::with_capacity(rows.len());
        for row in rows.iter_mut() {
            let (outcome, records) =
                self.measure(&adapter, row.computation, BackendHandle::Relational(relational), "baseline")?;
            row.baseline = outcome;
            row.baseline_fingerprint = records.as_deref().map(fingerprint);
            baseline_records.push(records);
        }
        let footprint = report.footprint_baseline.to_string();
        scope.complete_with_fields(&[("footprint_bytes", footprint.as_str())]);

        // Indexed
        let scope = ObservationScope::with_fields("INDEXED_PHASE", &[("run_id", run_id.as_str())]);
        report.footprint_indexed = match controller.apply(&plan.indexes) {
            Ok(change) => change.footprint_after,
            Err(err) => {
                scope.fail(&err.to_string());
                return Err(err);
            }
        };
        for row in rows.iter_mut() {
            let (outcome, records) =
                self.measure(&adapter, row.computation, BackendHandle::Relational(relational), "indexed")?;
            row.indexed = outcome;
            row.indexed_fingerprint = records.as_deref().map(fingerprint);
            if let (Some(baseline_ms), Some(indexed_ms), Some(n)) = (
                row.baseline.mean_ms(),
                row.indexed.mean_ms(),
                row.baseline.rows(),
            ) {
                row.gain_percent = gain_percent(baseline_ms, indexed_ms, n);
            }
        }
        let footprint = report.footprint_indexed.to_string();
        scope.complete_with_fields(&[("footprint_bytes", footprint.as_str())]);

        // Document
        if let Some(store) = document {
            let scope = ObservationScope::with_fields("DOCUMENT_PHASE", &[("run_id", run_id.as_str())]);
            if let Err(err) = self.run_document(store, &adapter, &mut rows, &baseline_records) {
                scope.fail(&err.to_string());
                return Err(err);
            }
            scope.complete();
        }

        report.rows = rows;
        report.finished_at = Utc::now();
        report.metrics = self.metrics.snapshot();

        let metrics = self.metrics.to_json();
        log_event_with_fields(
            Event::RunComplete,
            &[("run_id", run_id.as_str()), ("metrics", metrics.as_str())],
        );
        Ok(report)
    }

    fn run_document(
        &self,
        store: &mut DocumentStore,
        adapter: &ExecutionAdapter<'_>,
        rows: &mut [ComparisonRow],
        baseline_records: &[Option<Vec<Record>>],
    ) -> EngineResult<()> {
        let fields = match SchemaResolver::resolve(&*store) {
            Ok(fields) => fields,
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                // The store itself is unusable; every document variant fails
                for row in rows.iter_mut() {
                    row.document = self.record_failure(row.computation, "document", &err);
                }
                return Ok(());
            }
        };
        IndexController::apply_document(&mut *store, &fields, &self.plan.document_indexes)?;

        let store: &DocumentStore = store;
        for (row, baseline) in rows.iter_mut().zip(baseline_records) {
            let handle = BackendHandle::Document {
                store,
                fields: &fields,
            };
            let (outcome, records) = self.measure(adapter, row.computation, handle, "document")?;
            row.document = outcome;
            row.backends_agree = match (baseline, &records) {
                (Some(relational), Some(document)) => {
                    Some(records_equivalent(relational, document, FLOAT_TOLERANCE))
                }
                _ => None,
            };
        }
        Ok(())
    }

    /// Times one variant and classifies the outcome
    fn measure(
        &self,
        adapter: &ExecutionAdapter<'_>,
        computation: Computation,
        handle: BackendHandle<'_>,
        variant: &str,
    ) -> EngineResult<Measured> {
        let plan = &self.plan;
        match time_computation(adapter, computation, handle, &plan.params, plan.warmup, plan.repeats) {
            Ok(timing) => {
                self.metrics.increment_timed();
                let mean = format!("{:.3}", timing.mean_ms);
                let rows = timing.rows().to_string();
                log_event_with_fields(
                    Event::ComputationTimed,
                    &[
                        ("computation", computation.label()),
                        ("variant", variant),
                        ("mean_ms", mean.as_str()),
                        ("rows", rows.as_str()),
                    ],
                );
                Ok((
                    VariantOutcome::Completed {
                        mean_ms: timing.mean_ms,
                        rows: timing.rows(),
                    },
                    Some(timing.records),
                ))
            }
            Err(err) if err.is_fatal() => Err(err),
            Err(err) if err.is_schema_resolution() => {
                self.metrics.increment_skipped();
                let reason = err.to_string();
                log_event_with_fields(
                    Event::ComputationSkipped,
                    &[
                        ("computation", computation.label()),
                        ("variant", variant),
                        ("reason", reason.as_str()),
                    ],
                );
                Ok((VariantOutcome::Skipped { reason }, None))
            }
            Err(err) => Ok((self.record_failure(computation, variant, &err), None)),
        }
    }

    fn record_failure(&self, computation: Computation, variant: &str, err: &EngineError) -> VariantOutcome {
        self.metrics.increment_failed();
        let reason = err.to_string();
        log_event_with_fields(
            Event::ComputationFailed,
            &[
                ("computation", computation.label()),
                ("variant", variant),
                ("code", err.code()),
                ("reason", reason.as_str()),
            ],
        );
        VariantOutcome::Failed {
            code: err.code().to_string(),
            reason,
        }
    }
}

/// Opens a session from `config`, runs the plan and releases the backends
pub fn run_benchmark(config: &BenchConfig) -> EngineResult<BenchReport> {
    let runner = BenchRunner::new(RunPlan::from_config(config)?);
    let mut session = BenchSession::open(config)?;
    let report = runner.run(&mut session)?;
    session.close()?;

    if let Some(path) = &config.report_csv {
        report.write_csv(path, config.delimiter()?)?;
    }
    Ok(report)
}
