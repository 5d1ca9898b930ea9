//! Execution Adapter
//!
//! Uniform entry point: run a named computation against one backend and
//! return fully materialised records. Dispatch is a table lookup into the
//! catalogue; the adapter never mutates backend state.
//!
//! Transport failures (`CINE_BACKEND_UNAVAILABLE`) may be retried a bounded
//! number of times. The default is no retry.

use serde::{Deserialize, Serialize};

use crate::catalogue::{self, Computation, Params};
use crate::document::DocumentBackend;
use crate::error::EngineResult;
use crate::observability::{log_event_with_fields, Event, HarnessMetrics};
use crate::record::Record;
use crate::relational::RelationalBackend;
use crate::schema::ResolvedFields;

/// Which side of the comparison a handle belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Relational,
    Document,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Relational => "relational",
            BackendKind::Document => "document",
        }
    }
}

/// A borrowed backend handle ready for dispatch
///
/// The document side carries the resolved field table its pipelines are
/// generated from.
#[derive(Clone, Copy)]
pub enum BackendHandle<'a> {
    Relational(&'a dyn RelationalBackend),
    Document {
        store: &'a dyn DocumentBackend,
        fields: &'a ResolvedFields,
    },
}

impl<'a> BackendHandle<'a> {
    pub fn kind(&self) -> BackendKind {
        match self {
            BackendHandle::Relational(_) => BackendKind::Relational,
            BackendHandle::Document { .. } => BackendKind::Document,
        }
    }

    /// Backend identity for errors and logs
    pub fn name(&self) -> &str {
        match self {
            BackendHandle::Relational(backend) => backend.name(),
            BackendHandle::Document { store, .. } => store.name(),
        }
    }
}

/// Runs catalogue computations
#[derive(Default)]
pub struct ExecutionAdapter<'m> {
    retry_attempts: u32,
    metrics: Option<&'m HarnessMetrics>,
}

impl<'m> ExecutionAdapter<'m> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retries transport failures up to `attempts` extra times
    pub fn with_retries(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    pub fn with_metrics(mut self, metrics: &'m HarnessMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Runs a computation by name.
    ///
    /// An unknown name fails with `UnknownComputation` before the backend is
    /// touched.
    pub fn run(
        &self,
        name: &str,
        backend: BackendHandle<'_>,
        params: &Params,
    ) -> EngineResult<Vec<Record>> {
        let computation: Computation = name.parse()?;
        self.run_computation(computation, backend, params)
    }

    /// Runs a computation and materialises every record
    pub fn run_computation(
        &self,
        computation: Computation,
        backend: BackendHandle<'_>,
        params: &Params,
    ) -> EngineResult<Vec<Record>> {
        let mut attempt = 0;
        loop {
            if let Some(metrics) = self.metrics {
                metrics.increment_invocations();
            }
            match dispatch(computation, backend, params) {
                Ok(records) => return Ok(records),
                Err(err) if err.is_transport() && attempt < self.retry_attempts => {
                    attempt += 1;
                    if let Some(metrics) = self.metrics {
                        metrics.increment_retries();
                    }
                    let attempt_str = attempt.to_string();
                    let reason = err.to_string();
                    log_event_with_fields(
                        Event::ComputationRetried,
                        &[
                            ("computation", computation.label()),
                            ("backend", backend.name()),
                            ("attempt", attempt_str.as_str()),
                            ("reason", reason.as_str()),
                        ],
                    );
                }
                Err(err) => return Err(err.with_computation(computation.label())),
            }
        }
    }
}

fn dispatch(
    computation: Computation,
    backend: BackendHandle<'_>,
    params: &Params,
) -> EngineResult<Vec<Record>> {
    let entry = catalogue::entry(computation);
    match backend {
        BackendHandle::Relational(handle) => match (entry.relational)(params) {
            Some(stmt) => handle.query(stmt.sql, &stmt.params),
            None => Ok(Vec::new()),
        },
        BackendHandle::Document { store, fields } => match (entry.document)(store, fields, params)? {
            Some(pipeline) => Ok(store
                .aggregate(&pipeline)?
                .iter()
                .map(Record::from_document)
                .collect()),
            None => Ok(Vec::new()),
        },
    }
}
