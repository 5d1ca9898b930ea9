//! Benchmark report
//!
//! One row per computation with the outcome of each variant: relational
//! baseline, relational indexed and document. Rendered as a human table,
//! as delimited text through the `csv` writer, or as JSON.

use std::fmt::Write as _;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::catalogue::Computation;
use crate::error::{EngineError, EngineResult};
use crate::observability::{log_event_with_fields, Event, MetricsSnapshot};

/// Outcome of one computation variant
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VariantOutcome {
    /// Every invocation succeeded
    Completed { mean_ms: f64, rows: usize },
    /// A field role did not resolve
    Skipped { reason: String },
    /// A backend error; latency is not reported
    Failed { code: String, reason: String },
    /// The backend was not part of this run
    NotRun,
}

impl VariantOutcome {
    pub fn mean_ms(&self) -> Option<f64> {
        match self {
            VariantOutcome::Completed { mean_ms, .. } => Some(*mean_ms),
            _ => None,
        }
    }

    pub fn rows(&self) -> Option<usize> {
        match self {
            VariantOutcome::Completed { rows, .. } => Some(*rows),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, VariantOutcome::Completed { .. })
    }

    /// Latency cell text
    fn latency_cell(&self) -> String {
        match self {
            VariantOutcome::Completed { mean_ms, .. } => format!("{:.3}", mean_ms),
            VariantOutcome::Skipped { .. } => "SKIPPED".to_string(),
            VariantOutcome::Failed { .. } => "FAILED".to_string(),
            VariantOutcome::NotRun => "-".to_string(),
        }
    }

    fn rows_cell(&self) -> String {
        self.rows().map_or_else(|| "-".to_string(), |r| r.to_string())
    }

    fn note(&self) -> Option<String> {
        match self {
            VariantOutcome::Skipped { reason } => Some(reason.clone()),
            VariantOutcome::Failed { code, reason } => Some(format!("{}: {}", code, reason)),
            _ => None,
        }
    }
}

/// One line of the comparison table
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonRow {
    pub computation: Computation,
    pub label: &'static str,
    pub baseline: VariantOutcome,
    pub indexed: VariantOutcome,
    pub document: VariantOutcome,
    pub gain_percent: f64,
    /// CRC-32 of the baseline result set
    pub baseline_fingerprint: Option<u32>,
    /// CRC-32 of the indexed result set
    pub indexed_fingerprint: Option<u32>,
    /// The relational and document results are equivalent.
    /// `None` when either side did not complete.
    pub backends_agree: Option<bool>,
}

impl ComparisonRow {
    pub fn new(computation: Computation) -> Self {
        Self {
            computation,
            label: computation.label(),
            baseline: VariantOutcome::NotRun,
            indexed: VariantOutcome::NotRun,
            document: VariantOutcome::NotRun,
            gain_percent: 0.0,
            baseline_fingerprint: None,
            indexed_fingerprint: None,
            backends_agree: None,
        }
    }

    /// Adding indexes changed the relational result
    pub fn index_changed_result(&self) -> bool {
        match (self.baseline_fingerprint, self.indexed_fingerprint) {
            (Some(a), Some(b)) => a != b,
            _ => false,
        }
    }

    /// Baseline and indexed agree, and the document side agrees if it ran
    pub fn verified(&self) -> bool {
        !self.index_changed_result() && self.backends_agree != Some(false)
    }

    fn notes(&self) -> String {
        let mut notes = Vec::new();
        for (side, outcome) in [
            ("baseline", &self.baseline),
            ("indexed", &self.indexed),
            ("document", &self.document),
        ] {
            if let Some(note) = outcome.note() {
                notes.push(format!("{}: {}", side, note));
            }
        }
        if self.index_changed_result() {
            notes.push("indexed result differs from baseline".to_string());
        }
        if self.backends_agree == Some(false) {
            notes.push("document result differs from relational".to_string());
        }
        notes.join("; ")
    }
}

/// The full result of one benchmark run
#[derive(Debug, Clone, Serialize)]
pub struct BenchReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub repeats: u32,
    pub warmup: u32,
    /// Relational storage bytes with no secondary indexes
    pub footprint_baseline: u64,
    /// Relational storage bytes with the index set applied
    pub footprint_indexed: u64,
    pub rows: Vec<ComparisonRow>,
    pub metrics: MetricsSnapshot,
}

const HEADERS: [&str; 9] = [
    "computation",
    "baseline_ms",
    "indexed_ms",
    "document_ms",
    "rows_relational",
    "rows_document",
    "gain_percent",
    "verified",
    "notes",
];

impl BenchReport {
    pub fn new(repeats: u32, warmup: u32) -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4(),
            started_at: now,
            finished_at: now,
            repeats,
            warmup,
            footprint_baseline: 0,
            footprint_indexed: 0,
            rows: Vec::new(),
            metrics: MetricsSnapshot::default(),
        }
    }

    pub fn row(&self, computation: Computation) -> Option<&ComparisonRow> {
        self.rows.iter().find(|r| r.computation == computation)
    }

    /// Signed storage delta of the index set
    pub fn footprint_delta(&self) -> i64 {
        self.footprint_indexed as i64 - self.footprint_baseline as i64
    }

    fn cells(row: &ComparisonRow) -> [String; 9] {
        [
            row.label.to_string(),
            row.baseline.latency_cell(),
            row.indexed.latency_cell(),
            row.document.latency_cell(),
            row.baseline.rows_cell(),
            row.document.rows_cell(),
            format!("{:.1}", row.gain_percent),
            if row.verified() { "yes" } else { "no" }.to_string(),
            row.notes(),
        ]
    }

    /// Fixed-width table for the terminal
    pub fn render_table(&self) -> String {
        // notes are printed below the table
        let columns = HEADERS.len() - 1;
        let body: Vec<[String; 9]> = self.rows.iter().map(Self::cells).collect();

        let mut widths: Vec<usize> = HEADERS[..columns].iter().map(|h| h.len()).collect();
        for cells in &body {
            for (i, cell) in cells[..columns].iter().enumerate() {
                widths[i] = widths[i].max(cell.len());
            }
        }

        let mut out = String::new();
        let _ = writeln!(out, "run {} ({} repeats, {} warm-up)", self.run_id, self.repeats, self.warmup);
        let line = |out: &mut String, cells: &[&str]| {
            let padded: Vec<String> = cells
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(i, (cell, w))| {
                    if i == 0 {
                        format!("{:<w$}", cell, w = w)
                    } else {
                        format!("{:>w$}", cell, w = w)
                    }
                })
                .collect();
            let _ = writeln!(out, "{}", padded.join("  ").trim_end());
        };

        line(&mut out, &HEADERS[..columns]);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        let rule_refs: Vec<&str> = rule.iter().map(String::as_str).collect();
        line(&mut out, &rule_refs);
        for cells in &body {
            let refs: Vec<&str> = cells[..columns].iter().map(String::as_str).collect();
            line(&mut out, &refs);
        }

        let _ = writeln!(
            out,
            "\nstorage: {} bytes without indexes, {} bytes with indexes ({:+} bytes)",
            self.footprint_baseline,
            self.footprint_indexed,
            self.footprint_delta()
        );
        for (row, cells) in self.rows.iter().zip(&body) {
            if !cells[8].is_empty() {
                let _ = writeln!(out, "{}: {}", row.label, cells[8]);
            }
        }
        out
    }

    /// Writes a header line then one record per computation
    pub fn write_delimited<W: Write>(&self, writer: W, delimiter: u8) -> EngineResult<()> {
        let mut out = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(writer);
        out.write_record(HEADERS)?;
        for row in &self.rows {
            out.write_record(Self::cells(row))?;
        }
        out.flush()?;
        Ok(())
    }

    pub fn to_delimited(&self, delimiter: u8) -> EngineResult<String> {
        let mut buffer = Vec::new();
        self.write_delimited(&mut buffer, delimiter)?;
        String::from_utf8(buffer).map_err(|e| EngineError::Io(e.to_string()))
    }

    /// Writes the delimited table to a file, replacing it
    pub fn write_csv(&self, path: &Path, delimiter: u8) -> EngineResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path)?;
        self.write_delimited(file, delimiter)?;

        let path_str = path.display().to_string();
        let rows = self.rows.len().to_string();
        log_event_with_fields(
            Event::ReportWritten,
            &[("path", path_str.as_str()), ("rows", rows.as_str())],
        );
        Ok(())
    }

    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
