//! Phase scopes and wall-clock timing
//!
//! A harness phase logs `{PHASE}_BEGIN` when opened and exactly one of
//! `{PHASE}_COMPLETE`, `{PHASE}_FAILED` or `{PHASE}_INCOMPLETE` when it ends.

use std::time::Instant;

use super::logger::{Logger, Severity};

/// One bracketed harness phase
///
/// ```ignore
/// let scope = ObservationScope::new("INDEXED_PHASE");
/// controller.apply(&set)?;
/// scope.complete(); // INDEXED_PHASE_COMPLETE with elapsed_ms
/// ```
pub struct ObservationScope {
    phase: String,
    context: Vec<(String, String)>,
    timer: Timer,
    closed: bool,
}

impl ObservationScope {
    /// Open a phase with no context fields
    pub fn new(phase: &str) -> Self {
        Self::with_fields(phase, &[])
    }

    /// Open a phase; `fields` are repeated on the closing line
    pub fn with_fields(phase: &str, fields: &[(&str, &str)]) -> Self {
        Logger::info(&format!("{}_BEGIN", phase), fields);
        Self {
            phase: phase.to_string(),
            context: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            timer: Timer::new(),
            closed: false,
        }
    }

    pub fn complete(self) {
        self.complete_with_fields(&[]);
    }

    /// Close the phase successfully. `elapsed_ms` is always appended.
    pub fn complete_with_fields(mut self, extra: &[(&str, &str)]) {
        let elapsed = format!("{:.3}", self.timer.elapsed_ms());
        let mut tail = extra.to_vec();
        tail.push(("elapsed_ms", elapsed.as_str()));
        self.close(Severity::Info, "COMPLETE", &tail);
    }

    /// Close the phase with the error that ended it
    pub fn fail(mut self, reason: &str) {
        self.close(Severity::Error, "FAILED", &[("reason", reason)]);
    }

    pub fn is_completed(&self) -> bool {
        self.closed
    }

    pub fn phase(&self) -> &str {
        &self.phase
    }

    fn close(&mut self, severity: Severity, outcome: &str, tail: &[(&str, &str)]) {
        self.closed = true;
        let mut fields: Vec<(&str, &str)> = self
            .context
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        fields.extend_from_slice(tail);
        Logger::log(severity, &format!("{}_{}", self.phase, outcome), &fields);
    }
}

impl Drop for ObservationScope {
    fn drop(&mut self) {
        if !self.closed {
            self.close(
                Severity::Warn,
                "INCOMPLETE",
                &[("reason", "phase ended without complete or fail")],
            );
        }
    }
}

/// Monotonic wall-clock timer
#[derive(Debug, Clone, Copy)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Milliseconds since construction, fractional
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
