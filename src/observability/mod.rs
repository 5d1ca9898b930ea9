//! Harness observability
//!
//! Everything here writes to stderr and never feeds back into a
//! measurement: logging a computation cannot change its timing samples
//! beyond the cost of the write itself, which happens outside the timer.
//!
//! - [`Logger`]: one JSON object per line
//! - [`Event`]: the closed set of lifecycle events
//! - [`ObservationScope`]: `_BEGIN` / `_COMPLETE` brackets around a phase
//! - [`HarnessMetrics`]: counters surfaced in the report
//!
//! ```ignore
//! use cinebench::observability::{log_event_with_fields, Event, ObservationScope};
//!
//! let scope = ObservationScope::new("INDEXED_PHASE");
//! log_event_with_fields(Event::ComputationTimed, &[("computation", "Q2_topN")]);
//! scope.complete();
//! ```

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{HarnessMetrics, MetricsSnapshot};
pub use scope::{ObservationScope, Timer};

/// Emit `event` at the severity it carries
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_bracket_events() {
        log_event(Event::RunBegin);
        log_event_with_fields(Event::ComputationSkipped, &[("computation", "Q5_popular")]);
        log_event(Event::RunComplete);
    }

    #[test]
    fn test_config_event_carries_path() {
        log_event_with_fields(Event::ConfigLoaded, &[("path", "/tmp/cinebench.json")]);
    }
}
