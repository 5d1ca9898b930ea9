//! Harness counters
//!
//! - Counters only
//! - Monotonic increase within a run
//! - Thread-safe but lock-minimal

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters maintained over one benchmark run
#[derive(Debug, Default)]
pub struct HarnessMetrics {
    /// Every backend invocation, warm-up included
    invocations: AtomicU64,
    /// Computation variants that completed their timed runs
    timed: AtomicU64,
    /// Variants skipped on schema resolution failure
    skipped: AtomicU64,
    /// Variants that failed on a backend error
    failed: AtomicU64,
    /// Transport retries issued by the adapter
    retries: AtomicU64,
}

impl HarnessMetrics {
    /// Create a registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_invocations(&self) {
        self.invocations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_timed(&self) {
        self.timed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_retries(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all counters as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            invocations: self.invocations.load(Ordering::Relaxed),
            timed: self.timed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
        }
    }

    /// Current counters as a JSON object
    pub fn to_json(&self) -> String {
        let s = self.snapshot();
        format!(
            r#"{{"invocations":{},"timed":{},"skipped":{},"failed":{},"retries":{}}}"#,
            s.invocations, s.timed, s.skipped, s.failed, s.retries
        )
    }
}

/// A point-in-time snapshot of the counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MetricsSnapshot {
    pub invocations: u64,
    pub timed: u64,
    pub skipped: u64,
    pub failed: u64,
    pub retries: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_has_zero_values() {
        let metrics = HarnessMetrics::new();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_increment_counters() {
        let metrics = HarnessMetrics::new();
        metrics.increment_invocations();
        metrics.increment_invocations();
        metrics.increment_timed();
        metrics.increment_skipped();
        metrics.increment_failed();
        metrics.increment_retries();

        let s = metrics.snapshot();
        assert_eq!(s.invocations, 2);
        assert_eq!(s.timed, 1);
        assert_eq!(s.skipped, 1);
        assert_eq!(s.failed, 1);
        assert_eq!(s.retries, 1);
    }

    #[test]
    fn test_to_json() {
        let metrics = HarnessMetrics::new();
        metrics.increment_timed();

        let parsed: serde_json::Value = serde_json::from_str(&metrics.to_json()).unwrap();
        assert_eq!(parsed["timed"], 1);
        assert_eq!(parsed["failed"], 0);
    }

    #[test]
    fn test_thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let metrics = Arc::new(HarnessMetrics::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let m = Arc::clone(&metrics);
                thread::spawn(move || {
                    for _ in 0..50 {
                        m.increment_invocations();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(metrics.snapshot().invocations, 200);
    }
}
