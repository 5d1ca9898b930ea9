//! Latency measurement

use crate::adapter::{BackendHandle, ExecutionAdapter};
use crate::catalogue::{Computation, Params};
use crate::error::EngineResult;
use crate::observability::Timer;
use crate::record::Record;

/// Mean latency of the timed invocations and the last result obtained
#[derive(Debug, Clone)]
pub struct Timing {
    pub mean_ms: f64,
    pub runs: u32,
    pub records: Vec<Record>,
}

impl Timing {
    pub fn rows(&self) -> usize {
        self.records.len()
    }
}

/// Runs `warmup` untimed invocations, then `repeats` timed ones.
///
/// A repeat count of zero is treated as one. The invocation returns a
/// materialised `Vec`, so the whole result is produced inside the timed
/// window. Any failure aborts the measurement.
pub fn time_invocations<F>(mut invoke: F, warmup: u32, repeats: u32) -> EngineResult<Timing>
where
    F: FnMut() -> EngineResult<Vec<Record>>,
{
    for _ in 0..warmup {
        invoke()?;
    }

    let runs = repeats.max(1);
    let mut total_ms = 0.0;
    let mut records = Vec::new();
    for _ in 0..runs {
        let timer = Timer::new();
        records = invoke()?;
        total_ms += timer.elapsed_ms();
    }

    Ok(Timing {
        mean_ms: total_ms / runs as f64,
        runs,
        records,
    })
}

/// Times one catalogue computation through the adapter
pub fn time_computation(
    adapter: &ExecutionAdapter<'_>,
    computation: Computation,
    backend: BackendHandle<'_>,
    params: &Params,
    warmup: u32,
    repeats: u32,
) -> EngineResult<Timing> {
    time_invocations(
        || adapter.run_computation(computation, backend, params),
        warmup,
        repeats,
    )
}

/// Relative gain `(baseline - indexed) / baseline * 100`.
///
/// Zero when the baseline is not positive or the computation returned no
/// rows.
pub fn gain_percent(baseline_ms: f64, indexed_ms: f64, rows: usize) -> f64 {
    if rows == 0 || !(baseline_ms > 0.0) || !indexed_ms.is_finite() {
        return 0.0;
    }
    (baseline_ms - indexed_ms) / baseline_ms * 100.0
}
