//! Relational query plan output
//!
//! Produces deterministic, human-readable plan output from SQLite's
//! `EXPLAIN QUERY PLAN`.

use std::fmt;

use serde::Serialize;

use super::{entry, Computation, Params};
use crate::error::EngineResult;
use crate::relational::RelationalBackend;

/// Plan of one relational computation
#[derive(Debug, Clone, Serialize)]
pub struct ExplainPlan {
    pub computation: Computation,
    /// `None` when the parameters short-circuit to an empty result
    pub sql: Option<String>,
    /// Plan steps, indented by depth
    pub steps: Vec<String>,
}

impl ExplainPlan {
    /// Whether any step reads through a secondary index
    pub fn uses_index(&self, name: &str) -> bool {
        self.steps.iter().any(|s| s.contains(name))
    }
}

/// Asks the backend how it would run a computation
pub fn explain(
    backend: &dyn RelationalBackend,
    computation: Computation,
    params: &Params,
) -> EngineResult<ExplainPlan> {
    let Some(stmt) = (entry(computation).relational)(params) else {
        return Ok(ExplainPlan {
            computation,
            sql: None,
            steps: Vec::new(),
        });
    };

    let rows = backend.query(&format!("EXPLAIN QUERY PLAN {}", stmt.sql), &stmt.params)?;

    // Rows reference their parent by id; depth is the parent chain length.
    let mut depths: Vec<(i64, usize)> = Vec::with_capacity(rows.len());
    let mut steps = Vec::with_capacity(rows.len());
    for row in &rows {
        let id = row.get("id").and_then(|v| v.as_i64()).unwrap_or(0);
        let parent = row.get("parent").and_then(|v| v.as_i64()).unwrap_or(0);
        let depth = depths
            .iter()
            .find(|(pid, _)| *pid == parent)
            .map_or(0, |(_, d)| d + 1);
        depths.push((id, depth));
        let detail = row
            .get("detail")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        steps.push(format!("{}{}", "  ".repeat(depth), detail));
    }

    Ok(ExplainPlan {
        computation,
        sql: Some(stmt.sql.trim().to_string()),
        steps,
    })
}

impl fmt::Display for ExplainPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== EXPLAIN {} ===", self.computation.label())?;
        match &self.sql {
            None => writeln!(f, "Status: SKIPPED (empty parameters)")?,
            Some(sql) => {
                writeln!(f, "Query:")?;
                for line in sql.lines() {
                    writeln!(f, "  {}", line)?;
                }
                writeln!(f, "Plan:")?;
                for step in &self.steps {
                    writeln!(f, "  - {}", step)?;
                }
            }
        }
        Ok(())
    }
}
