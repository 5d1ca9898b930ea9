//! Index Controller
//!
//! # API
//!
//! - `apply(set)` - create every index of the set that is absent
//! - `drop(set)` - remove every index of the set that is present
//! - `drop_all()` - remove every secondary index (baseline regime)
//! - `status(set)` - presence of each index
//! - `apply_document(store, fields, roles)` - hash indexes on resolved fields
//!
//! Both mutations are idempotent and report the storage footprint before
//! and after. They return only once the DDL has committed, so a timing that
//! starts afterwards never overlaps an index change.

use serde::Serialize;

use super::spec::IndexSpec;
use crate::document::DocumentBackend;
use crate::error::EngineResult;
use crate::observability::{log_event_with_fields, Event, Logger};
use crate::relational::RelationalBackend;
use crate::schema::{FieldRole, ResolvedFields};

/// Outcome of an apply or drop
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexChange {
    /// Indexes actually created or removed by this call
    pub changed: Vec<String>,
    /// Indexes that were already in the requested state
    pub unchanged: Vec<String>,
    pub footprint_before: u64,
    pub footprint_after: u64,
}

impl IndexChange {
    /// Signed byte delta
    pub fn delta_bytes(&self) -> i64 {
        self.footprint_after as i64 - self.footprint_before as i64
    }

    pub fn is_noop(&self) -> bool {
        self.changed.is_empty()
    }
}

/// Presence of one index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexStatus {
    pub name: String,
    pub table: String,
    pub present: bool,
}

/// Creates and drops relational secondary indexes
pub struct IndexController<'a> {
    backend: &'a dyn RelationalBackend,
}

impl<'a> IndexController<'a> {
    pub fn new(backend: &'a dyn RelationalBackend) -> Self {
        Self { backend }
    }

    /// Creates the absent indexes of `set`
    pub fn apply(&self, set: &[IndexSpec]) -> EngineResult<IndexChange> {
        self.mutate(set, true)
    }

    /// Drops the present indexes of `set`
    pub fn drop(&self, set: &[IndexSpec]) -> EngineResult<IndexChange> {
        self.mutate(set, false)
    }

    /// Drops every secondary index, leaving only primary-key structures
    pub fn drop_all(&self) -> EngineResult<IndexChange> {
        // Names come from the catalog and may need quoting
        let existing = self.present_names()?;

        let footprint_before = self.backend.footprint_bytes()?;
        let mut sql = String::from("BEGIN;\n");
        for name in &existing {
            sql.push_str(&format!("DROP INDEX IF EXISTS \"{}\";\n", name.replace('"', "\"\"")));
        }
        sql.push_str("COMMIT;");
        self.backend.execute_batch(&sql)?;

        let change = IndexChange {
            changed: existing,
            unchanged: Vec::new(),
            footprint_before,
            footprint_after: self.backend.footprint_bytes()?,
        };
        log_change(Event::IndexesDropped, &change);
        Ok(change)
    }

    pub fn status(&self, set: &[IndexSpec]) -> EngineResult<Vec<IndexStatus>> {
        let present = self.present_names()?;
        Ok(set
            .iter()
            .map(|spec| IndexStatus {
                name: spec.name.clone(),
                table: spec.table.clone(),
                present: present.contains(&spec.name),
            })
            .collect())
    }

    pub fn footprint(&self) -> EngineResult<u64> {
        self.backend.footprint_bytes()
    }

    fn present_names(&self) -> EngineResult<Vec<String>> {
        Ok(self
            .backend
            .indexes()?
            .into_iter()
            .map(|info| info.name)
            .collect())
    }

    fn mutate(&self, set: &[IndexSpec], create: bool) -> EngineResult<IndexChange> {
        // Validate everything before touching the schema
        for spec in set {
            spec.validate()?;
        }

        let present = self.present_names()?;
        let (changed, unchanged): (Vec<&IndexSpec>, Vec<&IndexSpec>) = set
            .iter()
            .partition(|spec| present.contains(&spec.name) != create);

        let footprint_before = self.backend.footprint_bytes()?;
        if !changed.is_empty() {
            let mut sql = String::from("BEGIN;\n");
            for spec in &changed {
                sql.push_str(&if create { spec.create_sql() } else { spec.drop_sql() });
                sql.push('\n');
            }
            sql.push_str("COMMIT;");
            self.backend.execute_batch(&sql)?;
        }

        let change = IndexChange {
            changed: changed.iter().map(|s| s.name.clone()).collect(),
            unchanged: unchanged.iter().map(|s| s.name.clone()).collect(),
            footprint_before,
            footprint_after: self.backend.footprint_bytes()?,
        };
        let event = if create {
            Event::IndexesApplied
        } else {
            Event::IndexesDropped
        };
        log_change(event, &change);
        Ok(change)
    }

    /// Builds hash indexes on the resolved fields of `roles`.
    ///
    /// Roles that did not resolve are skipped with a warning. Returns the
    /// number of indexes created.
    pub fn apply_document(
        store: &mut dyn DocumentBackend,
        fields: &ResolvedFields,
        roles: &[FieldRole],
    ) -> EngineResult<usize> {
        let mut created = 0;
        for role in roles {
            match fields.get(*role) {
                Ok(field) => {
                    if store.create_index(role.collection(), field)? {
                        created += 1;
                    }
                }
                Err(err) => {
                    let reason = err.to_string();
                    Logger::warn(
                        "DOCUMENT_INDEX_SKIPPED",
                        &[("role", role.key()), ("reason", reason.as_str())],
                    );
                }
            }
        }
        let count = created.to_string();
        log_event_with_fields(
            Event::IndexesApplied,
            &[("backend", store.name()), ("created", count.as_str())],
        );
        Ok(created)
    }
}

fn log_change(event: Event, change: &IndexChange) {
    let changed = change.changed.join(",");
    let before = change.footprint_before.to_string();
    let after = change.footprint_after.to_string();
    log_event_with_fields(
        event,
        &[
            ("indexes", changed.as_str()),
            ("footprint_before", before.as_str()),
            ("footprint_after", after.as_str()),
        ],
    );
}

/// Roles hash-indexed in the document store before timing
pub fn default_document_roles() -> Vec<FieldRole> {
    vec![
        FieldRole::MovieId,
        FieldRole::PersonId,
        FieldRole::Genre,
        FieldRole::RatingsMovieId,
        FieldRole::GenresMovieId,
        FieldRole::PrincipalsPersonId,
        FieldRole::PrincipalsMovieId,
        FieldRole::CharactersMovieId,
        FieldRole::DirectorsMovieId,
    ]
}
