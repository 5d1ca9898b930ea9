//! Role → field name resolution from one sample document per collection

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

use super::roles::{collections, EmptyDefault, FieldRole};
use crate::document::DocumentBackend;
use crate::error::{EngineError, EngineResult};
use crate::observability::{log_event_with_fields, Event};

/// Resolved field names, built once per run
///
/// Roles that could not be resolved keep their failure; `get` returns it so
/// that only the computations using that role are affected.
#[derive(Debug, Clone, Default)]
pub struct ResolvedFields {
    names: BTreeMap<FieldRole, String>,
    failures: BTreeMap<FieldRole, EngineError>,
}

impl ResolvedFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a role explicitly, clearing any recorded failure
    pub fn with(mut self, role: FieldRole, field: impl Into<String>) -> Self {
        self.failures.remove(&role);
        self.names.insert(role, field.into());
        self
    }

    /// Field name for a role
    pub fn get(&self, role: FieldRole) -> EngineResult<&str> {
        if let Some(name) = self.names.get(&role) {
            return Ok(name.as_str());
        }
        Err(self.failures.get(&role).cloned().unwrap_or_else(|| {
            EngineError::schema(role.key(), role.collection(), "role was not resolved")
        }))
    }

    /// Field names for several roles, failing on the first unresolved one
    pub fn get_all<const N: usize>(&self, roles: [FieldRole; N]) -> EngineResult<[&str; N]> {
        let mut out = [""; N];
        for (slot, role) in out.iter_mut().zip(roles) {
            *slot = self.get(role)?;
        }
        Ok(out)
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.names.len() == FieldRole::ALL.len()
    }

    pub fn resolved_count(&self) -> usize {
        self.names.len()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&FieldRole, &EngineError)> {
        self.failures.iter()
    }

    fn fail(&mut self, role: FieldRole, reason: impl Into<String>) {
        self.failures
            .insert(role, EngineError::schema(role.key(), role.collection(), reason));
    }
}

/// Serialises as `{role: field}` with unresolved roles mapped to `null`
impl Serialize for ResolvedFields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FieldRole::ALL.len()))?;
        for role in FieldRole::ALL {
            map.serialize_entry(role.key(), &self.names.get(&role))?;
        }
        map.end()
    }
}

/// Builds a `ResolvedFields` table from sampled documents
pub struct SchemaResolver;

impl SchemaResolver {
    /// Samples each collection once and resolves every role.
    ///
    /// Transport failures are returned; unresolvable roles are recorded in
    /// the table and surface when a pipeline builder asks for them.
    pub fn resolve(backend: &dyn DocumentBackend) -> EngineResult<ResolvedFields> {
        let mut samples: BTreeMap<&str, Option<Value>> = BTreeMap::new();
        for collection in collections::SAMPLED {
            samples.insert(collection, backend.sample(collection)?);
        }

        let fields = Self::resolve_samples(&samples);
        let resolved = fields.resolved_count().to_string();
        let failed = fields.failures.len().to_string();
        log_event_with_fields(
            Event::SchemaResolved,
            &[("resolved", resolved.as_str()), ("failed", failed.as_str())],
        );
        Ok(fields)
    }

    /// Resolves every role and fails on the first unresolved one
    pub fn resolve_strict(backend: &dyn DocumentBackend) -> EngineResult<ResolvedFields> {
        let fields = Self::resolve(backend)?;
        if let Some((_, err)) = fields.failures().next() {
            return Err(err.clone());
        }
        Ok(fields)
    }

    fn resolve_samples(samples: &BTreeMap<&str, Option<Value>>) -> ResolvedFields {
        let mut fields = ResolvedFields::new();

        for role in FieldRole::ALL {
            let sample = samples.get(role.collection()).and_then(Option::as_ref);
            let Some(doc) = sample else {
                match role.empty_collection_default() {
                    Some(EmptyDefault::Name(name)) => {
                        fields.names.insert(role, name.to_string());
                    }
                    Some(EmptyDefault::Inherit(parent)) => match fields.names.get(&parent) {
                        Some(name) => {
                            let name = name.clone();
                            fields.names.insert(role, name);
                        }
                        None => fields.fail(role, format!("'{}' is unresolved", parent)),
                    },
                    None => fields.fail(role, "collection is empty"),
                }
                continue;
            };

            let inherited = role
                .inherits()
                .and_then(|parent| fields.names.get(&parent).cloned());
            let mut names: Vec<&str> = role.candidates().to_vec();
            names.extend(inherited.as_deref());
            let found = names
                .into_iter()
                .find(|candidate| doc.get(*candidate).is_some());

            match found {
                Some(name) => {
                    let name = name.to_string();
                    fields.names.insert(role, name);
                }
                None => fields.fail(
                    role,
                    format!("none of [{}] present", role.candidates().join(", ")),
                ),
            }
        }
        fields
    }
}
