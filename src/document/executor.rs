//! Pipeline executor
//!
//! Runs a pipeline stage by stage over fully materialised document vectors.
//! Index use:
//! - a leading `match` with an equality or `in` predicate on an indexed field
//!   reads only the matching positions
//! - a `lookup` probes the foreign collection's index on any join field,
//!   otherwise it scans the foreign collection for every input document

use std::collections::HashMap;

use serde_json::{Map, Value};

use super::expr::{truthy, AccumulatorState};
use super::filters::{FilterOp, Predicate, PredicateFilter};
use super::get_path;
use super::index::{IndexKey, Position};
use super::pipeline::{Group, Lookup, Pipeline, Stage, Unwind};
use super::sorter::DocumentSorter;
use super::store::{Collection, DocumentStore};

/// Executes pipelines against one store
pub struct PipelineExecutor<'a> {
    store: &'a DocumentStore,
}

impl<'a> PipelineExecutor<'a> {
    pub fn new(store: &'a DocumentStore) -> Self {
        Self { store }
    }

    /// Runs the pipeline. A missing source collection yields no documents.
    pub fn execute(&self, pipeline: &Pipeline) -> Vec<Value> {
        let source = match self.store.collection(pipeline.collection()) {
            Some(c) => c,
            None => return Vec::new(),
        };

        let mut stages = pipeline.stages();
        let mut docs = match stages.first() {
            Some(Stage::Match(predicates)) => {
                stages = &stages[1..];
                Self::initial_match(source, predicates)
            }
            _ => source.documents().to_vec(),
        };

        for stage in stages {
            docs = self.apply(stage, docs);
        }
        docs
    }

    fn initial_match(source: &Collection, predicates: &[Predicate]) -> Vec<Value> {
        let positions = predicates
            .iter()
            .find_map(|pred| Self::index_positions(source, pred));

        match positions {
            Some(positions) => positions
                .into_iter()
                .map(|p| &source.documents()[p])
                .filter(|doc| PredicateFilter::matches(doc, predicates))
                .cloned()
                .collect(),
            None => source
                .documents()
                .iter()
                .filter(|doc| PredicateFilter::matches(doc, predicates))
                .cloned()
                .collect(),
        }
    }

    /// Candidate positions from an index, in collection order
    fn index_positions(source: &Collection, pred: &Predicate) -> Option<Vec<Position>> {
        if !pred.op.is_equality() {
            return None;
        }
        let index = source.index(&pred.field)?;
        let values: Vec<&Value> = match &pred.op {
            FilterOp::Eq(v) => vec![v],
            FilterOp::In(vs) => vs.iter().collect(),
            _ => return None,
        };
        let mut positions: Vec<Position> = values
            .into_iter()
            .filter_map(IndexKey::from_json)
            .flat_map(|key| index.lookup_eq(&key).iter().copied())
            .collect();
        positions.sort_unstable();
        positions.dedup();
        Some(positions)
    }

    fn apply(&self, stage: &Stage, mut docs: Vec<Value>) -> Vec<Value> {
        match stage {
            Stage::Match(predicates) => {
                docs.retain(|doc| PredicateFilter::matches(doc, predicates));
                docs
            }
            Stage::MatchExpr(expr) => {
                docs.retain(|doc| truthy(&expr.eval(doc)));
                docs
            }
            Stage::Lookup(lookup) => self.lookup(lookup, docs),
            Stage::Unwind(unwind) => Self::unwind(unwind, docs),
            Stage::Group(group) => Self::group(group, docs),
            Stage::Project(fields) => docs
                .iter()
                .map(|doc| {
                    let mut out = Map::new();
                    for (name, expr) in fields {
                        out.insert(name.clone(), expr.eval(doc));
                    }
                    Value::Object(out)
                })
                .collect(),
            Stage::AddFields(fields) => {
                for doc in docs.iter_mut() {
                    let computed: Vec<(String, Value)> = fields
                        .iter()
                        .map(|(name, expr)| (name.clone(), expr.eval(doc)))
                        .collect();
                    if let Some(obj) = doc.as_object_mut() {
                        obj.extend(computed);
                    }
                }
                docs
            }
            Stage::Sort(keys) => {
                DocumentSorter::sort(&mut docs, keys);
                docs
            }
            Stage::Limit(n) => {
                docs.truncate(*n);
                docs
            }
        }
    }

    fn lookup(&self, lookup: &Lookup, mut docs: Vec<Value>) -> Vec<Value> {
        let foreign = self.store.collection(&lookup.from);
        for doc in docs.iter_mut() {
            let matches = match foreign {
                Some(coll) => Self::join_matches(coll, lookup, doc),
                None => Vec::new(),
            };
            if let Some(obj) = doc.as_object_mut() {
                obj.insert(lookup.as_field.clone(), Value::Array(matches));
            }
        }
        docs
    }

    fn join_matches(foreign: &Collection, lookup: &Lookup, doc: &Value) -> Vec<Value> {
        let mut keys = Vec::with_capacity(lookup.on.len());
        for (local, foreign_field) in &lookup.on {
            match get_path(doc, local).and_then(IndexKey::from_json) {
                Some(key) => keys.push((foreign_field.as_str(), key)),
                None => return Vec::new(),
            }
        }

        let all_match = |candidate: &Value| {
            keys.iter().all(|(field, key)| {
                get_path(candidate, field).and_then(IndexKey::from_json).as_ref() == Some(key)
            })
        };

        let probe = keys
            .iter()
            .find_map(|(field, key)| foreign.index(field).map(|index| index.lookup_eq(key)));

        match probe {
            Some(positions) => positions
                .iter()
                .map(|p| &foreign.documents()[*p])
                .filter(|candidate| all_match(candidate))
                .cloned()
                .collect(),
            None => foreign
                .documents()
                .iter()
                .filter(|candidate| all_match(candidate))
                .cloned()
                .collect(),
        }
    }

    fn unwind(unwind: &Unwind, docs: Vec<Value>) -> Vec<Value> {
        let mut out = Vec::with_capacity(docs.len());
        for mut doc in docs {
            let Some(obj) = doc.as_object_mut() else {
                continue;
            };
            match obj.remove(&unwind.path) {
                Some(Value::Array(items)) if !items.is_empty() => {
                    for (i, item) in items.into_iter().enumerate() {
                        let mut copy = obj.clone();
                        copy.insert(unwind.path.clone(), item);
                        if let Some(index_field) = &unwind.index_field {
                            copy.insert(index_field.clone(), Value::from(i as i64));
                        }
                        out.push(Value::Object(copy));
                    }
                }
                Some(Value::Array(_)) | Some(Value::Null) | None => {
                    if unwind.preserve_empty {
                        if let Some(index_field) = &unwind.index_field {
                            obj.insert(index_field.clone(), Value::Null);
                        }
                        out.push(doc);
                    }
                }
                Some(scalar) => {
                    obj.insert(unwind.path.clone(), scalar);
                    if let Some(index_field) = &unwind.index_field {
                        obj.insert(index_field.clone(), Value::Null);
                    }
                    out.push(doc);
                }
            }
        }
        out
    }

    /// Groups in first-seen order
    fn group(group: &Group, docs: Vec<Value>) -> Vec<Value> {
        let mut slots: HashMap<Vec<Option<IndexKey>>, usize> = HashMap::new();
        let mut groups: Vec<(Map<String, Value>, Vec<AccumulatorState>)> = Vec::new();

        for doc in &docs {
            let key_values: Vec<(String, Value)> = group
                .keys
                .iter()
                .map(|(name, expr)| (name.clone(), expr.eval(doc)))
                .collect();
            let hash_key: Vec<Option<IndexKey>> = key_values
                .iter()
                .map(|(_, v)| IndexKey::group_key(Some(v)))
                .collect();

            let slot = *slots.entry(hash_key).or_insert_with(|| {
                let states = group.accumulators.iter().map(|(_, a)| a.start()).collect();
                groups.push((key_values.into_iter().collect(), states));
                groups.len() - 1
            });

            let states = &mut groups[slot].1;
            for ((_, accumulator), state) in group.accumulators.iter().zip(states.iter_mut()) {
                accumulator.fold(state, doc);
            }
        }

        groups
            .into_iter()
            .map(|(id, states)| {
                let mut out = Map::new();
                out.insert("_id".to_string(), Value::Object(id));
                for ((name, _), state) in group.accumulators.iter().zip(states) {
                    out.insert(name.clone(), state.finish());
                }
                Value::Object(out)
            })
            .collect()
    }
}
