//! Typed aggregation pipeline description
//!
//! A pipeline is an immutable sequence of tagged stages built once from a
//! resolved field table. Field names arrive as plain strings; nothing here
//! splices query text.

use std::fmt;

use super::expr::{Accumulator, Expr};
use super::filters::Predicate;
use super::sorter::SortKey;

/// Equality join against a foreign collection
#[derive(Debug, Clone)]
pub struct Lookup {
    /// Foreign collection name
    pub from: String,
    /// (local path, foreign field) pairs; all must be equal
    pub on: Vec<(String, String)>,
    /// Output array field
    pub as_field: String,
}

/// Array flattening
#[derive(Debug, Clone)]
pub struct Unwind {
    pub path: String,
    /// Keep documents whose array is empty or missing
    pub preserve_empty: bool,
    /// Store each element's position in this field
    pub index_field: Option<String>,
}

/// Grouping by a set of named keys
///
/// The output `_id` is an object holding each key by name.
#[derive(Debug, Clone)]
pub struct Group {
    pub keys: Vec<(String, Expr)>,
    pub accumulators: Vec<(String, Accumulator)>,
}

/// One pipeline stage
#[derive(Debug, Clone)]
pub enum Stage {
    Match(Vec<Predicate>),
    /// Keep documents for which the expression is truthy
    MatchExpr(Expr),
    Lookup(Lookup),
    Unwind(Unwind),
    Group(Group),
    /// Replace each document with exactly these fields
    Project(Vec<(String, Expr)>),
    /// Add or overwrite top-level fields
    AddFields(Vec<(String, Expr)>),
    Sort(Vec<SortKey>),
    Limit(usize),
}

impl Stage {
    /// Stage name for explain output
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Match(_) => "match",
            Stage::MatchExpr(_) => "match_expr",
            Stage::Lookup(_) => "lookup",
            Stage::Unwind(_) => "unwind",
            Stage::Group(_) => "group",
            Stage::Project(_) => "project",
            Stage::AddFields(_) => "add_fields",
            Stage::Sort(_) => "sort",
            Stage::Limit(_) => "limit",
        }
    }
}

/// A complete pipeline over one source collection
#[derive(Debug, Clone)]
pub struct Pipeline {
    collection: String,
    stages: Vec<Stage>,
}

impl Pipeline {
    /// Starts an empty pipeline over `collection`
    pub fn over(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            stages: Vec::new(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn matching(self, predicates: Vec<Predicate>) -> Self {
        self.stage(Stage::Match(predicates))
    }

    pub fn matching_expr(self, expr: Expr) -> Self {
        self.stage(Stage::MatchExpr(expr))
    }

    /// Single-key lookup
    pub fn lookup(self, from: &str, local: &str, foreign: &str, as_field: &str) -> Self {
        self.lookup_on(from, &[(local, foreign)], as_field)
    }

    /// Multi-key lookup
    pub fn lookup_on(self, from: &str, on: &[(&str, &str)], as_field: &str) -> Self {
        self.stage(Stage::Lookup(Lookup {
            from: from.to_string(),
            on: on
                .iter()
                .map(|(l, f)| (l.to_string(), f.to_string()))
                .collect(),
            as_field: as_field.to_string(),
        }))
    }

    /// Inner unwind: drops documents with an empty array
    pub fn unwind(self, path: &str) -> Self {
        self.stage(Stage::Unwind(Unwind {
            path: path.to_string(),
            preserve_empty: false,
            index_field: None,
        }))
    }

    /// Outer unwind: keeps documents with an empty array
    pub fn unwind_preserving(self, path: &str) -> Self {
        self.stage(Stage::Unwind(Unwind {
            path: path.to_string(),
            preserve_empty: true,
            index_field: None,
        }))
    }

    /// Inner unwind recording element positions
    pub fn unwind_indexed(self, path: &str, index_field: &str) -> Self {
        self.stage(Stage::Unwind(Unwind {
            path: path.to_string(),
            preserve_empty: false,
            index_field: Some(index_field.to_string()),
        }))
    }

    pub fn group(self, keys: Vec<(&str, Expr)>, accumulators: Vec<(&str, Accumulator)>) -> Self {
        self.stage(Stage::Group(Group {
            keys: keys.into_iter().map(|(k, e)| (k.to_string(), e)).collect(),
            accumulators: accumulators
                .into_iter()
                .map(|(k, a)| (k.to_string(), a))
                .collect(),
        }))
    }

    pub fn project(self, fields: Vec<(&str, Expr)>) -> Self {
        self.stage(Stage::Project(
            fields.into_iter().map(|(k, e)| (k.to_string(), e)).collect(),
        ))
    }

    pub fn add_fields(self, fields: Vec<(&str, Expr)>) -> Self {
        self.stage(Stage::AddFields(
            fields.into_iter().map(|(k, e)| (k.to_string(), e)).collect(),
        ))
    }

    pub fn sort(self, keys: Vec<SortKey>) -> Self {
        self.stage(Stage::Sort(keys))
    }

    pub fn limit(self, n: usize) -> Self {
        self.stage(Stage::Limit(n))
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.collection)?;
        for stage in &self.stages {
            write!(f, " -> {}", stage.name())?;
            match stage {
                Stage::Lookup(l) => write!(f, "({})", l.from)?,
                Stage::Unwind(u) => write!(f, "({})", u.path)?,
                Stage::Limit(n) => write!(f, "({})", n)?,
                _ => {}
            }
        }
        Ok(())
    }
}
