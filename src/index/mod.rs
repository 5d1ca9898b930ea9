//! Index Controller subsystem for cinebench
//!
//! Produces the two relational measurement regimes: baseline (primary-key
//! structures only) and indexed (the configured secondary index set).
//!
//! # Design Principles
//!
//! - Idempotent: applying a present index or dropping an absent one is a no-op
//! - Validated: specs are plain identifiers before any DDL is issued
//! - Serialized: DDL commits before the next timed invocation starts
//! - Audited: every change reports the storage footprint before and after

mod controller;
mod spec;

pub use controller::{default_document_roles, IndexChange, IndexController, IndexStatus};
pub use spec::{default_index_set, IndexSpec};
