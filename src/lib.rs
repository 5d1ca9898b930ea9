//! cinebench - cross-backend analytical query engine and benchmark harness
//!
//! Nine fixed analytical computations over a movie/person/credit dataset,
//! each implemented once as relational SQL and once as a document-store
//! pipeline, plus a harness that times both forms with and without
//! secondary indexes and reports comparable result sets.

pub mod adapter;
pub mod catalogue;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod document;
pub mod error;
pub mod harness;
pub mod index;
pub mod observability;
pub mod record;
pub mod relational;
pub mod schema;
pub mod text;
