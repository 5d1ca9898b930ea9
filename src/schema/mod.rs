//! Schema Resolver subsystem for cinebench
//!
//! Document collections drift in field naming across dataset versions
//! (`movie_id` / `tconst`, `average_rating` / `rating`, ...). The resolver
//! samples one document per collection and maps each logical role to the
//! field actually present.
//!
//! # Design Principles
//!
//! - One sample read per collection, never a scan
//! - Fixed candidate priority per role; first match wins
//! - Join keys fall back to the resolved identifier names
//! - An unresolved role fails loudly when a pipeline asks for it
//! - Pipelines are built from the resolved table only

mod resolver;
mod roles;

pub use resolver::{ResolvedFields, SchemaResolver};
pub use roles::{collections, EmptyDefault, FieldRole};
