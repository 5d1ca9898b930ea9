//! Scalar SQL functions registered on every connection

use std::sync::Arc;

use regex::Regex;
use rusqlite::functions::{Context, FunctionFlags};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, Error};

use crate::text::needle_pattern;

/// `contains_ci(haystack, needle)`: Unicode case-insensitive literal substring
///
/// NULL haystacks never match. The compiled needle is cached per statement.
pub const CONTAINS_CI: &str = "contains_ci";

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub fn register(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        CONTAINS_CI,
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        contains_ci,
    )
}

fn contains_ci(ctx: &Context<'_>) -> rusqlite::Result<bool> {
    let pattern: Arc<Regex> = ctx.get_or_create_aux(1, |needle| -> Result<Regex, BoxError> {
        Ok(needle_pattern(needle.as_str()?)?)
    })?;
    let haystack = match ctx.get_raw(0) {
        ValueRef::Null => return Ok(false),
        value => value
            .as_str()
            .map_err(|e| Error::UserFunctionError(e.into()))?,
    };
    Ok(pattern.is_match(haystack))
}
