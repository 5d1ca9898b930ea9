//! Secondary index specifications

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// One relational secondary index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub name: String,
    pub table: String,
    pub columns: Vec<String>,
}

impl IndexSpec {
    pub fn new(name: &str, table: &str, columns: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            table: table.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Rejects anything but plain identifiers; specs are spliced into DDL
    pub fn validate(&self) -> EngineResult<()> {
        let ident = identifier_pattern()?;
        if self.columns.is_empty() {
            return Err(EngineError::InvalidIndexSpec(format!(
                "index '{}' has no columns",
                self.name
            )));
        }
        for part in std::iter::once(&self.name)
            .chain(std::iter::once(&self.table))
            .chain(self.columns.iter())
        {
            if !ident.is_match(part) {
                return Err(EngineError::InvalidIndexSpec(format!(
                    "'{}' is not a plain identifier",
                    part
                )));
            }
        }
        if self.name.to_ascii_lowercase().starts_with("sqlite_") {
            return Err(EngineError::InvalidIndexSpec(format!(
                "'{}' uses the reserved sqlite_ prefix",
                self.name
            )));
        }
        Ok(())
    }

    pub fn create_sql(&self) -> String {
        format!(
            "CREATE INDEX IF NOT EXISTS {} ON {}({});",
            self.name,
            self.table,
            self.columns.join(", ")
        )
    }

    pub fn drop_sql(&self) -> String {
        format!("DROP INDEX IF EXISTS {};", self.name)
    }
}

fn identifier_pattern() -> EngineResult<Regex> {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$")
        .map_err(|e| EngineError::InvalidIndexSpec(format!("identifier pattern: {}", e)))
}

/// `name:table(col, col)`
impl fmt::Display for IndexSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}({})", self.name, self.table, self.columns.join(", "))
    }
}

impl FromStr for IndexSpec {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || EngineError::InvalidIndexSpec(format!("expected name:table(columns), got '{}'", s));
        let (name, rest) = s.split_once(':').ok_or_else(malformed)?;
        let (table, columns) = rest
            .trim()
            .strip_suffix(')')
            .and_then(|r| r.split_once('('))
            .ok_or_else(malformed)?;
        let spec = IndexSpec {
            name: name.trim().to_string(),
            table: table.trim().to_string(),
            columns: columns
                .split(',')
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
        };
        spec.validate()?;
        Ok(spec)
    }
}

/// The benchmark's default index set
pub fn default_index_set() -> Vec<IndexSpec> {
    vec![
        IndexSpec::new("idx_persons_name", "persons", &["name"]),
        IndexSpec::new("idx_principals_person", "principals", &["person_id"]),
        IndexSpec::new("idx_principals_movie", "principals", &["movie_id"]),
        IndexSpec::new("idx_genres_genre", "genres", &["genre"]),
        IndexSpec::new("idx_movies_start_year", "movies", &["start_year"]),
    ]
}
