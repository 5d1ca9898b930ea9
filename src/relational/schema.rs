//! Fixed relational schema
//!
//! `characters` has no uniqueness constraint: a person may be listed under
//! the same character name more than once in a title.

use serde::Serialize;

use super::RelationalBackend;
use crate::error::EngineResult;

/// Expected tables and their columns
pub const EXPECTED_TABLES: &[(&str, &[&str])] = &[
    (
        "movies",
        &[
            "movie_id",
            "title_type",
            "primary_title",
            "original_title",
            "is_adult",
            "start_year",
            "end_year",
            "runtime_minutes",
        ],
    ),
    ("persons", &["person_id", "name", "birth_year", "death_year"]),
    ("characters", &["movie_id", "person_id", "name"]),
    ("genres", &["movie_id", "genre"]),
    ("ratings", &["movie_id", "average_rating", "num_votes"]),
    ("principals", &["movie_id", "person_id", "ordering", "category", "job"]),
    ("directors", &["movie_id", "person_id"]),
    ("writers", &["movie_id", "person_id"]),
    ("titles", &["movie_id", "region", "title"]),
];

const DDL: &str = "
DROP TABLE IF EXISTS titles;
DROP TABLE IF EXISTS writers;
DROP TABLE IF EXISTS directors;
DROP TABLE IF EXISTS principals;
DROP TABLE IF EXISTS ratings;
DROP TABLE IF EXISTS genres;
DROP TABLE IF EXISTS characters;
DROP TABLE IF EXISTS persons;
DROP TABLE IF EXISTS movies;

CREATE TABLE movies (
    movie_id        TEXT PRIMARY KEY,
    title_type      TEXT NOT NULL,
    primary_title   TEXT NOT NULL,
    original_title  TEXT,
    is_adult        INTEGER NOT NULL DEFAULT 0,
    start_year      INTEGER,
    end_year        INTEGER,
    runtime_minutes INTEGER
);

CREATE TABLE persons (
    person_id  TEXT PRIMARY KEY,
    name       TEXT NOT NULL,
    birth_year INTEGER,
    death_year INTEGER
);

CREATE TABLE characters (
    movie_id  TEXT NOT NULL REFERENCES movies(movie_id),
    person_id TEXT NOT NULL REFERENCES persons(person_id),
    name      TEXT NOT NULL
);

CREATE TABLE genres (
    movie_id TEXT NOT NULL REFERENCES movies(movie_id),
    genre    TEXT NOT NULL,
    PRIMARY KEY (movie_id, genre)
);

CREATE TABLE ratings (
    movie_id       TEXT PRIMARY KEY REFERENCES movies(movie_id),
    average_rating REAL NOT NULL,
    num_votes      INTEGER NOT NULL
);

CREATE TABLE principals (
    movie_id  TEXT NOT NULL REFERENCES movies(movie_id),
    person_id TEXT NOT NULL REFERENCES persons(person_id),
    ordering  INTEGER NOT NULL,
    category  TEXT NOT NULL,
    job       TEXT,
    PRIMARY KEY (movie_id, person_id, ordering)
);

CREATE TABLE directors (
    movie_id  TEXT NOT NULL REFERENCES movies(movie_id),
    person_id TEXT NOT NULL REFERENCES persons(person_id),
    PRIMARY KEY (movie_id, person_id)
);

CREATE TABLE writers (
    movie_id  TEXT NOT NULL REFERENCES movies(movie_id),
    person_id TEXT NOT NULL REFERENCES persons(person_id),
    PRIMARY KEY (movie_id, person_id)
);

CREATE TABLE titles (
    movie_id TEXT NOT NULL REFERENCES movies(movie_id),
    region   TEXT NOT NULL,
    title    TEXT NOT NULL,
    PRIMARY KEY (movie_id, region)
);
";

/// Drops and recreates every table
pub fn create_schema(backend: &dyn RelationalBackend) -> EngineResult<()> {
    backend.execute_batch(DDL)
}

/// Result of checking one expected table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableCheck {
    pub table: String,
    pub present: bool,
    pub missing_columns: Vec<String>,
}

impl TableCheck {
    pub fn is_ok(&self) -> bool {
        self.present && self.missing_columns.is_empty()
    }
}

/// Reports missing tables and columns
pub fn verify_schema(backend: &dyn RelationalBackend) -> EngineResult<Vec<TableCheck>> {
    let tables = backend.table_names()?;
    let mut checks = Vec::with_capacity(EXPECTED_TABLES.len());
    for (table, columns) in EXPECTED_TABLES {
        if !tables.iter().any(|t| t == table) {
            checks.push(TableCheck {
                table: table.to_string(),
                present: false,
                missing_columns: columns.iter().map(|c| c.to_string()).collect(),
            });
            continue;
        }
        let have = backend.table_columns(table)?;
        checks.push(TableCheck {
            table: table.to_string(),
            present: true,
            missing_columns: columns
                .iter()
                .filter(|c| !have.iter().any(|h| h == *c))
                .map(|c| c.to_string())
                .collect(),
        });
    }
    Ok(checks)
}
