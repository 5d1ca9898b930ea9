//! Dataset snapshot
//!
//! A typed, in-memory copy of the movie/person/credit entities. It is read
//! from a JSON fixture and written into the relational store in a single
//! transaction; the document store is then populated by the flattening job
//! so both backends see the same snapshot.

use std::fs;
use std::path::Path;

use rusqlite::params;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::observability::{log_event_with_fields, Event};
use crate::relational::SqliteBackend;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub movie_id: String,
    #[serde(default = "default_title_type")]
    pub title_type: String,
    pub primary_title: String,
    #[serde(default)]
    pub original_title: Option<String>,
    #[serde(default)]
    pub is_adult: bool,
    #[serde(default)]
    pub start_year: Option<i64>,
    #[serde(default)]
    pub end_year: Option<i64>,
    #[serde(default)]
    pub runtime_minutes: Option<i64>,
}

fn default_title_type() -> String {
    "movie".to_string()
}

impl Movie {
    pub fn new(movie_id: &str, primary_title: &str, start_year: Option<i64>) -> Self {
        Self {
            movie_id: movie_id.to_string(),
            title_type: default_title_type(),
            primary_title: primary_title.to_string(),
            original_title: None,
            is_adult: false,
            start_year,
            end_year: None,
            runtime_minutes: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub person_id: String,
    pub name: String,
    #[serde(default)]
    pub birth_year: Option<i64>,
    #[serde(default)]
    pub death_year: Option<i64>,
}

/// At most one per title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub movie_id: String,
    pub average_rating: f64,
    pub num_votes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreTag {
    pub movie_id: String,
    pub genre: String,
}

/// A credit; `ordering` is the billing position within the title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub movie_id: String,
    pub person_id: String,
    pub ordering: i64,
    pub category: String,
    #[serde(default)]
    pub job: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterAppearance {
    pub movie_id: String,
    pub person_id: String,
    pub name: String,
}

/// Director or writer link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditLink {
    pub movie_id: String,
    pub person_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternateTitle {
    pub movie_id: String,
    pub region: String,
    pub title: String,
}

/// Every entity of one snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dataset {
    pub movies: Vec<Movie>,
    pub persons: Vec<Person>,
    pub ratings: Vec<Rating>,
    pub genres: Vec<GenreTag>,
    pub principals: Vec<Principal>,
    pub characters: Vec<CharacterAppearance>,
    pub directors: Vec<CreditLink>,
    pub writers: Vec<CreditLink>,
    pub titles: Vec<AlternateTitle>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a JSON fixture
    pub fn from_json_file(path: &Path) -> EngineResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            EngineError::Io(format!("failed to read {}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn to_json_file(&self, path: &Path) -> EngineResult<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Total number of rows across all entities
    pub fn row_count(&self) -> usize {
        self.movies.len()
            + self.persons.len()
            + self.ratings.len()
            + self.genres.len()
            + self.principals.len()
            + self.characters.len()
            + self.directors.len()
            + self.writers.len()
            + self.titles.len()
    }

    pub fn add_movie(&mut self, movie_id: &str, title: &str, year: Option<i64>) -> &mut Self {
        self.movies.push(Movie::new(movie_id, title, year));
        self
    }

    pub fn add_person(&mut self, person_id: &str, name: &str) -> &mut Self {
        self.persons.push(Person {
            person_id: person_id.to_string(),
            name: name.to_string(),
            birth_year: None,
            death_year: None,
        });
        self
    }

    pub fn add_rating(&mut self, movie_id: &str, average_rating: f64, num_votes: i64) -> &mut Self {
        self.ratings.push(Rating {
            movie_id: movie_id.to_string(),
            average_rating,
            num_votes,
        });
        self
    }

    pub fn add_genre(&mut self, movie_id: &str, genre: &str) -> &mut Self {
        self.genres.push(GenreTag {
            movie_id: movie_id.to_string(),
            genre: genre.to_string(),
        });
        self
    }

    /// Adds a credit at the next free billing position of the title
    pub fn add_credit(&mut self, movie_id: &str, person_id: &str, category: &str) -> &mut Self {
        let ordering = self
            .principals
            .iter()
            .filter(|p| p.movie_id == movie_id)
            .map(|p| p.ordering)
            .max()
            .unwrap_or(0)
            + 1;
        self.principals.push(Principal {
            movie_id: movie_id.to_string(),
            person_id: person_id.to_string(),
            ordering,
            category: category.to_string(),
            job: None,
        });
        self
    }

    pub fn add_character(&mut self, movie_id: &str, person_id: &str, name: &str) -> &mut Self {
        self.characters.push(CharacterAppearance {
            movie_id: movie_id.to_string(),
            person_id: person_id.to_string(),
            name: name.to_string(),
        });
        self
    }

    pub fn add_director(&mut self, movie_id: &str, person_id: &str) -> &mut Self {
        self.directors.push(CreditLink {
            movie_id: movie_id.to_string(),
            person_id: person_id.to_string(),
        });
        self
    }

    pub fn add_writer(&mut self, movie_id: &str, person_id: &str) -> &mut Self {
        self.writers.push(CreditLink {
            movie_id: movie_id.to_string(),
            person_id: person_id.to_string(),
        });
        self
    }

    /// Inserts every entity into an existing schema.
    ///
    /// Runs as one transaction: on any failure nothing is written.
    pub fn load_into(&self, backend: &mut SqliteBackend) -> EngineResult<usize> {
        let conn = backend.connection_mut()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO movies (movie_id, title_type, primary_title, original_title, \
                 is_adult, start_year, end_year, runtime_minutes) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for m in &self.movies {
                stmt.execute(params![
                    m.movie_id,
                    m.title_type,
                    m.primary_title,
                    m.original_title,
                    m.is_adult,
                    m.start_year,
                    m.end_year,
                    m.runtime_minutes
                ])?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO persons (person_id, name, birth_year, death_year) \
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for p in &self.persons {
                stmt.execute(params![p.person_id, p.name, p.birth_year, p.death_year])?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO ratings (movie_id, average_rating, num_votes) VALUES (?1, ?2, ?3)",
            )?;
            for r in &self.ratings {
                stmt.execute(params![r.movie_id, r.average_rating, r.num_votes])?;
            }

            // Duplicate tags collapse onto the primary key
            let mut stmt =
                tx.prepare("INSERT OR IGNORE INTO genres (movie_id, genre) VALUES (?1, ?2)")?;
            for g in &self.genres {
                stmt.execute(params![g.movie_id, g.genre])?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO principals (movie_id, person_id, ordering, category, job) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for p in &self.principals {
                stmt.execute(params![p.movie_id, p.person_id, p.ordering, p.category, p.job])?;
            }

            let mut stmt = tx
                .prepare("INSERT INTO characters (movie_id, person_id, name) VALUES (?1, ?2, ?3)")?;
            for c in &self.characters {
                stmt.execute(params![c.movie_id, c.person_id, c.name])?;
            }

            for (table, links) in [("directors", &self.directors), ("writers", &self.writers)] {
                let mut stmt = tx.prepare(&format!(
                    "INSERT OR IGNORE INTO {} (movie_id, person_id) VALUES (?1, ?2)",
                    table
                ))?;
                for link in links {
                    stmt.execute(params![link.movie_id, link.person_id])?;
                }
            }

            let mut stmt = tx
                .prepare("INSERT INTO titles (movie_id, region, title) VALUES (?1, ?2, ?3)")?;
            for t in &self.titles {
                stmt.execute(params![t.movie_id, t.region, t.title])?;
            }
        }
        tx.commit()?;

        let rows = self.row_count();
        let rows_str = rows.to_string();
        let movies = self.movies.len().to_string();
        log_event_with_fields(
            Event::SeedLoaded,
            &[("rows", rows_str.as_str()), ("movies", movies.as_str())],
        );
        Ok(rows)
    }
}
