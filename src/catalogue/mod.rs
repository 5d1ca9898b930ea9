//! Query Catalogue subsystem for cinebench
//!
//! Nine fixed analytical computations over the movie/person/credit data,
//! each defined once per backend:
//! - relational: one parameterised SQL statement over the fixed schema
//! - document: a typed pipeline built from the resolved field table
//!
//! # Design Principles
//!
//! - Closed set: computations are enum variants, never user-supplied text
//! - Equivalent variants: same output fields, same sort keys, same
//!   tie-breaks, same null handling
//! - Absent ratings are excluded from averages, never read as zero
//! - A blank name yields an empty result, not an error
//! - No retries here; transport failures propagate

mod document;
mod explain;
mod params;
mod relational;

pub use document::DocumentBuilder;
pub use explain::{explain, ExplainPlan};
pub use params::Params;
pub use relational::{RelationalBuilder, SqlStatement};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Credit categories that count as acting
pub const ACTING_CATEGORIES: [&str; 2] = ["actor", "actress"];

/// The nine catalogue computations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Computation {
    /// Q1: acting credits of a named person, one row per character
    Filmography,
    /// Q2: best rated titles of a genre within a year range
    TopInGenre,
    /// Q3: persons playing two or more distinct characters in one title
    MultiRole,
    /// Q4: directors ranked by titles shared with a named actor
    DirectorCollaborations,
    /// Q5: genres above both a rating and a title-count threshold
    PopularGenres,
    /// Q6: a named actor's titles bucketed by decade
    CareerByDecade,
    /// Q7: top three titles per genre, flattened with their rank
    TopPerGenre,
    /// Q8: persons whose high-vote titles all follow their low-vote ones
    Breakthrough,
    /// Q9: actors ranked by genre breadth
    VersatileActors,
}

impl Computation {
    /// Catalogue order
    pub const ALL: [Computation; 9] = [
        Computation::Filmography,
        Computation::TopInGenre,
        Computation::MultiRole,
        Computation::DirectorCollaborations,
        Computation::PopularGenres,
        Computation::CareerByDecade,
        Computation::TopPerGenre,
        Computation::Breakthrough,
        Computation::VersatileActors,
    ];

    /// Stable key used in configuration and on the command line
    pub fn key(&self) -> &'static str {
        match self {
            Computation::Filmography => "q1_filmography",
            Computation::TopInGenre => "q2_top_in_genre",
            Computation::MultiRole => "q3_multi_role",
            Computation::DirectorCollaborations => "q4_collaborations",
            Computation::PopularGenres => "q5_popular_genres",
            Computation::CareerByDecade => "q6_decades",
            Computation::TopPerGenre => "q7_top3_per_genre",
            Computation::Breakthrough => "q8_breakthrough",
            Computation::VersatileActors => "q9_versatile",
        }
    }

    /// Short label for reports
    pub fn label(&self) -> &'static str {
        match self {
            Computation::Filmography => "Q1_filmography",
            Computation::TopInGenre => "Q2_topN",
            Computation::MultiRole => "Q3_multiroles",
            Computation::DirectorCollaborations => "Q4_collab",
            Computation::PopularGenres => "Q5_popular",
            Computation::CareerByDecade => "Q6_decades",
            Computation::TopPerGenre => "Q7_top3genre",
            Computation::Breakthrough => "Q8_breakthrough",
            Computation::VersatileActors => "Q9_versatile",
        }
    }

    /// Position in the catalogue, starting at 1
    pub fn number(&self) -> usize {
        Computation::ALL
            .iter()
            .position(|c| c == self)
            .map_or(0, |i| i + 1)
    }

    /// Output field names, shared by both variants
    pub fn output_fields(&self) -> &'static [&'static str] {
        match self {
            Computation::Filmography => &["title", "year", "character", "average_rating"],
            Computation::TopInGenre => &["title", "year", "average_rating", "num_votes"],
            Computation::MultiRole => &["name", "title", "year", "role_count"],
            Computation::DirectorCollaborations => &["director", "films_together"],
            Computation::PopularGenres => &["genre", "film_count", "avg_rating"],
            Computation::CareerByDecade => &["decade", "film_count", "avg_rating"],
            Computation::TopPerGenre => {
                &["genre", "rank", "title", "year", "average_rating", "num_votes"]
            }
            Computation::Breakthrough => &[
                "name",
                "low_count",
                "high_count",
                "last_low_year",
                "breakthrough_year",
            ],
            Computation::VersatileActors => &["name", "genre_count", "title_count"],
        }
    }
}

impl fmt::Display for Computation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Accepts the key, the label, or the bare number (`q2`, `Q2`, `2`)
impl FromStr for Computation {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        let bare = wanted.trim_start_matches(['q', 'Q']);
        Computation::ALL
            .iter()
            .copied()
            .find(|c| {
                c.key() == wanted
                    || c.label().eq_ignore_ascii_case(wanted)
                    || bare == c.number().to_string()
            })
            .ok_or_else(|| EngineError::UnknownComputation(wanted.to_string()))
    }
}

/// One computation with its two implementations
pub struct CatalogueEntry {
    pub computation: Computation,
    pub relational: RelationalBuilder,
    pub document: DocumentBuilder,
}

/// Implementation table, in catalogue order
pub static CATALOGUE: [CatalogueEntry; 9] = [
    CatalogueEntry {
        computation: Computation::Filmography,
        relational: relational::filmography,
        document: document::filmography,
    },
    CatalogueEntry {
        computation: Computation::TopInGenre,
        relational: relational::top_in_genre,
        document: document::top_in_genre,
    },
    CatalogueEntry {
        computation: Computation::MultiRole,
        relational: relational::multi_role,
        document: document::multi_role,
    },
    CatalogueEntry {
        computation: Computation::DirectorCollaborations,
        relational: relational::director_collaborations,
        document: document::director_collaborations,
    },
    CatalogueEntry {
        computation: Computation::PopularGenres,
        relational: relational::popular_genres,
        document: document::popular_genres,
    },
    CatalogueEntry {
        computation: Computation::CareerByDecade,
        relational: relational::career_by_decade,
        document: document::career_by_decade,
    },
    CatalogueEntry {
        computation: Computation::TopPerGenre,
        relational: relational::top_per_genre,
        document: document::top_per_genre,
    },
    CatalogueEntry {
        computation: Computation::Breakthrough,
        relational: relational::breakthrough,
        document: document::breakthrough,
    },
    CatalogueEntry {
        computation: Computation::VersatileActors,
        relational: relational::versatile_actors,
        document: document::versatile_actors,
    },
];

/// Implementation table entry for a computation
pub fn entry(computation: Computation) -> &'static CatalogueEntry {
    &CATALOGUE[computation.number() - 1]
}
