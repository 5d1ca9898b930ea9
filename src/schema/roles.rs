//! Logical field roles and their candidate field names

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Collection names shared by both stores
pub mod collections {
    pub const MOVIES: &str = "movies";
    pub const PERSONS: &str = "persons";
    pub const RATINGS: &str = "ratings";
    pub const GENRES: &str = "genres";
    pub const PRINCIPALS: &str = "principals";
    pub const CHARACTERS: &str = "characters";
    pub const DIRECTORS: &str = "directors";

    /// Every collection the resolver samples
    pub const SAMPLED: [&str; 7] = [
        MOVIES, PERSONS, RATINGS, GENRES, PRINCIPALS, CHARACTERS, DIRECTORS,
    ];
}

use collections::*;

/// A logical field the document pipelines refer to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRole {
    MovieId,
    PersonId,
    MovieTitle,
    MovieYear,
    PersonName,
    GenresMovieId,
    Genre,
    RatingsMovieId,
    AvgRating,
    NumVotes,
    PrincipalsMovieId,
    PrincipalsPersonId,
    PrincipalsCategory,
    CharactersMovieId,
    CharactersPersonId,
    CharacterName,
    DirectorsMovieId,
    DirectorsPersonId,
}

impl FieldRole {
    /// Resolution order: identifiers first so that join roles can inherit them
    pub const ALL: [FieldRole; 18] = [
        FieldRole::MovieId,
        FieldRole::PersonId,
        FieldRole::MovieTitle,
        FieldRole::MovieYear,
        FieldRole::PersonName,
        FieldRole::GenresMovieId,
        FieldRole::Genre,
        FieldRole::RatingsMovieId,
        FieldRole::AvgRating,
        FieldRole::NumVotes,
        FieldRole::PrincipalsMovieId,
        FieldRole::PrincipalsPersonId,
        FieldRole::PrincipalsCategory,
        FieldRole::CharactersMovieId,
        FieldRole::CharactersPersonId,
        FieldRole::CharacterName,
        FieldRole::DirectorsMovieId,
        FieldRole::DirectorsPersonId,
    ];

    /// Stable role name
    pub fn key(&self) -> &'static str {
        match self {
            FieldRole::MovieId => "movie_id",
            FieldRole::PersonId => "person_id",
            FieldRole::MovieTitle => "movie_title",
            FieldRole::MovieYear => "movie_year",
            FieldRole::PersonName => "person_name",
            FieldRole::GenresMovieId => "genres_movie_id",
            FieldRole::Genre => "genre",
            FieldRole::RatingsMovieId => "ratings_movie_id",
            FieldRole::AvgRating => "avg_rating",
            FieldRole::NumVotes => "num_votes",
            FieldRole::PrincipalsMovieId => "principals_movie_id",
            FieldRole::PrincipalsPersonId => "principals_person_id",
            FieldRole::PrincipalsCategory => "principals_category",
            FieldRole::CharactersMovieId => "characters_movie_id",
            FieldRole::CharactersPersonId => "characters_person_id",
            FieldRole::CharacterName => "character_name",
            FieldRole::DirectorsMovieId => "directors_movie_id",
            FieldRole::DirectorsPersonId => "directors_person_id",
        }
    }

    /// Collection whose sample decides this role
    pub fn collection(&self) -> &'static str {
        match self {
            FieldRole::MovieId | FieldRole::MovieTitle | FieldRole::MovieYear => MOVIES,
            FieldRole::PersonId | FieldRole::PersonName => PERSONS,
            FieldRole::GenresMovieId | FieldRole::Genre => GENRES,
            FieldRole::RatingsMovieId | FieldRole::AvgRating | FieldRole::NumVotes => RATINGS,
            FieldRole::PrincipalsMovieId
            | FieldRole::PrincipalsPersonId
            | FieldRole::PrincipalsCategory => PRINCIPALS,
            FieldRole::CharactersMovieId
            | FieldRole::CharactersPersonId
            | FieldRole::CharacterName => CHARACTERS,
            FieldRole::DirectorsMovieId | FieldRole::DirectorsPersonId => DIRECTORS,
        }
    }

    /// Candidate field names in priority order
    pub fn candidates(&self) -> &'static [&'static str] {
        match self {
            FieldRole::MovieId => &["movie_id", "id", "tconst", "_id"],
            FieldRole::PersonId => &["person_id", "id", "nconst", "_id"],
            FieldRole::MovieTitle => &["title", "primary_title", "name"],
            FieldRole::MovieYear => &["year", "start_year", "release_year"],
            FieldRole::PersonName => &["name", "primary_name"],
            FieldRole::Genre => &["genre", "genres"],
            FieldRole::AvgRating => &["average_rating", "avg_rating", "rating"],
            FieldRole::NumVotes => &["num_votes", "votes", "number_of_votes"],
            FieldRole::PrincipalsCategory => &["category", "role", "job"],
            FieldRole::CharacterName => &["character", "characters", "name"],
            FieldRole::GenresMovieId
            | FieldRole::RatingsMovieId
            | FieldRole::PrincipalsMovieId
            | FieldRole::CharactersMovieId
            | FieldRole::DirectorsMovieId => &["movie_id", "tconst"],
            FieldRole::PrincipalsPersonId
            | FieldRole::CharactersPersonId
            | FieldRole::DirectorsPersonId => &["person_id", "nconst"],
        }
    }

    /// Role whose resolved name is tried after the candidates
    pub fn inherits(&self) -> Option<FieldRole> {
        match self {
            FieldRole::GenresMovieId
            | FieldRole::RatingsMovieId
            | FieldRole::PrincipalsMovieId
            | FieldRole::CharactersMovieId
            | FieldRole::DirectorsMovieId => Some(FieldRole::MovieId),
            FieldRole::PrincipalsPersonId
            | FieldRole::CharactersPersonId
            | FieldRole::DirectorsPersonId => Some(FieldRole::PersonId),
            _ => None,
        }
    }

    /// Name used when the collection is empty, for collections that may
    /// legitimately be absent from a dataset
    pub fn empty_collection_default(&self) -> Option<EmptyDefault> {
        match self {
            FieldRole::CharactersMovieId => Some(EmptyDefault::Inherit(FieldRole::MovieId)),
            FieldRole::CharactersPersonId => Some(EmptyDefault::Inherit(FieldRole::PersonId)),
            FieldRole::CharacterName => Some(EmptyDefault::Name("character")),
            _ => None,
        }
    }
}

/// Fallback for a role over an empty collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyDefault {
    Inherit(FieldRole),
    Name(&'static str),
}

impl fmt::Display for FieldRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for FieldRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldRole::ALL
            .iter()
            .find(|r| r.key() == s)
            .copied()
            .ok_or_else(|| format!("unknown field role '{}'", s))
    }
}
