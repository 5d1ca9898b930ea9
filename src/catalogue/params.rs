//! Scalar parameters shared by the catalogue computations

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Computation parameters
///
/// Every field has a default so a configuration file may override any
/// subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Q1, Q4, Q6: case-insensitive substring of the person name
    pub person_name: String,
    /// Q2
    pub genre: String,
    /// Q2: inclusive year range
    pub year_from: i64,
    pub year_to: i64,
    /// Q2: result cap
    pub top_n: usize,
    /// Q5: strict lower bound on the genre's mean rating
    pub min_avg_rating: f64,
    /// Q5: strict lower bound on the genre's rated title count
    pub min_title_count: i64,
    /// Q8: votes at or above this mark a high-visibility title
    pub vote_threshold: i64,
    /// Q9: minimum distinct genres
    pub min_genres: i64,
    /// Q9: result cap
    pub versatile_limit: usize,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            person_name: "Tom Hanks".to_string(),
            genre: "Drama".to_string(),
            year_from: 1990,
            year_to: 2020,
            top_n: 50,
            min_avg_rating: 7.0,
            min_title_count: 50,
            vote_threshold: 200_000,
            min_genres: 3,
            versatile_limit: 50,
        }
    }
}

impl Params {
    /// Trimmed person name, `None` when blank
    pub fn person_needle(&self) -> Option<&str> {
        let name = self.person_name.trim();
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.year_from > self.year_to {
            return Err(EngineError::Config(format!(
                "year_from ({}) is after year_to ({})",
                self.year_from, self.year_to
            )));
        }
        if !self.min_avg_rating.is_finite() {
            return Err(EngineError::Config(
                "min_avg_rating must be a finite number".to_string(),
            ));
        }
        if self.vote_threshold < 0 {
            return Err(EngineError::Config(
                "vote_threshold must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let params: Params = serde_json::from_str(r#"{"genre": "Comedy", "top_n": 5}"#).unwrap();
        assert_eq!(params.genre, "Comedy");
        assert_eq!(params.top_n, 5);
        assert_eq!(params.person_name, "Tom Hanks");
        assert_eq!(params.vote_threshold, 200_000);
    }

    #[test]
    fn test_blank_name_has_no_needle() {
        let mut params = Params::default();
        params.person_name = "   ".to_string();
        assert_eq!(params.person_needle(), None);
        params.person_name = " hanks ".to_string();
        assert_eq!(params.person_needle(), Some("hanks"));
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let params = Params {
            year_from: 2020,
            year_to: 1990,
            ..Params::default()
        };
        assert!(params.validate().unwrap_err().is_fatal());
        assert!(Params::default().validate().is_ok());
    }
}
