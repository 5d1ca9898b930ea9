//! Relational statements over the fixed schema
//!
//! Every statement orders its output fully: when two rows tie on the
//! documented sort keys, a title or person identifier decides, so that a
//! `LIMIT` keeps the same rows as the document variant.

use super::params::Params;
use crate::relational::SqlParam;

/// Query text with its bound parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    pub sql: &'static str,
    pub params: Vec<SqlParam>,
}

impl SqlStatement {
    fn new(sql: &'static str, params: Vec<SqlParam>) -> Self {
        Self { sql, params }
    }
}

/// Builds the statement; `None` means the result is empty without querying
pub type RelationalBuilder = fn(&Params) -> Option<SqlStatement>;

fn text(s: impl Into<String>) -> SqlParam {
    SqlParam::Text(s.into())
}

fn int(i: i64) -> SqlParam {
    SqlParam::Integer(i)
}

fn count(n: usize) -> SqlParam {
    SqlParam::Integer(i64::try_from(n).unwrap_or(i64::MAX))
}

const FILMOGRAPHY: &str = "
SELECT
    m.primary_title  AS title,
    m.start_year     AS year,
    c.name           AS character,
    r.average_rating AS average_rating
FROM persons         AS pe
JOIN principals      AS p ON p.person_id = pe.person_id
JOIN movies          AS m ON m.movie_id  = p.movie_id
LEFT JOIN ratings    AS r ON r.movie_id  = m.movie_id
LEFT JOIN characters AS c ON c.movie_id  = p.movie_id
                         AND c.person_id = p.person_id
WHERE contains_ci(pe.name, ?1)
  AND p.category IN ('actor', 'actress')
ORDER BY m.start_year DESC, m.primary_title ASC, c.name ASC, m.movie_id ASC, p.person_id ASC";

pub fn filmography(params: &Params) -> Option<SqlStatement> {
    let needle = params.person_needle()?;
    Some(SqlStatement::new(FILMOGRAPHY, vec![text(needle)]))
}

const TOP_IN_GENRE: &str = "
SELECT
    m.primary_title  AS title,
    m.start_year     AS year,
    r.average_rating AS average_rating,
    r.num_votes      AS num_votes
FROM genres   AS g
JOIN movies   AS m ON m.movie_id = g.movie_id
JOIN ratings  AS r ON r.movie_id = g.movie_id
WHERE g.genre = ?1
  AND m.start_year BETWEEN ?2 AND ?3
ORDER BY r.average_rating DESC, r.num_votes DESC, m.primary_title ASC, m.movie_id ASC
LIMIT ?4";

pub fn top_in_genre(params: &Params) -> Option<SqlStatement> {
    Some(SqlStatement::new(
        TOP_IN_GENRE,
        vec![
            text(params.genre.as_str()),
            int(params.year_from),
            int(params.year_to),
            count(params.top_n),
        ],
    ))
}

const MULTI_ROLE: &str = "
SELECT
    pe.name                AS name,
    m.primary_title        AS title,
    m.start_year           AS year,
    COUNT(DISTINCT c.name) AS role_count
FROM characters AS c
JOIN persons    AS pe ON pe.person_id = c.person_id
JOIN movies     AS m  ON m.movie_id   = c.movie_id
GROUP BY c.person_id, c.movie_id
HAVING COUNT(DISTINCT c.name) > 1
ORDER BY role_count DESC, pe.name ASC, m.primary_title ASC, c.person_id ASC, c.movie_id ASC";

pub fn multi_role(_params: &Params) -> Option<SqlStatement> {
    Some(SqlStatement::new(MULTI_ROLE, Vec::new()))
}

const DIRECTOR_COLLABORATIONS: &str = "
WITH acted AS (
    SELECT DISTINCT p.movie_id
    FROM principals AS p
    JOIN persons    AS pe ON pe.person_id = p.person_id
    WHERE contains_ci(pe.name, ?1)
      AND p.category IN ('actor', 'actress')
)
SELECT
    dp.name  AS director,
    COUNT(*) AS films_together
FROM acted     AS a
JOIN movies    AS m  ON m.movie_id   = a.movie_id
JOIN directors AS d  ON d.movie_id   = a.movie_id
JOIN persons   AS dp ON dp.person_id = d.person_id
GROUP BY d.person_id
ORDER BY films_together DESC, director ASC, d.person_id ASC";

pub fn director_collaborations(params: &Params) -> Option<SqlStatement> {
    let needle = params.person_needle()?;
    Some(SqlStatement::new(
        DIRECTOR_COLLABORATIONS,
        vec![text(needle)],
    ))
}

const POPULAR_GENRES: &str = "
SELECT
    g.genre               AS genre,
    COUNT(*)              AS film_count,
    AVG(r.average_rating) AS avg_rating
FROM genres  AS g
JOIN ratings AS r ON r.movie_id = g.movie_id
GROUP BY g.genre
HAVING COUNT(*) > ?1 AND AVG(r.average_rating) > ?2
ORDER BY avg_rating DESC, genre ASC";

pub fn popular_genres(params: &Params) -> Option<SqlStatement> {
    Some(SqlStatement::new(
        POPULAR_GENRES,
        vec![int(params.min_title_count), SqlParam::Real(params.min_avg_rating)],
    ))
}

const CAREER_BY_DECADE: &str = "
WITH actor_movies AS (
    SELECT DISTINCT m.movie_id, m.start_year
    FROM principals AS p
    JOIN persons    AS pe ON pe.person_id = p.person_id
    JOIN movies     AS m  ON m.movie_id   = p.movie_id
    WHERE contains_ci(pe.name, ?1)
      AND p.category IN ('actor', 'actress')
      AND m.start_year IS NOT NULL
      AND m.start_year >= 0
)
SELECT
    (CAST(am.start_year AS INTEGER) / 10) * 10 AS decade,
    COUNT(*)                                  AS film_count,
    AVG(r.average_rating)                     AS avg_rating
FROM actor_movies AS am
LEFT JOIN ratings AS r ON r.movie_id = am.movie_id
GROUP BY decade
ORDER BY decade ASC";

pub fn career_by_decade(params: &Params) -> Option<SqlStatement> {
    let needle = params.person_needle()?;
    Some(SqlStatement::new(CAREER_BY_DECADE, vec![text(needle)]))
}

const TOP_PER_GENRE: &str = "
SELECT genre, rank, title, year, average_rating, num_votes
FROM (
    SELECT
        g.genre          AS genre,
        m.primary_title  AS title,
        m.start_year     AS year,
        r.average_rating AS average_rating,
        r.num_votes      AS num_votes,
        ROW_NUMBER() OVER (
            PARTITION BY g.genre
            ORDER BY r.average_rating DESC,
                     r.num_votes DESC,
                     m.primary_title ASC,
                     m.movie_id ASC
        ) AS rank
    FROM genres  AS g
    JOIN movies  AS m ON m.movie_id = g.movie_id
    JOIN ratings AS r ON r.movie_id = g.movie_id
) AS ranked
WHERE rank <= 3
ORDER BY genre ASC, rank ASC";

pub fn top_per_genre(_params: &Params) -> Option<SqlStatement> {
    Some(SqlStatement::new(TOP_PER_GENRE, Vec::new()))
}

const BREAKTHROUGH: &str = "
WITH credits AS (
    SELECT DISTINCT person_id, movie_id FROM principals
),
person_stats AS (
    SELECT
        c.person_id,
        SUM(CASE WHEN r.num_votes <  ?1 THEN 1 ELSE 0 END)       AS low_count,
        SUM(CASE WHEN r.num_votes >= ?1 THEN 1 ELSE 0 END)       AS high_count,
        MAX(CASE WHEN r.num_votes <  ?1 THEN m.start_year END)   AS last_low_year,
        MIN(CASE WHEN r.num_votes >= ?1 THEN m.start_year END)   AS breakthrough_year
    FROM credits  AS c
    JOIN movies   AS m ON m.movie_id = c.movie_id
    JOIN ratings  AS r ON r.movie_id = c.movie_id
    GROUP BY c.person_id
)
SELECT
    pe.name             AS name,
    s.low_count         AS low_count,
    s.high_count        AS high_count,
    s.last_low_year     AS last_low_year,
    s.breakthrough_year AS breakthrough_year
FROM person_stats AS s
JOIN persons      AS pe ON pe.person_id = s.person_id
WHERE s.low_count > 0
  AND s.high_count > 0
  AND s.last_low_year < s.breakthrough_year
ORDER BY s.high_count DESC, s.breakthrough_year ASC, pe.name ASC, s.person_id ASC";

pub fn breakthrough(params: &Params) -> Option<SqlStatement> {
    Some(SqlStatement::new(BREAKTHROUGH, vec![int(params.vote_threshold)]))
}

const VERSATILE_ACTORS: &str = "
SELECT
    pe.name                    AS name,
    COUNT(DISTINCT g.genre)    AS genre_count,
    COUNT(DISTINCT m.movie_id) AS title_count
FROM principals AS p
JOIN persons    AS pe ON pe.person_id = p.person_id
JOIN movies     AS m  ON m.movie_id   = p.movie_id
JOIN genres     AS g  ON g.movie_id   = m.movie_id
WHERE p.category IN ('actor', 'actress')
GROUP BY p.person_id
HAVING COUNT(DISTINCT g.genre) >= ?1
ORDER BY genre_count DESC, title_count DESC, pe.name ASC, p.person_id ASC
LIMIT ?2";

pub fn versatile_actors(params: &Params) -> Option<SqlStatement> {
    Some(SqlStatement::new(
        VERSATILE_ACTORS,
        vec![int(params.min_genres), count(params.versatile_limit)],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_needle_bound_verbatim() {
        let params = Params {
            person_name: "  Penélope_%  ".to_string(),
            ..Params::default()
        };
        let stmt = filmography(&params).unwrap();
        assert!(stmt.sql.contains("contains_ci(pe.name, ?1)"));
        assert_eq!(stmt.params, vec![SqlParam::Text("Penélope_%".to_string())]);
    }

    #[test]
    fn test_blank_name_builds_nothing() {
        let params = Params {
            person_name: " ".to_string(),
            ..Params::default()
        };
        assert!(filmography(&params).is_none());
        assert!(director_collaborations(&params).is_none());
        assert!(career_by_decade(&params).is_none());
        assert!(top_in_genre(&params).is_some());
    }

    #[test]
    fn test_parameters_bound_in_order() {
        let stmt = top_in_genre(&Params::default()).unwrap();
        assert_eq!(
            stmt.params,
            vec![
                SqlParam::Text("Drama".to_string()),
                SqlParam::Integer(1990),
                SqlParam::Integer(2020),
                SqlParam::Integer(50),
            ]
        );
    }
}
