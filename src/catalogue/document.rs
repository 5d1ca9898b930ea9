//! Document pipelines built from resolved field names
//!
//! Each builder first asks the resolved table for every role it needs, so
//! an unresolved role fails before any stage is built. Builders for the
//! name-driven computations run one preliminary `persons` query to turn the
//! name into identifiers.

use serde_json::Value;

use super::params::Params;
use super::ACTING_CATEGORIES;
use crate::document::{
    Accumulator, DocumentBackend, Expr, Pipeline, Predicate, SortKey,
};
use crate::error::EngineResult;
use crate::schema::collections::{DIRECTORS, GENRES, MOVIES, PERSONS, PRINCIPALS, RATINGS, CHARACTERS};
use crate::schema::{FieldRole, ResolvedFields};

/// Builds the pipeline; `Ok(None)` means the result is empty without
/// querying further
pub type DocumentBuilder =
    fn(&dyn DocumentBackend, &ResolvedFields, &Params) -> EngineResult<Option<Pipeline>>;

fn at(prefix: &str, field: &str) -> String {
    format!("{}.{}", prefix, field)
}

fn acting() -> Vec<Value> {
    ACTING_CATEGORIES.iter().map(|c| Value::from(*c)).collect()
}

/// Identifiers of persons whose name contains the needle
fn person_ids(
    backend: &dyn DocumentBackend,
    fields: &ResolvedFields,
    needle: &str,
) -> EngineResult<Vec<Value>> {
    let [id, name] = fields.get_all([FieldRole::PersonId, FieldRole::PersonName])?;
    let pipeline = Pipeline::over(PERSONS)
        .matching(vec![Predicate::contains_ignore_case(name, needle)?])
        .project(vec![("id", Expr::field(id))]);
    Ok(backend
        .aggregate(&pipeline)?
        .into_iter()
        .filter_map(|doc| doc.get("id").filter(|v| !v.is_null()).cloned())
        .collect())
}

pub fn filmography(
    backend: &dyn DocumentBackend,
    fields: &ResolvedFields,
    params: &Params,
) -> EngineResult<Option<Pipeline>> {
    let [pr_movie, pr_person, category, movie_id, title, year] = fields.get_all([
        FieldRole::PrincipalsMovieId,
        FieldRole::PrincipalsPersonId,
        FieldRole::PrincipalsCategory,
        FieldRole::MovieId,
        FieldRole::MovieTitle,
        FieldRole::MovieYear,
    ])?;
    let [r_movie, rating, c_movie, c_person, character] = fields.get_all([
        FieldRole::RatingsMovieId,
        FieldRole::AvgRating,
        FieldRole::CharactersMovieId,
        FieldRole::CharactersPersonId,
        FieldRole::CharacterName,
    ])?;

    let Some(needle) = params.person_needle() else {
        return Ok(None);
    };
    let ids = person_ids(backend, fields, needle)?;
    if ids.is_empty() {
        return Ok(None);
    }

    Ok(Some(
        Pipeline::over(PRINCIPALS)
            .matching(vec![
                Predicate::one_of(pr_person, ids),
                Predicate::one_of(category, acting()),
            ])
            .lookup(MOVIES, pr_movie, movie_id, "m")
            .unwind("m")
            .lookup(RATINGS, pr_movie, r_movie, "r")
            .unwind_preserving("r")
            .lookup_on(
                CHARACTERS,
                &[(pr_movie, c_movie), (pr_person, c_person)],
                "c",
            )
            .unwind_preserving("c")
            .sort(vec![
                SortKey::desc(at("m", year)),
                SortKey::asc(at("m", title)),
                SortKey::asc(at("c", character)),
                SortKey::asc(at("m", movie_id)),
                SortKey::asc(pr_person),
            ])
            .project(vec![
                ("title", Expr::field(at("m", title))),
                ("year", Expr::field(at("m", year))),
                ("character", Expr::field(at("c", character))),
                ("average_rating", Expr::field(at("r", rating))),
            ]),
    ))
}

pub fn top_in_genre(
    _backend: &dyn DocumentBackend,
    fields: &ResolvedFields,
    params: &Params,
) -> EngineResult<Option<Pipeline>> {
    let [g_movie, genre, movie_id, title, year] = fields.get_all([
        FieldRole::GenresMovieId,
        FieldRole::Genre,
        FieldRole::MovieId,
        FieldRole::MovieTitle,
        FieldRole::MovieYear,
    ])?;
    let [r_movie, rating, votes] = fields.get_all([
        FieldRole::RatingsMovieId,
        FieldRole::AvgRating,
        FieldRole::NumVotes,
    ])?;

    Ok(Some(
        Pipeline::over(GENRES)
            .matching(vec![Predicate::eq(genre, Value::from(params.genre.as_str()))])
            .group(vec![("movie_id", Expr::field(g_movie))], vec![])
            .lookup(MOVIES, "_id.movie_id", movie_id, "m")
            .unwind("m")
            .matching(vec![
                Predicate::gte(at("m", year), Value::from(params.year_from)),
                Predicate::lte(at("m", year), Value::from(params.year_to)),
            ])
            .lookup(RATINGS, "_id.movie_id", r_movie, "r")
            .unwind("r")
            .sort(vec![
                SortKey::desc(at("r", rating)),
                SortKey::desc(at("r", votes)),
                SortKey::asc(at("m", title)),
                SortKey::asc("_id.movie_id"),
            ])
            .limit(params.top_n)
            .project(vec![
                ("title", Expr::field(at("m", title))),
                ("year", Expr::field(at("m", year))),
                ("average_rating", Expr::field(at("r", rating))),
                ("num_votes", Expr::field(at("r", votes))),
            ]),
    ))
}

pub fn multi_role(
    _backend: &dyn DocumentBackend,
    fields: &ResolvedFields,
    _params: &Params,
) -> EngineResult<Option<Pipeline>> {
    let [c_movie, c_person, character] = fields.get_all([
        FieldRole::CharactersMovieId,
        FieldRole::CharactersPersonId,
        FieldRole::CharacterName,
    ])?;
    let [person_id, name, movie_id, title, year] = fields.get_all([
        FieldRole::PersonId,
        FieldRole::PersonName,
        FieldRole::MovieId,
        FieldRole::MovieTitle,
        FieldRole::MovieYear,
    ])?;

    Ok(Some(
        Pipeline::over(CHARACTERS)
            .group(
                vec![
                    ("person_id", Expr::field(c_person)),
                    ("movie_id", Expr::field(c_movie)),
                ],
                vec![("names", Accumulator::AddToSet(Expr::field(character)))],
            )
            .add_fields(vec![("role_count", Expr::size(Expr::field("names")))])
            .matching(vec![Predicate::gt("role_count", Value::from(1))])
            .lookup(PERSONS, "_id.person_id", person_id, "p")
            .unwind("p")
            .lookup(MOVIES, "_id.movie_id", movie_id, "m")
            .unwind("m")
            .sort(vec![
                SortKey::desc("role_count"),
                SortKey::asc(at("p", name)),
                SortKey::asc(at("m", title)),
                SortKey::asc("_id.person_id"),
                SortKey::asc("_id.movie_id"),
            ])
            .project(vec![
                ("name", Expr::field(at("p", name))),
                ("title", Expr::field(at("m", title))),
                ("year", Expr::field(at("m", year))),
                ("role_count", Expr::field("role_count")),
            ]),
    ))
}

pub fn director_collaborations(
    backend: &dyn DocumentBackend,
    fields: &ResolvedFields,
    params: &Params,
) -> EngineResult<Option<Pipeline>> {
    let [pr_movie, pr_person, category, movie_id] = fields.get_all([
        FieldRole::PrincipalsMovieId,
        FieldRole::PrincipalsPersonId,
        FieldRole::PrincipalsCategory,
        FieldRole::MovieId,
    ])?;
    let [d_movie, d_person, person_id, name] = fields.get_all([
        FieldRole::DirectorsMovieId,
        FieldRole::DirectorsPersonId,
        FieldRole::PersonId,
        FieldRole::PersonName,
    ])?;

    let Some(needle) = params.person_needle() else {
        return Ok(None);
    };
    let ids = person_ids(backend, fields, needle)?;
    if ids.is_empty() {
        return Ok(None);
    }

    Ok(Some(
        Pipeline::over(PRINCIPALS)
            .matching(vec![
                Predicate::one_of(pr_person, ids),
                Predicate::one_of(category, acting()),
            ])
            .group(vec![("movie_id", Expr::field(pr_movie))], vec![])
            .lookup(MOVIES, "_id.movie_id", movie_id, "m")
            .unwind("m")
            .lookup(DIRECTORS, "_id.movie_id", d_movie, "d")
            .unwind("d")
            .group(
                vec![("director_id", Expr::field(at("d", d_person)))],
                vec![("films_together", Accumulator::count())],
            )
            .lookup(PERSONS, "_id.director_id", person_id, "p")
            .unwind("p")
            .sort(vec![
                SortKey::desc("films_together"),
                SortKey::asc(at("p", name)),
                SortKey::asc("_id.director_id"),
            ])
            .project(vec![
                ("director", Expr::field(at("p", name))),
                ("films_together", Expr::field("films_together")),
            ]),
    ))
}

pub fn popular_genres(
    _backend: &dyn DocumentBackend,
    fields: &ResolvedFields,
    params: &Params,
) -> EngineResult<Option<Pipeline>> {
    let [g_movie, genre, r_movie, rating] = fields.get_all([
        FieldRole::GenresMovieId,
        FieldRole::Genre,
        FieldRole::RatingsMovieId,
        FieldRole::AvgRating,
    ])?;

    Ok(Some(
        Pipeline::over(GENRES)
            .group(
                vec![
                    ("movie_id", Expr::field(g_movie)),
                    ("genre", Expr::field(genre)),
                ],
                vec![],
            )
            .lookup(RATINGS, "_id.movie_id", r_movie, "r")
            .unwind("r")
            .group(
                vec![("genre", Expr::field("_id.genre"))],
                vec![
                    ("film_count", Accumulator::count()),
                    ("avg_rating", Accumulator::Avg(Expr::field(at("r", rating)))),
                ],
            )
            .matching(vec![
                Predicate::gt("film_count", Value::from(params.min_title_count)),
                Predicate::gt("avg_rating", Value::from(params.min_avg_rating)),
            ])
            .project(vec![
                ("genre", Expr::field("_id.genre")),
                ("film_count", Expr::field("film_count")),
                ("avg_rating", Expr::field("avg_rating")),
            ])
            .sort(vec![SortKey::desc("avg_rating"), SortKey::asc("genre")]),
    ))
}

pub fn career_by_decade(
    backend: &dyn DocumentBackend,
    fields: &ResolvedFields,
    params: &Params,
) -> EngineResult<Option<Pipeline>> {
    let [pr_movie, pr_person, category, movie_id, year] = fields.get_all([
        FieldRole::PrincipalsMovieId,
        FieldRole::PrincipalsPersonId,
        FieldRole::PrincipalsCategory,
        FieldRole::MovieId,
        FieldRole::MovieYear,
    ])?;
    let [r_movie, rating] = fields.get_all([FieldRole::RatingsMovieId, FieldRole::AvgRating])?;

    let Some(needle) = params.person_needle() else {
        return Ok(None);
    };
    let ids = person_ids(backend, fields, needle)?;
    if ids.is_empty() {
        return Ok(None);
    }

    let decade = Expr::Multiply(vec![
        Expr::floor(Expr::divide(Expr::field(at("m", year)), Expr::lit(10))),
        Expr::lit(10),
    ]);

    Ok(Some(
        Pipeline::over(PRINCIPALS)
            .matching(vec![
                Predicate::one_of(pr_person, ids),
                Predicate::one_of(category, acting()),
            ])
            .group(vec![("movie_id", Expr::field(pr_movie))], vec![])
            .lookup(MOVIES, "_id.movie_id", movie_id, "m")
            .unwind("m")
            // absent and negative years are excluded, never bucketed
            .matching(vec![Predicate::gte(at("m", year), Value::from(0))])
            .lookup(RATINGS, "_id.movie_id", r_movie, "r")
            .unwind_preserving("r")
            .add_fields(vec![("decade", decade)])
            .group(
                vec![("decade", Expr::field("decade"))],
                vec![
                    ("film_count", Accumulator::count()),
                    ("avg_rating", Accumulator::Avg(Expr::field(at("r", rating)))),
                ],
            )
            .project(vec![
                ("decade", Expr::field("_id.decade")),
                ("film_count", Expr::field("film_count")),
                ("avg_rating", Expr::field("avg_rating")),
            ])
            .sort(vec![SortKey::asc("decade")]),
    ))
}

pub fn top_per_genre(
    _backend: &dyn DocumentBackend,
    fields: &ResolvedFields,
    _params: &Params,
) -> EngineResult<Option<Pipeline>> {
    let [g_movie, genre, movie_id, title, year] = fields.get_all([
        FieldRole::GenresMovieId,
        FieldRole::Genre,
        FieldRole::MovieId,
        FieldRole::MovieTitle,
        FieldRole::MovieYear,
    ])?;
    let [r_movie, rating, votes] = fields.get_all([
        FieldRole::RatingsMovieId,
        FieldRole::AvgRating,
        FieldRole::NumVotes,
    ])?;

    Ok(Some(
        Pipeline::over(GENRES)
            .group(
                vec![
                    ("movie_id", Expr::field(g_movie)),
                    ("genre", Expr::field(genre)),
                ],
                vec![],
            )
            .lookup(MOVIES, "_id.movie_id", movie_id, "m")
            .unwind("m")
            .lookup(RATINGS, "_id.movie_id", r_movie, "r")
            .unwind("r")
            .sort(vec![
                SortKey::desc(at("r", rating)),
                SortKey::desc(at("r", votes)),
                SortKey::asc(at("m", title)),
                SortKey::asc("_id.movie_id"),
            ])
            .group(
                vec![("genre", Expr::field("_id.genre"))],
                vec![("ranked", Accumulator::Push(Expr::Root))],
            )
            .project(vec![
                ("genre", Expr::field("_id.genre")),
                ("top", Expr::slice(Expr::field("ranked"), 3)),
            ])
            .unwind_indexed("top", "position")
            .project(vec![
                ("genre", Expr::field("genre")),
                ("rank", Expr::Add(vec![Expr::field("position"), Expr::lit(1)])),
                ("title", Expr::field(at("top.m", title))),
                ("year", Expr::field(at("top.m", year))),
                ("average_rating", Expr::field(at("top.r", rating))),
                ("num_votes", Expr::field(at("top.r", votes))),
            ])
            .sort(vec![SortKey::asc("genre"), SortKey::asc("rank")]),
    ))
}

pub fn breakthrough(
    _backend: &dyn DocumentBackend,
    fields: &ResolvedFields,
    params: &Params,
) -> EngineResult<Option<Pipeline>> {
    let [pr_movie, pr_person, movie_id, year] = fields.get_all([
        FieldRole::PrincipalsMovieId,
        FieldRole::PrincipalsPersonId,
        FieldRole::MovieId,
        FieldRole::MovieYear,
    ])?;
    let [r_movie, votes, person_id, name] = fields.get_all([
        FieldRole::RatingsMovieId,
        FieldRole::NumVotes,
        FieldRole::PersonId,
        FieldRole::PersonName,
    ])?;

    let votes = Expr::field(at("r", votes));
    let year = Expr::field(at("m", year));
    let threshold = Expr::lit(params.vote_threshold);
    let is_low = Expr::lt(votes.clone(), threshold.clone());
    let is_high = Expr::gte(votes, threshold);

    Ok(Some(
        Pipeline::over(PRINCIPALS)
            .group(
                vec![
                    ("person_id", Expr::field(pr_person)),
                    ("movie_id", Expr::field(pr_movie)),
                ],
                vec![],
            )
            .lookup(MOVIES, "_id.movie_id", movie_id, "m")
            .unwind("m")
            .lookup(RATINGS, "_id.movie_id", r_movie, "r")
            .unwind("r")
            .group(
                vec![("person_id", Expr::field("_id.person_id"))],
                vec![
                    (
                        "low_count",
                        Accumulator::Sum(Expr::cond(is_low.clone(), Expr::lit(1), Expr::lit(0))),
                    ),
                    (
                        "high_count",
                        Accumulator::Sum(Expr::cond(is_high.clone(), Expr::lit(1), Expr::lit(0))),
                    ),
                    (
                        "last_low_year",
                        Accumulator::Max(Expr::cond(is_low, year.clone(), Expr::lit(Value::Null))),
                    ),
                    (
                        "breakthrough_year",
                        Accumulator::Min(Expr::cond(is_high, year, Expr::lit(Value::Null))),
                    ),
                ],
            )
            .matching(vec![
                Predicate::gt("low_count", Value::from(0)),
                Predicate::gt("high_count", Value::from(0)),
            ])
            .matching_expr(Expr::lt(
                Expr::field("last_low_year"),
                Expr::field("breakthrough_year"),
            ))
            .lookup(PERSONS, "_id.person_id", person_id, "p")
            .unwind("p")
            .sort(vec![
                SortKey::desc("high_count"),
                SortKey::asc("breakthrough_year"),
                SortKey::asc(at("p", name)),
                SortKey::asc("_id.person_id"),
            ])
            .project(vec![
                ("name", Expr::field(at("p", name))),
                ("low_count", Expr::field("low_count")),
                ("high_count", Expr::field("high_count")),
                ("last_low_year", Expr::field("last_low_year")),
                ("breakthrough_year", Expr::field("breakthrough_year")),
            ]),
    ))
}

pub fn versatile_actors(
    _backend: &dyn DocumentBackend,
    fields: &ResolvedFields,
    params: &Params,
) -> EngineResult<Option<Pipeline>> {
    let [pr_movie, pr_person, category, movie_id] = fields.get_all([
        FieldRole::PrincipalsMovieId,
        FieldRole::PrincipalsPersonId,
        FieldRole::PrincipalsCategory,
        FieldRole::MovieId,
    ])?;
    let [g_movie, genre, person_id, name] = fields.get_all([
        FieldRole::GenresMovieId,
        FieldRole::Genre,
        FieldRole::PersonId,
        FieldRole::PersonName,
    ])?;

    Ok(Some(
        Pipeline::over(PRINCIPALS)
            .matching(vec![Predicate::one_of(category, acting())])
            .group(
                vec![
                    ("person_id", Expr::field(pr_person)),
                    ("movie_id", Expr::field(pr_movie)),
                ],
                vec![],
            )
            .lookup(MOVIES, "_id.movie_id", movie_id, "m")
            .unwind("m")
            .lookup(GENRES, "_id.movie_id", g_movie, "g")
            .unwind("g")
            .group(
                vec![("person_id", Expr::field("_id.person_id"))],
                vec![
                    ("genres", Accumulator::AddToSet(Expr::field(at("g", genre)))),
                    ("titles", Accumulator::AddToSet(Expr::field("_id.movie_id"))),
                ],
            )
            .add_fields(vec![
                ("genre_count", Expr::size(Expr::field("genres"))),
                ("title_count", Expr::size(Expr::field("titles"))),
            ])
            .matching(vec![Predicate::gte("genre_count", Value::from(params.min_genres))])
            .lookup(PERSONS, "_id.person_id", person_id, "p")
            .unwind("p")
            .sort(vec![
                SortKey::desc("genre_count"),
                SortKey::desc("title_count"),
                SortKey::asc(at("p", name)),
                SortKey::asc("_id.person_id"),
            ])
            .limit(params.versatile_limit)
            .project(vec![
                ("name", Expr::field(at("p", name))),
                ("genre_count", Expr::field("genre_count")),
                ("title_count", Expr::field("title_count")),
            ]),
    ))
}
