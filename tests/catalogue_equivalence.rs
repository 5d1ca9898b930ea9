//! Cross-Backend Equivalence Tests
//!
//! For every catalogue computation the relational and document variants,
//! run over the same snapshot, must return the same records:
//! - same field names
//! - same values up to float rounding
//! - same order, since every sort carries a full tie-break

mod common;

use cinebench::adapter::{BackendHandle, ExecutionAdapter};
use cinebench::catalogue::{Computation, Params};
use cinebench::dataset::Dataset;
use cinebench::document::DocumentBackend;
use cinebench::record::{records_equivalent, Record, Scalar, FLOAT_TOLERANCE};
use serde_json::json;

use common::{fixture, fixture_from, params, Fixture};

// =============================================================================
// Helper Functions
// =============================================================================

fn run_both(fx: &Fixture, computation: Computation, params: &Params) -> (Vec<Record>, Vec<Record>) {
    let adapter = ExecutionAdapter::new();
    let relational = adapter
        .run_computation(computation, BackendHandle::Relational(&fx.sqlite), params)
        .unwrap();
    let document = adapter
        .run_computation(
            computation,
            BackendHandle::Document {
                store: &fx.store,
                fields: &fx.fields,
            },
            params,
        )
        .unwrap();
    (relational, document)
}

fn assert_same_ordered(computation: Computation, relational: &[Record], document: &[Record]) {
    assert_eq!(
        relational.len(),
        document.len(),
        "{}: relational {:?} vs document {:?}",
        computation,
        relational,
        document
    );
    for (i, (r, d)) in relational.iter().zip(document).enumerate() {
        assert!(
            r.approx_eq(d, FLOAT_TOLERANCE),
            "{} row {}: relational {:?} vs document {:?}",
            computation,
            i,
            r,
            d
        );
    }
}

fn texts<'a>(records: &'a [Record], field: &str) -> Vec<&'a str> {
    records
        .iter()
        .map(|r| r.get(field).and_then(Scalar::as_str).unwrap_or_default())
        .collect()
}

fn ints(records: &[Record], field: &str) -> Vec<i64> {
    records
        .iter()
        .filter_map(|r| r.get(field).and_then(Scalar::as_i64))
        .collect()
}

// =============================================================================
// Equivalence
// =============================================================================

/// All nine computations agree, in order, on the shared fixture.
#[test]
fn test_all_computations_agree() {
    let fx = fixture();
    let params = params();

    for computation in Computation::ALL {
        let (relational, document) = run_both(&fx, computation, &params);
        assert_same_ordered(computation, &relational, &document);
        assert!(records_equivalent(&relational, &document, FLOAT_TOLERANCE));
    }
}

/// Every computation returns rows on the fixture, so agreement is not vacuous.
#[test]
fn test_fixture_exercises_every_computation() {
    let fx = fixture();
    let params = params();

    for computation in Computation::ALL {
        let (relational, _) = run_both(&fx, computation, &params);
        assert!(!relational.is_empty(), "{} returned nothing", computation);
    }
}

/// Output fields are exactly the declared ones, in declared order.
#[test]
fn test_output_fields_match_declaration() {
    let fx = fixture();
    let params = params();

    for computation in Computation::ALL {
        let (relational, document) = run_both(&fx, computation, &params);
        for record in relational.iter().chain(&document) {
            let names: Vec<&str> = record.names().collect();
            assert_eq!(names, computation.output_fields(), "{}", computation);
        }
    }
}

/// Agreement holds for a parameter set other than the defaults.
#[test]
fn test_agreement_with_other_parameters() {
    let fx = fixture();
    let params = Params {
        person_name: "meg".to_string(),
        genre: "Comedy".to_string(),
        year_from: 1950,
        year_to: 1995,
        top_n: 2,
        min_title_count: 1,
        min_avg_rating: 6.0,
        vote_threshold: 100_000,
        min_genres: 2,
        versatile_limit: 2,
    };

    for computation in Computation::ALL {
        let (relational, document) = run_both(&fx, computation, &params);
        assert_same_ordered(computation, &relational, &document);
    }
}

/// A name matching nobody gives empty results on both sides.
#[test]
fn test_unmatched_name_is_empty_on_both() {
    let fx = fixture();
    let params = Params {
        person_name: "Nobody At All".to_string(),
        ..params()
    };

    for computation in [
        Computation::Filmography,
        Computation::DirectorCollaborations,
        Computation::CareerByDecade,
    ] {
        let (relational, document) = run_both(&fx, computation, &params);
        assert!(relational.is_empty());
        assert!(document.is_empty());
    }
}

/// A blank name is an empty result, not an error.
#[test]
fn test_blank_name_is_empty_on_both() {
    let fx = fixture();
    let params = Params {
        person_name: "   ".to_string(),
        ..params()
    };

    for computation in [
        Computation::Filmography,
        Computation::DirectorCollaborations,
        Computation::CareerByDecade,
    ] {
        let (relational, document) = run_both(&fx, computation, &params);
        assert!(relational.is_empty());
        assert!(document.is_empty());
    }
}

/// An unknown genre is unmatched, not a failure.
#[test]
fn test_unknown_genre_is_empty_on_both() {
    let fx = fixture();
    let params = Params {
        genre: "Opera".to_string(),
        ..params()
    };
    let (relational, document) = run_both(&fx, Computation::TopInGenre, &params);
    assert!(relational.is_empty());
    assert!(document.is_empty());
}

/// Document indexes change access paths, never results.
#[test]
fn test_document_indexes_do_not_change_results() {
    use cinebench::index::{default_document_roles, IndexController};

    let mut fx = fixture();
    let params = params();
    let before: Vec<Vec<Record>> = Computation::ALL
        .iter()
        .map(|c| run_both(&fx, *c, &params).1)
        .collect();

    let created =
        IndexController::apply_document(&mut fx.store, &fx.fields, &default_document_roles())
            .unwrap();
    assert!(created > 0);

    for (computation, expected) in Computation::ALL.iter().zip(&before) {
        let (_, after) = run_both(&fx, *computation, &params);
        assert_same_ordered(*computation, expected, &after);
    }
}

// =============================================================================
// Data Edge Cases
// =============================================================================

/// Name matching folds non-ASCII case the same way on both sides.
#[test]
fn test_accented_names_match_on_both() {
    let mut data = Dataset::new();
    data.add_person("nm1", "Émile Zola")
        .add_person("nm2", "Penélope Cruz")
        .add_person("nm3", "Pedro Almodóvar")
        .add_movie("tt1", "Nana", Some(1926))
        .add_rating("tt1", 6.5, 1000)
        .add_credit("tt1", "nm1", "actor")
        .add_movie("tt2", "Volver", Some(2006))
        .add_rating("tt2", 7.6, 100000)
        .add_credit("tt2", "nm2", "actress")
        .add_director("tt2", "nm3")
        .add_movie("tt3", "Broken Embraces", Some(2009))
        .add_rating("tt3", 7.1, 60000)
        .add_credit("tt3", "nm2", "actress")
        .add_director("tt3", "nm3");
    let fx = fixture_from(&data);

    let emile = Params {
        person_name: "émile".to_string(),
        ..Params::default()
    };
    let (relational, document) = run_both(&fx, Computation::Filmography, &emile);
    assert_eq!(texts(&relational, "title"), vec!["Nana"]);
    assert_same_ordered(Computation::Filmography, &relational, &document);

    let penelope = Params {
        person_name: "PENÉLOPE".to_string(),
        ..Params::default()
    };
    let (relational, document) = run_both(&fx, Computation::Filmography, &penelope);
    assert_eq!(texts(&relational, "title"), vec!["Broken Embraces", "Volver"]);
    assert_same_ordered(Computation::Filmography, &relational, &document);

    let (relational, document) = run_both(&fx, Computation::DirectorCollaborations, &penelope);
    assert_eq!(texts(&relational, "director"), vec!["Pedro Almodóvar"]);
    assert_eq!(ints(&relational, "films_together"), vec![2]);
    assert_same_ordered(Computation::DirectorCollaborations, &relational, &document);

    let (relational, document) = run_both(&fx, Computation::CareerByDecade, &penelope);
    assert_eq!(ints(&relational, "decade"), vec![2000]);
    assert_eq!(ints(&relational, "film_count"), vec![2]);
    assert_same_ordered(Computation::CareerByDecade, &relational, &document);
}

/// A genre tag repeated in the document store still counts its title once.
#[test]
fn test_repeated_genre_tag_counts_title_once() {
    let mut data = Dataset::new();
    data.add_person("nm1", "Ana Actor");
    for (id, title, rating) in [("tt1", "One", 9.0), ("tt2", "Two", 8.0), ("tt3", "Three", 7.0)] {
        data.add_movie(id, title, Some(2001))
            .add_rating(id, rating, 1000)
            .add_genre(id, "Drama")
            .add_credit(id, "nm1", "actress");
    }
    let mut fx = fixture_from(&data);
    fx.store
        .insert_many("genres", vec![json!({"movie_id": "tt1", "genre": "Drama"})])
        .unwrap();
    assert_eq!(fx.store.count("genres").unwrap(), 4);

    let (relational, document) = run_both(&fx, Computation::TopPerGenre, &Params::default());
    assert_eq!(texts(&document, "title"), vec!["One", "Two", "Three"]);
    assert_eq!(ints(&document, "rank"), vec![1, 2, 3]);
    assert_same_ordered(Computation::TopPerGenre, &relational, &document);

    let params = Params {
        min_title_count: 2,
        min_avg_rating: 0.0,
        ..Params::default()
    };
    let (relational, document) = run_both(&fx, Computation::PopularGenres, &params);
    assert_eq!(ints(&document, "film_count"), vec![3]);
    assert_same_ordered(Computation::PopularGenres, &relational, &document);

    for computation in [Computation::TopInGenre, Computation::VersatileActors] {
        let params = Params {
            min_genres: 1,
            ..Params::default()
        };
        let (relational, document) = run_both(&fx, computation, &params);
        assert_same_ordered(computation, &relational, &document);
    }
}

/// Rows equal on every displayed sort key fall back to the identifiers.
#[test]
fn test_identifier_breaks_remaining_ties() {
    let mut data = Dataset::new();
    data.add_person("nm1", "Sam Twin")
        .add_movie("tt2", "Hamlet", Some(1990))
        .add_rating("tt2", 7.0, 1000)
        .add_credit("tt2", "nm1", "actor")
        .add_character("tt2", "nm1", "Hamlet")
        .add_character("tt2", "nm1", "Ghost")
        .add_movie("tt1", "Hamlet", Some(1990))
        .add_rating("tt1", 6.0, 1000)
        .add_credit("tt1", "nm1", "actor")
        .add_character("tt1", "nm1", "Hamlet")
        .add_character("tt1", "nm1", "Ghost");
    let fx = fixture_from(&data);
    let params = Params {
        person_name: "sam".to_string(),
        ..Params::default()
    };

    let (relational, document) = run_both(&fx, Computation::Filmography, &params);
    let ratings: Vec<f64> = relational
        .iter()
        .filter_map(|r| r.get("average_rating").and_then(Scalar::as_f64))
        .collect();
    // tt1 before tt2 within each character
    assert_eq!(ratings, vec![6.0, 7.0, 6.0, 7.0]);
    assert_same_ordered(Computation::Filmography, &relational, &document);

    let (relational, document) = run_both(&fx, Computation::MultiRole, &params);
    assert_eq!(relational.len(), 2);
    assert_same_ordered(Computation::MultiRole, &relational, &document);
}
