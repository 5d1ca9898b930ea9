//! Schema Drift Tests
//!
//! The document store may name fields differently from the relational
//! schema. Invariants:
//! - resolved names are used, so drifted stores give the same records
//! - a role that cannot be resolved skips only the computations needing it
//! - skipping never aborts a run

mod common;

use serde_json::{Map, Value};

use cinebench::adapter::{BackendHandle, ExecutionAdapter};
use cinebench::catalogue::Computation;
use cinebench::config::BenchConfig;
use cinebench::document::{DocumentBackend, DocumentStore};
use cinebench::harness::{BenchRunner, BenchSession, RunPlan, VariantOutcome};
use cinebench::record::{records_equivalent, FLOAT_TOLERANCE};
use cinebench::schema::{FieldRole, SchemaResolver};

use common::{fixture, params};

// =============================================================================
// Helper Functions
// =============================================================================

/// Copies `store` into a new store, applying (collection, from, to) renames
fn drifted(store: &DocumentStore, renames: &[(&str, &str, &str)]) -> DocumentStore {
    let mut out = DocumentStore::new();
    for (name, collection) in store.collections() {
        let docs: Vec<Value> = collection
            .documents()
            .iter()
            .map(|doc| rename_fields(doc, name, renames))
            .collect();
        out.insert_many(name, docs).unwrap();
    }
    out
}

fn rename_fields(doc: &Value, collection: &str, renames: &[(&str, &str, &str)]) -> Value {
    let mut renamed = Map::new();
    if let Value::Object(fields) = doc {
        for (key, value) in fields {
            let key = renames
                .iter()
                .find(|(c, from, _)| *c == collection && from == key)
                .map_or(key.as_str(), |(_, _, to)| *to);
            renamed.insert(key.to_string(), value.clone());
        }
    }
    Value::Object(renamed)
}

fn imdb_style(store: &DocumentStore) -> DocumentStore {
    let mut renames = vec![
        ("movies", "primary_title", "title"),
        ("movies", "start_year", "release_year"),
        ("persons", "name", "primary_name"),
        ("ratings", "average_rating", "avg_rating"),
        ("ratings", "num_votes", "number_of_votes"),
        ("genres", "genre", "genres"),
        ("principals", "category", "role"),
        ("characters", "name", "character"),
    ];
    for collection in [
        "movies",
        "ratings",
        "genres",
        "principals",
        "characters",
        "directors",
    ] {
        renames.push((collection, "movie_id", "tconst"));
    }
    for collection in ["persons", "principals", "characters", "directors"] {
        renames.push((collection, "person_id", "nconst"));
    }
    drifted(store, &renames)
}

fn plan() -> RunPlan {
    let mut plan = RunPlan::from_config(&BenchConfig::default()).unwrap();
    plan.params = params();
    plan.repeats = 1;
    plan.warmup = 0;
    plan
}

// =============================================================================
// Resolution
// =============================================================================

/// Every role resolves to the drifted name.
#[test]
fn test_drifted_names_resolve() {
    let fx = fixture();
    let store = imdb_style(&fx.store);
    let fields = SchemaResolver::resolve_strict(&store).unwrap();

    assert_eq!(fields.get(FieldRole::MovieId).unwrap(), "tconst");
    assert_eq!(fields.get(FieldRole::PersonId).unwrap(), "nconst");
    assert_eq!(fields.get(FieldRole::MovieTitle).unwrap(), "title");
    assert_eq!(fields.get(FieldRole::MovieYear).unwrap(), "release_year");
    assert_eq!(fields.get(FieldRole::PersonName).unwrap(), "primary_name");
    assert_eq!(fields.get(FieldRole::AvgRating).unwrap(), "avg_rating");
    assert_eq!(fields.get(FieldRole::NumVotes).unwrap(), "number_of_votes");
    assert_eq!(fields.get(FieldRole::Genre).unwrap(), "genres");
    assert_eq!(fields.get(FieldRole::PrincipalsCategory).unwrap(), "role");
    assert_eq!(fields.get(FieldRole::CharacterName).unwrap(), "character");
    assert_eq!(fields.get(FieldRole::DirectorsPersonId).unwrap(), "nconst");
}

/// The undrifted store resolves to the flattened column names.
#[test]
fn test_flattened_names_resolve() {
    let fx = fixture();
    assert!(fx.fields.is_complete());
    assert_eq!(fx.fields.get(FieldRole::MovieTitle).unwrap(), "primary_title");
    assert_eq!(fx.fields.get(FieldRole::MovieYear).unwrap(), "start_year");
    assert_eq!(fx.fields.get(FieldRole::CharacterName).unwrap(), "name");
}

// =============================================================================
// Equivalence Under Drift
// =============================================================================

/// A drifted store returns the same records as the relational side.
#[test]
fn test_drifted_store_matches_relational() {
    let fx = fixture();
    let store = imdb_style(&fx.store);
    let fields = SchemaResolver::resolve(&store).unwrap();
    let adapter = ExecutionAdapter::new();
    let params = params();

    for computation in Computation::ALL {
        let relational = adapter
            .run_computation(computation, BackendHandle::Relational(&fx.sqlite), &params)
            .unwrap();
        let document = adapter
            .run_computation(
                computation,
                BackendHandle::Document {
                    store: &store,
                    fields: &fields,
                },
                &params,
            )
            .unwrap();
        assert!(
            records_equivalent(&relational, &document, FLOAT_TOLERANCE),
            "{}: {:?} vs {:?}",
            computation,
            relational,
            document
        );
    }
}

/// An empty characters collection falls back to the inherited names.
#[test]
fn test_empty_characters_collection() {
    let fx = fixture();
    let mut store = imdb_style(&fx.store);
    store.drop_collection("characters").unwrap();
    assert_eq!(store.count("characters").unwrap(), 0);

    let fields = SchemaResolver::resolve_strict(&store).unwrap();
    assert_eq!(fields.get(FieldRole::CharactersMovieId).unwrap(), "tconst");
    assert_eq!(fields.get(FieldRole::CharactersPersonId).unwrap(), "nconst");
    assert_eq!(fields.get(FieldRole::CharacterName).unwrap(), "character");

    let records = ExecutionAdapter::new()
        .run_computation(
            Computation::MultiRole,
            BackendHandle::Document {
                store: &store,
                fields: &fields,
            },
            &params(),
        )
        .unwrap();
    assert!(records.is_empty());
}

// =============================================================================
// Unresolvable Roles
// =============================================================================

/// A rating field with no known name fails only the roles that need it.
#[test]
fn test_unresolved_role_fails_at_build() {
    let fx = fixture();
    let store = drifted(&fx.store, &[("ratings", "average_rating", "score")]);
    let fields = SchemaResolver::resolve(&store).unwrap();
    assert!(!fields.is_complete());
    assert!(SchemaResolver::resolve_strict(&store).is_err());

    let adapter = ExecutionAdapter::new();
    let handle = BackendHandle::Document {
        store: &store,
        fields: &fields,
    };
    let err = adapter
        .run_computation(Computation::PopularGenres, handle, &params())
        .unwrap_err();
    assert!(err.is_schema_resolution());

    let handle = BackendHandle::Document {
        store: &store,
        fields: &fields,
    };
    let rows = adapter
        .run_computation(Computation::DirectorCollaborations, handle, &params())
        .unwrap();
    assert_eq!(rows.len(), 5);
}

/// The runner skips what cannot resolve and still completes the rest.
#[test]
fn test_run_continues_past_skipped_computations() {
    let fx = fixture();
    let store = drifted(&fx.store, &[("ratings", "average_rating", "score")]);
    let mut session = BenchSession::new(fx.sqlite, Some(store));

    let runner = BenchRunner::new(plan());
    let report = runner.run(&mut session).unwrap();
    assert_eq!(report.rows.len(), 9);

    for computation in [
        Computation::Filmography,
        Computation::TopInGenre,
        Computation::PopularGenres,
        Computation::CareerByDecade,
        Computation::TopPerGenre,
    ] {
        let row = report.row(computation).unwrap();
        assert!(row.baseline.is_completed());
        assert!(matches!(row.document, VariantOutcome::Skipped { .. }), "{}", computation);
        assert_eq!(row.backends_agree, None);
    }
    for computation in [
        Computation::MultiRole,
        Computation::DirectorCollaborations,
        Computation::Breakthrough,
        Computation::VersatileActors,
    ] {
        let row = report.row(computation).unwrap();
        assert!(row.document.is_completed(), "{}", computation);
        assert_eq!(row.backends_agree, Some(true));
    }
    assert_eq!(report.metrics.skipped, 5);
    assert_eq!(report.metrics.failed, 0);
    session.close().unwrap();
}
