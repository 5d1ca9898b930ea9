//! Index Controller Tests
//!
//! Invariants:
//! - apply and drop are idempotent
//! - the index set never changes a relational result
//! - the planner reads through the index set once it is applied
//! - indexes persist with the database file

mod common;

use cinebench::adapter::{BackendHandle, ExecutionAdapter};
use cinebench::catalogue::{explain, Computation};
use cinebench::index::{default_index_set, IndexController, IndexSpec};
use cinebench::record::{fingerprint, Record, FLOAT_TOLERANCE};
use cinebench::relational::{create_schema, RelationalBackend, SqliteBackend};
use tempfile::tempdir;

use common::{dataset, fixture, params};

fn relational_results(backend: &SqliteBackend) -> Vec<Vec<Record>> {
    let adapter = ExecutionAdapter::new();
    let params = params();
    Computation::ALL
        .iter()
        .map(|c| {
            adapter
                .run_computation(*c, BackendHandle::Relational(backend), &params)
                .unwrap()
        })
        .collect()
}

// =============================================================================
// Result Stability
// =============================================================================

/// Every computation returns identical records with and without indexes.
#[test]
fn test_indexes_do_not_change_results() {
    let fx = fixture();
    let controller = IndexController::new(&fx.sqlite);

    controller.drop_all().unwrap();
    let baseline = relational_results(&fx.sqlite);

    controller.apply(&default_index_set()).unwrap();
    let indexed = relational_results(&fx.sqlite);

    for ((computation, a), b) in Computation::ALL.iter().zip(&baseline).zip(&indexed) {
        assert_eq!(a.len(), b.len(), "{}", computation);
        for (x, y) in a.iter().zip(b) {
            assert!(x.approx_eq(y, FLOAT_TOLERANCE), "{}: {:?} vs {:?}", computation, x, y);
        }
        assert_eq!(fingerprint(a), fingerprint(b));
    }
}

// =============================================================================
// Plans
// =============================================================================

/// Without secondary indexes no plan step names one.
#[test]
fn test_baseline_plans_use_no_secondary_index() {
    let fx = fixture();
    IndexController::new(&fx.sqlite).drop_all().unwrap();

    for computation in Computation::ALL {
        let plan = explain(&fx.sqlite, computation, &params()).unwrap();
        assert!(!plan.steps.is_empty());
        for spec in default_index_set() {
            assert!(!plan.uses_index(&spec.name), "{}: {:?}", computation, plan.steps);
        }
    }
}

/// With the set applied, the join on principals reads through an index.
#[test]
fn test_indexed_plans_use_the_set() {
    let fx = fixture();
    let set = default_index_set();
    IndexController::new(&fx.sqlite).apply(&set).unwrap();

    let used = Computation::ALL.iter().any(|c| {
        let plan = explain(&fx.sqlite, *c, &params()).unwrap();
        set.iter().any(|spec| plan.uses_index(&spec.name))
    });
    assert!(used);
}

/// A blank person name short-circuits, so there is no plan to show.
#[test]
fn test_explain_short_circuit() {
    let fx = fixture();
    let mut params = params();
    params.person_name = String::new();

    let plan = explain(&fx.sqlite, Computation::Filmography, &params).unwrap();
    assert!(plan.sql.is_none());
    assert!(plan.steps.is_empty());
}

// =============================================================================
// Persistence
// =============================================================================

/// Applied indexes survive closing and reopening the file.
#[test]
fn test_indexes_persist_across_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bench.db");

    let mut backend = SqliteBackend::create(&path).unwrap();
    create_schema(&backend).unwrap();
    dataset().load_into(&mut backend).unwrap();
    let change = IndexController::new(&backend)
        .apply(&default_index_set())
        .unwrap();
    assert_eq!(change.changed.len(), 5);
    assert!(change.footprint_after > change.footprint_before);
    backend.close().unwrap();

    let backend = SqliteBackend::open(&path).unwrap();
    let controller = IndexController::new(&backend);
    assert!(controller
        .status(&default_index_set())
        .unwrap()
        .iter()
        .all(|s| s.present));
    assert!(controller.apply(&default_index_set()).unwrap().is_noop());
}

/// Partial overlap: only the missing indexes are created.
#[test]
fn test_apply_reports_changed_and_unchanged() {
    let fx = fixture();
    let controller = IndexController::new(&fx.sqlite);
    let set = default_index_set();
    controller.apply(&set[..2]).unwrap();

    let change = controller.apply(&set).unwrap();
    assert_eq!(change.unchanged, vec!["idx_persons_name", "idx_principals_person"]);
    assert_eq!(change.changed.len(), 3);
    assert_eq!(fx.sqlite.indexes().unwrap().len(), 5);
}

/// A composite index from configuration is created like the defaults.
#[test]
fn test_composite_index() {
    let fx = fixture();
    let controller = IndexController::new(&fx.sqlite);
    let spec = IndexSpec::new("idx_ratings_votes", "ratings", &["num_votes", "average_rating"]);

    controller.apply(std::slice::from_ref(&spec)).unwrap();
    let present = fx.sqlite.indexes().unwrap();
    assert_eq!(present.len(), 1);
    assert_eq!(present[0].name, "idx_ratings_votes");
    assert_eq!(present[0].table, "ratings");
}
