//! Shared fixture for integration tests
//!
//! One dataset snapshot, loaded into SQLite and flattened into the document
//! store, so both backends see identical data.
//!
//! Contents worth knowing when writing assertions:
//! - 12 rated dramas within 1990..=2020, one drama from 1988, one unrated
//!   drama from 2005
//! - "Apollo 13" and "Philadelphia" tie on rating and votes
//! - Peter Sellers plays {Mandrake, Mandrake, Muffley} in one title and
//!   three distinct characters in another
//! - Dana Interleave: votes {50000, 300000, 100000} in {2001, 2010, 2015}
//! - Riley Rising and Meg Ryan break through; Sam Sameyear does not (same year)

#![allow(dead_code)]

use cinebench::catalogue::Params;
use cinebench::dataset::Dataset;
use cinebench::document::{flatten, DocumentStore};
use cinebench::relational::{create_schema, SqliteBackend};
use cinebench::schema::{ResolvedFields, SchemaResolver};

pub const TOM: &str = "nm0000158";
pub const MEG: &str = "nm0000212";
pub const SELLERS: &str = "nm0000634";

/// (id, title, year, rating, votes)
const DRAMAS: [(&str, &str, i64, f64, i64); 12] = [
    ("tt0107818", "Philadelphia", 1993, 7.7, 300000),
    ("tt0109830", "Forrest Gump", 1994, 8.8, 2100000),
    ("tt0112384", "Apollo 13", 1995, 7.7, 300000),
    ("tt0162222", "Cast Away", 2000, 7.8, 620000),
    ("tt0257044", "Road to Perdition", 2002, 7.7, 270000),
    ("tt0120689", "The Green Mile", 1999, 8.6, 1300000),
    ("tt0120815", "Saving Private Ryan", 1998, 8.6, 1400000),
    ("tt1535109", "Captain Phillips", 2013, 7.8, 470000),
    ("tt3682448", "Bridge of Spies", 2015, 7.6, 310000),
    ("tt3263904", "Sully", 2016, 7.4, 270000),
    ("tt6294822", "The Post", 2017, 7.2, 190000),
    ("tt1583420", "Larry Crowne", 2011, 6.1, 70000),
];

/// Q2 over the defaults with N = 10, in expected order
pub const TOP_TEN_DRAMAS: [&str; 10] = [
    "Forrest Gump",
    "Saving Private Ryan",
    "The Green Mile",
    "Cast Away",
    "Captain Phillips",
    "Apollo 13",
    "Philadelphia",
    "Road to Perdition",
    "Bridge of Spies",
    "Sully",
];

pub fn dataset() -> Dataset {
    let mut data = Dataset::new();

    data.add_person(TOM, "Tom Hanks")
        .add_person(MEG, "Meg Ryan")
        .add_person(SELLERS, "Peter Sellers")
        .add_person("nm0000165", "Ron Howard")
        .add_person("nm0000709", "Robert Zemeckis")
        .add_person("nm0001188", "Nora Ephron")
        .add_person("nm0000229", "Steven Spielberg")
        .add_person("nm0001508", "Penny Marshall")
        .add_person("nm9000001", "Dana Interleave")
        .add_person("nm9000002", "Riley Rising")
        .add_person("nm9000003", "Sam Sameyear");

    for (id, title, year, rating, votes) in DRAMAS {
        data.add_movie(id, title, Some(year))
            .add_rating(id, rating, votes)
            .add_genre(id, "Drama")
            .add_credit(id, TOM, "actor");
    }
    data.add_genre("tt0120815", "War");

    data.add_movie("tt0094737", "Big", Some(1988))
        .add_rating("tt0094737", 7.3, 220000)
        .add_genre("tt0094737", "Comedy")
        .add_genre("tt0094737", "Drama")
        .add_credit("tt0094737", TOM, "actor");
    data.add_movie("tt0108160", "Sleepless in Seattle", Some(1993))
        .add_rating("tt0108160", 6.8, 180000)
        .add_genre("tt0108160", "Comedy")
        .add_genre("tt0108160", "Romance")
        .add_credit("tt0108160", TOM, "actor")
        .add_credit("tt0108160", MEG, "actress");
    data.add_movie("tt0128853", "You've Got Mail", Some(1998))
        .add_rating("tt0128853", 6.7, 230000)
        .add_genre("tt0128853", "Comedy")
        .add_genre("tt0128853", "Romance")
        .add_credit("tt0128853", TOM, "actor")
        .add_credit("tt0128853", MEG, "actress")
        .add_credit("tt0128853", MEG, "producer");
    data.add_credit("tt6294822", TOM, "producer");

    // in range but unrated, so never part of an inner join with ratings
    data.add_movie("tt0400001", "Unrated Drama", Some(2005))
        .add_genre("tt0400001", "Drama");
    // no year, no rating, no genre
    data.add_movie("tt0400002", "Untitled Project", None)
        .add_credit("tt0400002", TOM, "actor");

    data.add_character("tt0109830", TOM, "Forrest Gump")
        .add_character("tt0162222", TOM, "Chuck Noland")
        .add_character("tt1535109", TOM, "Captain Richard Phillips")
        .add_character("tt6294822", TOM, "Ben Bradlee")
        .add_character("tt0108160", MEG, "Annie Reed");

    data.add_director("tt0112384", "nm0000165")
        .add_director("tt0109830", "nm0000709")
        .add_director("tt0162222", "nm0000709")
        .add_director("tt0108160", "nm0001188")
        .add_director("tt0128853", "nm0001188")
        .add_director("tt0120815", "nm0000229")
        .add_director("tt3682448", "nm0000229")
        .add_director("tt6294822", "nm0000229")
        .add_director("tt0094737", "nm0001508");
    data.add_credit("tt0112384", "nm0000165", "director");
    data.add_writer("tt0128853", "nm0001188");

    data.add_movie("tt0057012", "Dr. Strangelove", Some(1964))
        .add_rating("tt0057012", 8.4, 500000)
        .add_genre("tt0057012", "Comedy")
        .add_genre("tt0057012", "War")
        .add_credit("tt0057012", SELLERS, "actor")
        .add_character("tt0057012", SELLERS, "Mandrake")
        .add_character("tt0057012", SELLERS, "Mandrake")
        .add_character("tt0057012", SELLERS, "Muffley");
    data.add_movie("tt0053084", "The Mouse That Roared", Some(1959))
        .add_rating("tt0053084", 6.5, 10000)
        .add_genre("tt0053084", "Comedy")
        .add_genre("tt0053084", "Satire")
        .add_credit("tt0053084", SELLERS, "actor")
        .add_character("tt0053084", SELLERS, "Tully")
        .add_character("tt0053084", SELLERS, "Gloriana")
        .add_character("tt0053084", SELLERS, "Mountjoy");

    let thrillers: [(&str, &str, i64, f64, i64, &str); 7] = [
        ("tt0500001", "Quiet Start", 2001, 6.0, 50000, "nm9000001"),
        ("tt0500002", "Big Break", 2010, 6.4, 300000, "nm9000001"),
        ("tt0500003", "Small Return", 2015, 5.9, 100000, "nm9000001"),
        ("tt0500004", "Indie Debut", 2003, 6.5, 1000, "nm9000002"),
        ("tt0500005", "Blockbuster", 2012, 6.9, 500000, "nm9000002"),
        ("tt0500006", "First Light", 2005, 5.5, 5000, "nm9000003"),
        ("tt0500007", "Same Year Hit", 2005, 6.2, 250000, "nm9000003"),
    ];
    for (id, title, year, rating, votes, person) in thrillers {
        data.add_movie(id, title, Some(year))
            .add_rating(id, rating, votes)
            .add_genre(id, "Thriller")
            .add_credit(id, person, "actor");
    }

    data
}

/// Parameters with thresholds scaled to the fixture
pub fn params() -> Params {
    Params {
        top_n: 10,
        min_title_count: 3,
        min_avg_rating: 7.0,
        ..Params::default()
    }
}

/// Both backends over the same snapshot
pub struct Fixture {
    pub sqlite: SqliteBackend,
    pub store: DocumentStore,
    pub fields: ResolvedFields,
}

pub fn fixture() -> Fixture {
    fixture_from(&dataset())
}

pub fn fixture_from(data: &Dataset) -> Fixture {
    let mut sqlite = SqliteBackend::open_in_memory().expect("open sqlite");
    create_schema(&sqlite).expect("schema");
    data.load_into(&mut sqlite).expect("load fixture");

    let mut store = DocumentStore::new();
    flatten(&sqlite, &mut store).expect("flatten");
    let fields = SchemaResolver::resolve(&store).expect("resolve");

    Fixture {
        sqlite,
        store,
        fields,
    }
}
