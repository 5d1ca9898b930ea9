//! CLI argument definitions using clap
//!
//! Commands:
//! - cinebench bench --config <path>
//! - cinebench run <computation> --backend <relational|document>
//! - cinebench explain [computation]
//! - cinebench indexes <apply|drop|status>
//! - cinebench status
//! - cinebench migrate
//! - cinebench seed --fixture <path>

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::catalogue::Params;

/// cinebench - cross-backend analytical query benchmark
#[derive(Parser, Debug)]
#[command(name = "cinebench")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Options every command takes
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Path to configuration file
    #[arg(long, default_value = "./cinebench.json")]
    pub config: PathBuf,

    /// Minimum log severity (trace, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

/// Overrides for the computation parameters of the configuration
#[derive(Args, Debug, Clone, Default)]
pub struct ParamArgs {
    /// Person name substring (Q1, Q4, Q6)
    #[arg(long)]
    pub person: Option<String>,

    /// Genre (Q2)
    #[arg(long)]
    pub genre: Option<String>,

    /// First year of the range (Q2)
    #[arg(long)]
    pub year_from: Option<i64>,

    /// Last year of the range (Q2)
    #[arg(long)]
    pub year_to: Option<i64>,

    /// Result cap (Q2)
    #[arg(long)]
    pub top_n: Option<usize>,

    /// Mean rating lower bound (Q5)
    #[arg(long)]
    pub min_rating: Option<f64>,

    /// Title count lower bound (Q5)
    #[arg(long)]
    pub min_titles: Option<i64>,

    /// High-visibility vote mark (Q8)
    #[arg(long)]
    pub vote_threshold: Option<i64>,

    /// Minimum distinct genres (Q9)
    #[arg(long)]
    pub min_genres: Option<i64>,
}

impl ParamArgs {
    /// Applies every given override
    pub fn apply(&self, params: &mut Params) {
        if let Some(person) = &self.person {
            params.person_name = person.clone();
        }
        if let Some(genre) = &self.genre {
            params.genre = genre.clone();
        }
        if let Some(v) = self.year_from {
            params.year_from = v;
        }
        if let Some(v) = self.year_to {
            params.year_to = v;
        }
        if let Some(v) = self.top_n {
            params.top_n = v;
        }
        if let Some(v) = self.min_rating {
            params.min_avg_rating = v;
        }
        if let Some(v) = self.min_titles {
            params.min_title_count = v;
        }
        if let Some(v) = self.vote_threshold {
            params.vote_threshold = v;
        }
        if let Some(v) = self.min_genres {
            params.min_genres = v;
        }
    }
}

/// Report rendering
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Csv,
    Json,
}

/// Backend selector for `run`
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendArg {
    Relational,
    Document,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Time every computation: baseline, indexed and document
    Bench {
        #[command(flatten)]
        common: CommonArgs,

        #[command(flatten)]
        params: ParamArgs,

        /// Timed invocations per variant
        #[arg(long)]
        repeats: Option<u32>,

        /// Untimed invocations before timing
        #[arg(long)]
        warmup: Option<u32>,

        /// Computations to run (comma separated keys)
        #[arg(long, value_delimiter = ',')]
        only: Vec<String>,

        /// Also write the report to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Output format on stdout
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Run one computation and print its records as JSON lines
    Run {
        /// Computation key, label or number
        computation: String,

        #[command(flatten)]
        common: CommonArgs,

        #[command(flatten)]
        params: ParamArgs,

        #[arg(long, value_enum, default_value = "relational")]
        backend: BackendArg,
    },

    /// Show the relational query plan of one or every computation
    Explain {
        /// Computation key, label or number (default: all)
        computation: Option<String>,

        #[command(flatten)]
        common: CommonArgs,

        #[command(flatten)]
        params: ParamArgs,
    },

    /// Manage the relational secondary index set
    Indexes {
        #[command(flatten)]
        common: CommonArgs,

        #[command(subcommand)]
        action: IndexAction,
    },

    /// Table, index and collection counts of both backends
    Status {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Copy every relational table into the document store directory
    Migrate {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Create the relational schema and load a JSON fixture
    Seed {
        #[command(flatten)]
        common: CommonArgs,

        /// Fixture file
        #[arg(long)]
        fixture: PathBuf,

        /// Also populate the document store
        #[arg(long)]
        migrate: bool,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexAction {
    /// Create the configured indexes
    Apply,
    /// Drop the configured indexes
    Drop,
    /// Drop every secondary index
    DropAll,
    /// Show which configured indexes are present
    Status,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
