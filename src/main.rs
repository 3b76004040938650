//! Book provider command line.
//!
//! # Architecture Overview
//!
//! ```text
//!   CLI args ──▶ ResourceIdentifier ──▶ ResourceRouter ──▶ PatternMatcher
//!                                           │
//!                                           ▼ translated query
//!                                       SqliteStore ──▶ rows ──▶ JSON on stdout
//! ```
//!
//! Configuration comes from `--config` (TOML) or the built-in books provider.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::json;

use book_provider::config::{self, ProviderConfig};
use book_provider::observability::logging;
use book_provider::query::{Columns, Predicate, QueryDescriptor, Value};
use book_provider::routing::{MatchResult, ResourceIdentifier, ResourceRouter};
use book_provider::storage::SqliteStore;

#[derive(Parser)]
#[command(name = "book-provider")]
#[command(about = "Query a URI-addressed book provider", long_about = None)]
struct Cli {
    /// Provider configuration file (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a query and print the rows as JSON
    Query {
        /// Resource identifier, e.g. content://com.training.contentprovidersample/books
        uri: String,

        /// Column to return (repeatable; all columns when omitted)
        #[arg(long = "column")]
        columns: Vec<String>,

        /// Selection with `?` placeholders
        #[arg(long = "where")]
        selection: Option<String>,

        /// Value bound to the next placeholder (repeatable)
        #[arg(long = "arg")]
        args: Vec<String>,

        /// Sort order, e.g. "author DESC"
        #[arg(long)]
        sort: Option<String>,
    },
    /// Show which resource kind an identifier resolves to
    Match {
        uri: String,
    },
    /// Look up the content type of a resource
    Type {
        uri: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => ProviderConfig::default(),
    };
    logging::init_logging(&config.observability);

    tracing::info!(
        authority = %config.authority,
        database = %config.storage.database_path,
        "book-provider v0.1.0 starting"
    );

    let store = SqliteStore::from_config(&config.storage)?;
    let router = ResourceRouter::from_config(&config, store)?;

    match cli.command {
        Commands::Query {
            uri,
            columns,
            selection,
            args,
            sort,
        } => {
            let identifier = ResourceIdentifier::parse(&uri)?;
            let columns = if columns.is_empty() {
                Columns::All
            } else {
                Columns::Named(columns)
            };
            let predicate = Predicate::new(
                selection.unwrap_or_default(),
                args.iter().map(|a| parse_arg(a)).collect(),
            );

            let mut query = QueryDescriptor::all()
                .with_columns(columns)
                .with_predicate(predicate);
            query.sort_order = sort;

            let rows = router.query(&identifier, query)?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        Commands::Match { uri } => {
            let identifier = ResourceIdentifier::parse(&uri)?;
            let output = match router.match_identifier(&identifier) {
                MatchResult::Matched { kind, id } => json!({ "kind": kind, "id": id }),
                MatchResult::NoMatch => json!({ "kind": null, "id": null }),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Type { uri } => {
            let identifier = ResourceIdentifier::parse(&uri)?;
            println!("{}", router.resource_type(&identifier)?);
        }
    }

    Ok(())
}

/// Integers bind as integers, everything else as text.
fn parse_arg(arg: &str) -> Value {
    arg.parse::<i64>()
        .map(Value::Integer)
        .unwrap_or_else(|_| Value::from(arg))
}
