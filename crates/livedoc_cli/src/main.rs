//! livedoc CLI
//!
//! Command-line tools for exercising live bindings against fixture data.
//!
//! # Commands
//!
//! - `query` - Bind a collection and print the delivered snapshot
//! - `averages` - Per-group and overall averages of a numeric field
//! - `replay` - Apply a script of writes and report each delivery

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// livedoc command-line tools.
#[derive(Parser)]
#[command(name = "livedoc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bind a collection and print the matching documents
    Query {
        /// JSON fixture to seed the store from
        #[arg(short, long)]
        fixture: PathBuf,

        /// Collection to bind
        #[arg(short, long)]
        collection: String,

        /// Filter such as `studentId=u1` or `value>=4` (repeatable)
        #[arg(short = 'w', long = "where")]
        filters: Vec<String>,

        /// Sort field, optionally suffixed with `:asc` or `:desc`
        #[arg(short, long)]
        order_by: Option<String>,

        /// Maximum number of documents
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Average a numeric field per group and overall
    Averages {
        /// JSON fixture to seed the store from
        #[arg(short, long)]
        fixture: PathBuf,

        /// Collection to bind
        #[arg(short, long)]
        collection: String,

        /// Filter such as `studentId=u1` (repeatable)
        #[arg(short = 'w', long = "where")]
        filters: Vec<String>,

        /// Field to group by
        #[arg(short, long, default_value = "subject")]
        group_by: String,

        /// Numeric field to average
        #[arg(long, default_value = "value")]
        field: String,

        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Apply a JSON script of writes through a binding
    Replay {
        /// JSON fixture to seed the store from
        #[arg(short, long)]
        fixture: PathBuf,

        /// Collection to bind and write to
        #[arg(short, long)]
        collection: String,

        /// Script file: a JSON array of create/update/delete operations
        #[arg(short, long)]
        script: PathBuf,

        /// Filter such as `status=pending` (repeatable)
        #[arg(short = 'w', long = "where")]
        filters: Vec<String>,

        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Query {
            fixture,
            collection,
            filters,
            order_by,
            limit,
            format,
        } => {
            let query = commands::build_query(&filters, order_by.as_deref(), limit)?;
            commands::query::run(&fixture, &collection, query, &format)?;
        }
        Commands::Averages {
            fixture,
            collection,
            filters,
            group_by,
            field,
            format,
        } => {
            let query = commands::build_query(&filters, None, None)?;
            commands::averages::run(&fixture, &collection, query, &group_by, &field, &format)?;
        }
        Commands::Replay {
            fixture,
            collection,
            script,
            filters,
            format,
        } => {
            let query = commands::build_query(&filters, None, None)?;
            commands::replay::run(&fixture, &collection, query, &script, &format)?;
        }
        Commands::Version => {
            println!("livedoc CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
