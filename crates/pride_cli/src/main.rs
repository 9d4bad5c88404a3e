//! PRIDE archive CLI
//!
//! Command-line access to an archive database.
//!
//! # Commands
//!
//! - `search` - Run a filter query against a collection
//! - `insert-file` - Store a file and mint its accession
//! - `insert-analysis` - Store an analysis and mint its accession
//! - `sequences` - Show accession counters
//! - `inspect` - Show collection sizes and log size

mod commands;

use clap::{Parser, Subcommand};
use commands::{CollectionArg, OutputFormat};
use pride_core::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// PRIDE archive command-line tools.
#[derive(Parser)]
#[command(name = "pride-archive")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the database directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a filter query against a collection
    Search {
        /// Collection to search
        #[arg(value_enum)]
        collection: CollectionArg,

        /// Filter, e.g. "projectAccessions=all=PXD000001,fileCategory==RAW"
        #[arg(short, long, default_value = "")]
        filter: String,

        /// Zero-based page number
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        page: i64,

        /// Page size (defaults to the configured page size)
        #[arg(long, allow_negative_numbers = true)]
        size: Option<i64>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Store a file and mint its accession
    InsertFile {
        /// File name
        file_name: String,

        /// File category, e.g. RAW or RESULT
        #[arg(short, long)]
        category: Option<String>,

        /// Project accession (repeatable)
        #[arg(long = "project")]
        projects: Vec<String>,

        /// File size in bytes
        #[arg(long)]
        size: Option<u64>,
    },

    /// Store an analysis and mint its accession
    InsertAnalysis {
        /// Analysis title
        title: String,

        /// Free-text description
        #[arg(short, long)]
        description: Option<String>,

        /// Project accession (repeatable)
        #[arg(long = "project")]
        projects: Vec<String>,
    },

    /// Show accession counters
    Sequences {
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show collection sizes and log size
    Inspect {
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::default();

    match cli.command {
        Commands::Search {
            collection,
            filter,
            page,
            size,
            format,
        } => {
            let path = cli.path.ok_or("Database path required for search")?;
            let size = size.unwrap_or_else(|| {
                i64::try_from(config.default_page_size).unwrap_or(i64::MAX)
            });
            let request = commands::search::SearchRequest {
                collection,
                filter: &filter,
                page,
                size,
            };
            commands::search::run(&path, config, &request, format)?;
        }
        Commands::InsertFile {
            file_name,
            category,
            projects,
            size,
        } => {
            let path = cli.path.ok_or("Database path required for insert-file")?;
            commands::insert::file(&path, config, file_name, category, projects, size)?;
        }
        Commands::InsertAnalysis {
            title,
            description,
            projects,
        } => {
            let path = cli.path.ok_or("Database path required for insert-analysis")?;
            commands::insert::analysis(&path, config, title, description, projects)?;
        }
        Commands::Sequences { format } => {
            let path = cli.path.ok_or("Database path required for sequences")?;
            commands::inspect::sequences(&path, config, format)?;
        }
        Commands::Inspect { format } => {
            let path = cli.path.ok_or("Database path required for inspect")?;
            commands::inspect::run(&path, config, format)?;
        }
        Commands::Version => {
            println!("PRIDE archive CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("PRIDE core v{}", pride_core::VERSION);
        }
    }

    Ok(())
}
