//! CLI command implementations.

pub mod insert;
pub mod inspect;
pub mod search;

use clap::ValueEnum;
use pride_core::store::Database;
use pride_core::Config;
use std::path::Path;
use std::sync::Arc;

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One line per item.
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Searchable collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CollectionArg {
    /// Archive files
    Files,
    /// Analyses
    Analyses,
    /// Protein evidences
    Proteins,
    /// Peptide evidences
    Peptides,
    /// PSM summaries
    Psms,
    /// MS runs of raw files
    MsRuns,
}

/// Opens the database directory at `path`.
pub fn open(path: &Path, config: Config) -> Result<Arc<Database>, Box<dyn std::error::Error>> {
    Ok(Arc::new(Database::open(path, config)?))
}
