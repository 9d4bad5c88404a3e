//! Inspect and sequences command implementations.

use super::{open, OutputFormat};
use pride_core::query::Predicate;
use pride_core::store::DocumentStore;
use pride_core::Config;
use serde::Serialize;
use std::path::Path;

/// Database inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Database path.
    pub path: String,
    /// Mutation log size in bytes.
    pub log_size: u64,
    /// Document count per collection.
    pub collections: Vec<CollectionStats>,
}

/// Statistics for a single collection.
#[derive(Debug, Serialize)]
pub struct CollectionStats {
    /// Collection name.
    pub name: String,
    /// Number of documents.
    pub documents: u64,
}

/// Current value of one counter.
#[derive(Debug, Serialize)]
pub struct SequenceValue {
    /// Sequence name.
    pub name: String,
    /// Values handed out so far.
    pub value: u64,
}

/// Runs the inspect command.
pub fn run(
    path: &Path,
    config: Config,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = open(path, config)?;

    let mut collections = Vec::new();
    for name in db.collection_names() {
        let documents = db.count(&name, &Predicate::All)?;
        collections.push(CollectionStats { name, documents });
    }
    let result = InspectResult {
        path: path.display().to_string(),
        log_size: db.log_size()?,
        collections,
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => {
            println!("Database: {}", result.path);
            println!("Log size: {} bytes", result.log_size);
            for stats in &result.collections {
                println!("  {:<12} {}", stats.name, stats.documents);
            }
        }
    }
    Ok(())
}

/// Runs the sequences command.
pub fn sequences(
    path: &Path,
    config: Config,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = open(path, config)?;
    let values: Vec<SequenceValue> = db
        .sequences()
        .into_iter()
        .map(|(name, value)| SequenceValue { name, value })
        .collect();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&values)?),
        OutputFormat::Text => {
            if values.is_empty() {
                println!("No sequences");
            }
            for seq in &values {
                println!("{:<16} {}", seq.name, seq.value);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::insert;
    use tempfile::TempDir;

    #[test]
    fn inspect_and_sequences_report_populated_database() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("archive");
        insert::file(&path, Config::default(), "a.raw".into(), None, Vec::new(), None).unwrap();

        for format in [OutputFormat::Text, OutputFormat::Json] {
            run(&path, Config::default(), format).unwrap();
            sequences(&path, Config::default(), format).unwrap();
        }
    }

    #[test]
    fn missing_database_is_an_error() {
        let dir = TempDir::new().unwrap();
        let config = Config::default().create_if_missing(false);
        assert!(run(&dir.path().join("absent"), config, OutputFormat::Text).is_err());
    }
}
