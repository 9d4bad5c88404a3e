//! Benchmark utilities.

#![warn(missing_docs)]

use pride_core::model::ArchiveFile;
use pride_core::service::FileService;
use pride_core::store::{Database, SharedStore};
use pride_core::Config;
use std::sync::Arc;

/// Projects files are spread over.
pub const PROJECTS: usize = 10;

/// A fresh in-memory store.
pub fn memory_store() -> SharedStore {
    Arc::new(Database::open_in_memory().expect("Failed to open database"))
}

/// Generate `count` unsaved files spread round-robin over [`PROJECTS`]
/// projects.
pub fn generate_files(count: usize) -> Vec<ArchiveFile> {
    (0..count)
        .map(|i| {
            let category = if i % 3 == 0 { "RESULT" } else { "RAW" };
            ArchiveFile::new(format!("run-{i:06}.raw"))
                .with_category(category)
                .with_projects([format!("PXD{:06}", i % PROJECTS)])
        })
        .collect()
}

/// A file service over an in-memory store holding `count` files.
pub fn populated_files(count: usize) -> FileService {
    let files = FileService::new(memory_store(), &Config::default());
    files
        .insert_all(generate_files(count))
        .expect("Failed to populate files");
    files
}

/// A filter of `clauses` clauses cycling through every operator.
pub fn filter_with_clauses(clauses: usize) -> String {
    (0..clauses)
        .map(|i| match i % 4 {
            0 => format!("fileName=run-{i}*"),
            1 => format!("projectAccessions=in=PXD{i:06},PXD{:06}", i + 1),
            2 => format!("projectAccessions=all=PXD{i:06}"),
            _ => format!("fileCategory==RAW{i}"),
        })
        .collect::<Vec<_>>()
        .join(",")
}
