//! Insert command implementations.

use super::open;
use pride_core::model::{Analysis, ArchiveFile};
use pride_core::service::{AnalysisService, FileService};
use pride_core::Config;
use std::path::Path;
use tracing::info;

/// Stores a new file and prints its accession.
pub fn file(
    path: &Path,
    config: Config,
    file_name: String,
    category: Option<String>,
    projects: Vec<String>,
    size: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = open(path, config.clone())?;
    let service = FileService::new(store, &config);

    let mut file = ArchiveFile::new(file_name).with_projects(projects);
    file.file_category = category;
    file.file_size_bytes = size;

    let accession = service.insert(&mut file)?;
    info!(accession = %accession, "file stored");
    println!("{accession}");
    Ok(())
}

/// Stores a new analysis and prints its accession.
pub fn analysis(
    path: &Path,
    config: Config,
    title: String,
    description: Option<String>,
    projects: Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = open(path, config.clone())?;
    let service = AnalysisService::new(store, &config);

    let mut analysis = Analysis::new(title);
    analysis.description = description;
    analysis.project_accessions.extend(projects);

    let accession = service.insert(&mut analysis)?;
    info!(accession = %accession, "analysis stored");
    println!("{accession}");
    Ok(())
}
