//! Search command implementation.

use super::{open, CollectionArg, OutputFormat};
use pride_core::filter::parse_filter;
use pride_core::model::{MsRun, PeptideEvidence};
use pride_core::repository::Repository;
use pride_core::service::{AnalysisService, FileService, MoleculesService, PsmService};
use pride_core::{Config, Page, PageRequest};
use serde::Serialize;
use std::path::Path;

/// Parameters of one search.
#[derive(Debug)]
pub struct SearchRequest<'a> {
    /// Collection to search.
    pub collection: CollectionArg,
    /// Filter text.
    pub filter: &'a str,
    /// Zero-based page number.
    pub page: i64,
    /// Page size.
    pub size: i64,
}

/// Runs the search command.
pub fn run(
    path: &Path,
    config: Config,
    request: &SearchRequest<'_>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let page = PageRequest::new(request.page, request.size)?;
    let store = open(path, config.clone())?;
    let filter = request.filter;

    match request.collection {
        CollectionArg::Files => {
            let found = FileService::new(store, &config).search_files(filter, &page)?;
            print_page(&found, format, |f| {
                format!(
                    "{}\t{}\t{}",
                    f.accession.as_deref().unwrap_or("-"),
                    f.file_name,
                    f.file_category.as_deref().unwrap_or("-")
                )
            })
        }
        CollectionArg::Analyses => {
            let found = AnalysisService::new(store, &config).search_analyses(filter, &page)?;
            print_page(&found, format, |a| {
                format!("{}\t{}", a.accession.as_deref().unwrap_or("-"), a.title)
            })
        }
        CollectionArg::Proteins => {
            let found = MoleculesService::new(store, &config).search_proteins(filter, &page)?;
            print_page(&found, format, |p| {
                format!(
                    "{}\t{}\t{}",
                    p.reported_accession, p.project_accession, p.assay_accession
                )
            })
        }
        CollectionArg::Peptides => {
            let clauses = parse_filter(filter)?;
            let found = Repository::<PeptideEvidence>::new(store, &config)
                .filter_by_attributes(&clauses, &page)?;
            print_page(&found, format, |p| {
                format!(
                    "{}\t{}\t{}",
                    p.peptide_accession, p.protein_accession, p.assay_accession
                )
            })
        }
        CollectionArg::Psms => {
            let found = PsmService::new(store, &config).search_psms(filter, &page)?;
            print_page(&found, format, |p| {
                format!(
                    "{}\t{}\t{}",
                    p.accession,
                    p.peptide_sequence.as_deref().unwrap_or("-"),
                    p.protein_accession.as_deref().unwrap_or("-")
                )
            })
        }
        CollectionArg::MsRuns => {
            let clauses = parse_filter(filter)?;
            let found =
                Repository::<MsRun>::new(store, &config).filter_by_attributes(&clauses, &page)?;
            print_page(&found, format, |r| {
                format!(
                    "{}\t{}\t{}",
                    r.accession,
                    r.file_name,
                    r.metadata.instrument_model.as_deref().unwrap_or("-")
                )
            })
        }
    }
}

fn print_page<T: Serialize>(
    page: &Page<T>,
    format: OutputFormat,
    line: impl Fn(&T) -> String,
) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(page)?),
        OutputFormat::Text => {
            for item in &page.items {
                println!("{}", line(item));
            }
            println!(
                "page {} of {} ({} total)",
                page.page_number,
                page.total_pages(),
                page.total_elements
            );
        }
    }
    Ok(())
}
