//! Archive entities and their document mapping.

mod analysis;
mod file;
mod ms_run;
mod peptide;
mod protein;
mod psm;

pub use analysis::Analysis;
pub use file::ArchiveFile;
pub use ms_run::{MsRun, MsRunMetadata};
pub use peptide::PeptideEvidence;
pub use protein::ProteinEvidence;
pub use psm::PsmSummaryEvidence;

use crate::document::Document;
use crate::error::{CoreError, CoreResult};
use std::collections::BTreeSet;

/// Field names shared by several collections.
pub mod fields {
    /// Entity accession.
    pub const ACCESSION: &str = "accession";
    /// Project accessions of a file or analysis (multi-valued).
    pub const PROJECT_ACCESSIONS: &str = "projectAccessions";
    /// Analysis accessions of a file (multi-valued).
    pub const ANALYSIS_ACCESSIONS: &str = "analysisAccessions";
    /// Project accession of a molecule record.
    pub const PROJECT_ACCESSION: &str = "projectAccession";
    /// Assay accession of a molecule record.
    pub const ASSAY_ACCESSION: &str = "assayAccession";
    /// Protein accession as reported by the submitter.
    pub const REPORTED_ACCESSION: &str = "reportedAccession";
    /// Protein accession a peptide or PSM maps to.
    pub const PROTEIN_ACCESSION: &str = "proteinAccession";
    /// Peptide accession.
    pub const PEPTIDE_ACCESSION: &str = "peptideAccession";
    /// Peptide sequence.
    pub const PEPTIDE_SEQUENCE: &str = "peptideSequence";
    /// Universal spectrum identifier.
    pub const USI: &str = "usi";
}

fn required_text(collection: &str, document: &Document, field: &str) -> CoreResult<String> {
    match document.text(field) {
        Some(text) => Ok(text.to_string()),
        None => Err(CoreError::invalid_document(
            collection,
            format!("missing text field '{field}'"),
        )),
    }
}

fn optional_text(document: &Document, field: &str) -> Option<String> {
    document.text(field).map(str::to_string)
}

fn text_set(document: &Document, field: &str) -> BTreeSet<String> {
    document.text_list(field).into_iter().collect()
}

fn non_negative(collection: &str, document: &Document, field: &str) -> CoreResult<Option<u64>> {
    document
        .integer(field)
        .map(|value| {
            u64::try_from(value).map_err(|_| {
                CoreError::invalid_document(collection, format!("negative value in '{field}'"))
            })
        })
        .transpose()
}

fn stored_integer(collection: &str, field: &str, value: u64) -> CoreResult<i64> {
    i64::try_from(value).map_err(|_| {
        CoreError::invalid_document(collection, format!("value of '{field}' is too large"))
    })
}
