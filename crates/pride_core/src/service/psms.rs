//! PSM summary service.

use crate::config::Config;
use crate::error::CoreResult;
use crate::filter::parse_filter;
use crate::model::{fields, PsmSummaryEvidence};
use crate::page::{Page, PageRequest};
use crate::query::Predicate;
use crate::repository::Repository;
use crate::store::{SharedStore, Sort};
use tracing::debug;

/// Stores PSM summaries.
#[derive(Debug, Clone)]
pub struct PsmService {
    psms: Repository<PsmSummaryEvidence>,
}

impl PsmService {
    /// Creates the service over `store`.
    pub fn new(store: SharedStore, config: &Config) -> Self {
        Self {
            psms: Repository::new(store, config),
        }
    }

    /// Stores `psm`, replacing any PSM with the same accession.
    pub fn save(&self, psm: &mut PsmSummaryEvidence) -> CoreResult<()> {
        if let Some(current) = self.find_by_accession(&psm.accession)? {
            psm.id = current.id;
            debug!(accession = %psm.accession, "updating psm");
        }
        self.psms.save(psm)?;
        Ok(())
    }

    /// The PSM with `accession`.
    pub fn find_by_accession(&self, accession: &str) -> CoreResult<Option<PsmSummaryEvidence>> {
        self.psms.find_by_field(fields::ACCESSION, accession)
    }

    /// PSMs whose accession is one of `accessions`, optionally sorted.
    pub fn find_by_ids_in<I, S>(
        &self,
        accessions: I,
        sort: Option<Sort>,
    ) -> CoreResult<Vec<PsmSummaryEvidence>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.psms.find_by_values_in(fields::ACCESSION, accessions, sort)
    }

    /// Number of PSMs of a project.
    pub fn count_by_project_accession(&self, project: &str) -> CoreResult<u64> {
        self.psms
            .count_where(&Predicate::equals(fields::PROJECT_ACCESSION, project))
    }

    /// One page of PSMs matching `filter`.
    pub fn search_psms(
        &self,
        filter: &str,
        page: &PageRequest,
    ) -> CoreResult<Page<PsmSummaryEvidence>> {
        let clauses = parse_filter(filter)?;
        self.psms.filter_by_attributes(&clauses, page)
    }

    /// One page of PSMs identified by any of `usis`.
    pub fn find_by_usis<I, S>(
        &self,
        usis: I,
        page: &PageRequest,
    ) -> CoreResult<Page<PsmSummaryEvidence>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.psms.find_page(&Predicate::any_of(fields::USI, usis), page)
    }

    /// Number of stored PSMs.
    pub fn count(&self) -> CoreResult<u64> {
        self.psms.count()
    }

    /// Removes every PSM.
    pub fn delete_all(&self) -> CoreResult<u64> {
        self.psms.delete_all()
    }
}
