//! Analysis service.

use crate::accession::{AccessionFactory, ANALYSIS_ACCESSION};
use crate::config::Config;
use crate::error::CoreResult;
use crate::filter::{parse_filter, FilterClause};
use crate::model::{fields, Analysis};
use crate::page::{Page, PageRequest};
use crate::repository::Repository;
use crate::store::SharedStore;
use tracing::debug;

/// Stores analyses and mints their `PXDA` accessions.
///
/// Analyses draw from their own sequence, independent of files.
#[derive(Debug, Clone)]
pub struct AnalysisService {
    analyses: Repository<Analysis>,
    accessions: AccessionFactory,
}

impl AnalysisService {
    /// Creates the service over `store`.
    pub fn new(store: SharedStore, config: &Config) -> Self {
        Self {
            analyses: Repository::new(store.clone(), config),
            accessions: AccessionFactory::new(store),
        }
    }

    /// Mints an accession for `analysis` and stores it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::AlreadyAssigned`] if `analysis` already
    /// has an accession.
    pub fn insert(&self, analysis: &mut Analysis) -> CoreResult<String> {
        let accession = self.accessions.mint_single(analysis, &ANALYSIS_ACCESSION)?;
        self.analyses.save(analysis)?;
        debug!(accession = %accession, "inserted analysis");
        Ok(accession)
    }

    /// The analysis with `accession`.
    pub fn find_by_accession(&self, accession: &str) -> CoreResult<Option<Analysis>> {
        self.analyses.find_by_field(fields::ACCESSION, accession)
    }

    /// Analyses drawing on `project`.
    pub fn find_by_project_accession(&self, project: &str) -> CoreResult<Vec<Analysis>> {
        let clauses = [FilterClause::all_of(fields::PROJECT_ACCESSIONS, [project])];
        self.analyses.filter_all(&clauses)
    }

    /// One page of analyses matching `filter`.
    pub fn search_analyses(&self, filter: &str, page: &PageRequest) -> CoreResult<Page<Analysis>> {
        let clauses = parse_filter(filter)?;
        self.analyses.filter_by_attributes(&clauses, page)
    }

    /// One page of all analyses.
    pub fn find_all(&self, page: &PageRequest) -> CoreResult<Page<Analysis>> {
        self.analyses.find_all(page)
    }

    /// Number of stored analyses.
    pub fn count(&self) -> CoreResult<u64> {
        self.analyses.count()
    }

    /// Removes every analysis.
    pub fn delete_all(&self) -> CoreResult<u64> {
        self.analyses.delete_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ArchiveFile;
    use crate::service::FileService;
    use crate::store::Database;
    use std::sync::Arc;

    #[test]
    fn analyses_have_their_own_sequence() {
        let store: SharedStore = Arc::new(Database::open_in_memory().unwrap());
        let files = FileService::new(store.clone(), &Config::default());
        let analyses = AnalysisService::new(store, &Config::default());

        files.insert(&mut ArchiveFile::new("a.raw")).unwrap();
        files.insert(&mut ArchiveFile::new("b.raw")).unwrap();

        let mut analysis = Analysis::new("Reanalysis of liver samples");
        analysis.project_accessions.insert("PXD000001".into());
        assert_eq!(analyses.insert(&mut analysis).unwrap(), "PXDA000001");

        let found = analyses.find_by_accession("PXDA000001").unwrap().unwrap();
        assert_eq!(found.title, "Reanalysis of liver samples");
        assert_eq!(analyses.find_by_project_accession("PXD000001").unwrap().len(), 1);
        assert_eq!(
            analyses
                .search_analyses("title==*liver*", &PageRequest::first(5).unwrap())
                .unwrap()
                .total_elements,
            1
        );
        assert_eq!(analyses.count().unwrap(), 1);
    }
}
