//! Protein and peptide evidence service.

use crate::config::Config;
use crate::error::CoreResult;
use crate::filter::{parse_filter, FilterClause};
use crate::model::{fields, PeptideEvidence, ProteinEvidence};
use crate::page::{Page, PageRequest};
use crate::query::Predicate;
use crate::repository::Repository;
use crate::store::SharedStore;
use tracing::debug;

/// Optional criteria for [`MoleculesService::find_peptide_evidences`].
///
/// Each set criterion may list several comma-separated values; unset and
/// empty criteria are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct PeptideQuery<'a> {
    /// Project accession(s).
    pub project_accession: Option<&'a str>,
    /// Assay accession(s).
    pub assay_accession: Option<&'a str>,
    /// Peptide sequence(s).
    pub peptide_sequence: Option<&'a str>,
    /// Protein accession(s).
    pub protein_accession: Option<&'a str>,
}

impl PeptideQuery<'_> {
    fn clauses(&self) -> Vec<FilterClause> {
        [
            (fields::PROJECT_ACCESSION, self.project_accession),
            (fields::ASSAY_ACCESSION, self.assay_accession),
            (fields::PEPTIDE_SEQUENCE, self.peptide_sequence),
            (fields::PROTEIN_ACCESSION, self.protein_accession),
        ]
        .into_iter()
        .filter_map(|(field, value)| {
            let values: Vec<&str> = value?
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .collect();
            (!values.is_empty()).then(|| FilterClause::any_of(field, values))
        })
        .collect()
    }
}

/// Stores protein and peptide evidences.
#[derive(Debug, Clone)]
pub struct MoleculesService {
    proteins: Repository<ProteinEvidence>,
    peptides: Repository<PeptideEvidence>,
}

impl MoleculesService {
    /// Creates the service over `store`.
    pub fn new(store: SharedStore, config: &Config) -> Self {
        Self {
            proteins: Repository::new(store.clone(), config),
            peptides: Repository::new(store, config),
        }
    }

    /// One page of a project's proteins.
    pub fn find_proteins_by_project_accession(
        &self,
        project: &str,
        page: &PageRequest,
    ) -> CoreResult<Page<ProteinEvidence>> {
        let clauses = [FilterClause::any_of(fields::PROJECT_ACCESSION, [project])];
        let proteins = self.proteins.filter_by_attributes(&clauses, page)?;
        debug!(
            project,
            page = page.page_number(),
            total = proteins.total_elements,
            "proteins for project"
        );
        Ok(proteins)
    }

    /// Stores `protein`, replacing any evidence for the same reported
    /// accession and assay.
    pub fn save_protein_evidence(&self, protein: &mut ProteinEvidence) -> CoreResult<()> {
        let predicate = Predicate::and_all(vec![
            Predicate::equals(fields::REPORTED_ACCESSION, protein.reported_accession.as_str()),
            Predicate::equals(fields::ASSAY_ACCESSION, protein.assay_accession.as_str()),
        ]);
        match self.proteins.find_one(&predicate)? {
            Some(current) => {
                protein.id = current.id;
                debug!(
                    assay = %protein.assay_accession,
                    protein = %protein.reported_accession,
                    "updating protein"
                );
            }
            None => debug!(
                assay = %protein.assay_accession,
                protein = %protein.reported_accession,
                "adding protein"
            ),
        }
        self.proteins.save(protein)?;
        Ok(())
    }

    /// One page of proteins matching `filter`.
    pub fn search_proteins(
        &self,
        filter: &str,
        page: &PageRequest,
    ) -> CoreResult<Page<ProteinEvidence>> {
        let clauses = parse_filter(filter)?;
        self.proteins.filter_by_attributes(&clauses, page)
    }

    /// One page of all proteins.
    pub fn find_all_protein_evidences(
        &self,
        page: &PageRequest,
    ) -> CoreResult<Page<ProteinEvidence>> {
        self.proteins.find_all(page)
    }

    /// The evidence for one protein in one assay of a project.
    pub fn get_protein_evidence(
        &self,
        reported_accession: &str,
        project: &str,
        assay: &str,
    ) -> CoreResult<Option<ProteinEvidence>> {
        self.proteins.find_one(&Predicate::and_all(vec![
            Predicate::equals(fields::REPORTED_ACCESSION, reported_accession),
            Predicate::equals(fields::PROJECT_ACCESSION, project),
            Predicate::equals(fields::ASSAY_ACCESSION, assay),
        ]))
    }

    /// Removes every protein evidence.
    pub fn delete_all_protein_evidences(&self) -> CoreResult<u64> {
        self.proteins.delete_all()
    }

    /// One page of a project's peptides.
    pub fn find_peptide_evidences_by_project_accession(
        &self,
        project: &str,
        page: &PageRequest,
    ) -> CoreResult<Page<PeptideEvidence>> {
        let clauses = [FilterClause::any_of(fields::PROJECT_ACCESSION, [project])];
        let peptides = self.peptides.filter_by_attributes(&clauses, page)?;
        debug!(project, total = peptides.total_elements, "peptides for project");
        Ok(peptides)
    }

    /// One page of an assay's peptides.
    pub fn find_peptide_evidences_by_assay_accession(
        &self,
        assay: &str,
        page: &PageRequest,
    ) -> CoreResult<Page<PeptideEvidence>> {
        let clauses = [FilterClause::any_of(fields::ASSAY_ACCESSION, [assay])];
        let peptides = self.peptides.filter_by_attributes(&clauses, page)?;
        debug!(assay, total = peptides.total_elements, "peptides for assay");
        Ok(peptides)
    }

    /// Number of peptides of a project.
    pub fn count_by_project_accession(&self, project: &str) -> CoreResult<u64> {
        self.peptides
            .count_where(&Predicate::equals(fields::PROJECT_ACCESSION, project))
    }

    /// Number of peptides of an assay.
    pub fn count_by_assay_accession(&self, assay: &str) -> CoreResult<u64> {
        self.peptides
            .count_where(&Predicate::equals(fields::ASSAY_ACCESSION, assay))
    }

    /// Stores `peptide`, replacing any evidence for the same protein, assay
    /// and peptide accession.
    pub fn save_peptide_evidence(&self, peptide: &mut PeptideEvidence) -> CoreResult<()> {
        if let Some(current) = self.find_peptide(
            &peptide.protein_accession,
            &peptide.assay_accession,
            &peptide.peptide_accession,
        )? {
            peptide.id = current.id;
        }
        self.peptides.save(peptide)?;
        Ok(())
    }

    /// One page of the peptides supporting a protein evidence.
    pub fn find_peptide_evidences_by_protein_evidence(
        &self,
        protein: &str,
        project: &str,
        assay: &str,
        page: &PageRequest,
    ) -> CoreResult<Page<PeptideEvidence>> {
        let predicate = Predicate::and_all(vec![
            Predicate::equals(fields::PROJECT_ACCESSION, project),
            Predicate::equals(fields::ASSAY_ACCESSION, assay),
            Predicate::equals(fields::PROTEIN_ACCESSION, protein),
        ]);
        self.peptides.find_page(&predicate, page)
    }

    /// One page of peptides matching every set criterion of `query`.
    pub fn find_peptide_evidences(
        &self,
        query: &PeptideQuery<'_>,
        page: &PageRequest,
    ) -> CoreResult<Page<PeptideEvidence>> {
        self.peptides.filter_by_attributes(&query.clauses(), page)
    }

    /// One peptide evidence. The project accession narrows the match too.
    pub fn find_peptide_evidence(
        &self,
        project: &str,
        assay: &str,
        protein: &str,
        peptide_accession: &str,
    ) -> CoreResult<Option<PeptideEvidence>> {
        self.peptides.find_one(&Predicate::and_all(vec![
            Predicate::equals(fields::PROJECT_ACCESSION, project),
            Predicate::equals(fields::ASSAY_ACCESSION, assay),
            Predicate::equals(fields::PROTEIN_ACCESSION, protein),
            Predicate::equals(fields::PEPTIDE_ACCESSION, peptide_accession),
        ]))
    }

    /// Removes every peptide evidence.
    pub fn delete_all_peptide_evidences(&self) -> CoreResult<u64> {
        self.peptides.delete_all()
    }

    fn find_peptide(
        &self,
        protein: &str,
        assay: &str,
        peptide_accession: &str,
    ) -> CoreResult<Option<PeptideEvidence>> {
        self.peptides.find_one(&Predicate::and_all(vec![
            Predicate::equals(fields::PROTEIN_ACCESSION, protein),
            Predicate::equals(fields::ASSAY_ACCESSION, assay),
            Predicate::equals(fields::PEPTIDE_ACCESSION, peptide_accession),
        ]))
    }
}
