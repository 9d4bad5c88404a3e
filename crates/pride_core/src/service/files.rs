//! Archive file service.

use crate::accession::{AccessionFactory, Accessioned, FILE_ACCESSION};
use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::filter::{parse_filter, FilterClause};
use crate::model::{fields, ArchiveFile, MsRun, MsRunMetadata};
use crate::page::{Page, PageRequest};
use crate::query::Predicate;
use crate::repository::Repository;
use crate::store::SharedStore;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Result of inserting one file of a batch: the file as given, and the
/// stored file or the reason it was not stored.
pub type BatchItem = (ArchiveFile, CoreResult<ArchiveFile>);

/// Category of files that describe an MS run.
const RAW_CATEGORY: &str = "RAW";

/// Stores archive files and mints their `PXF` accessions.
///
/// MS runs live beside the files and share their accessions.
#[derive(Debug, Clone)]
pub struct FileService {
    files: Repository<ArchiveFile>,
    runs: Repository<MsRun>,
    accessions: AccessionFactory,
}

impl FileService {
    /// Creates the service over `store`.
    pub fn new(store: SharedStore, config: &Config) -> Self {
        Self {
            files: Repository::new(store.clone(), config),
            runs: Repository::new(store.clone(), config),
            accessions: AccessionFactory::new(store),
        }
    }

    /// Mints an accession for `file` and stores it.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AlreadyAssigned`] if `file` already has an
    /// accession; use [`FileService::update`] for those.
    pub fn insert(&self, file: &mut ArchiveFile) -> CoreResult<String> {
        let accession = self.accessions.mint_single(file, &FILE_ACCESSION)?;
        self.files.save(file)?;
        debug!(accession = %accession, file_name = %file.file_name, "inserted file");
        Ok(accession)
    }

    /// Inserts a batch with one accession reservation.
    ///
    /// Results follow input order. Files that already have an accession are
    /// reported as [`CoreError::AlreadyAssigned`]; a failed write is
    /// reported for that file only and its accession is not reused.
    ///
    /// # Errors
    ///
    /// Fails as a whole only if the reservation fails.
    pub fn insert_all(&self, files: Vec<ArchiveFile>) -> CoreResult<Vec<BatchItem>> {
        let minted = self.accessions.mint_batch(files, &FILE_ACCESSION)?;
        let mut stored = 0usize;
        let results: Vec<BatchItem> = minted
            .into_iter()
            .map(|(original, minted)| {
                let result = match minted {
                    None => Err(CoreError::already_assigned(
                        original.accession().unwrap_or_default(),
                    )),
                    Some(mut file) => match self.files.save(&mut file) {
                        Ok(_) => {
                            stored += 1;
                            Ok(file)
                        }
                        Err(e) => {
                            warn!(
                                accession = file.accession().unwrap_or_default(),
                                error = %e,
                                "failed to store batch file"
                            );
                            Err(e)
                        }
                    },
                };
                (original, result)
            })
            .collect();
        debug!(total = results.len(), stored, "inserted file batch");
        Ok(results)
    }

    /// Replaces the stored file carrying `file`'s accession.
    ///
    /// Returns `false` if no such file exists.
    pub fn update(&self, file: &mut ArchiveFile) -> CoreResult<bool> {
        let Some(accession) = file.accession.clone() else {
            return Err(CoreError::invalid_operation(
                "cannot update a file without accession",
            ));
        };
        let Some(existing) = self.find_by_file_accession(&accession)? else {
            warn!(accession = %accession, "file to update does not exist");
            return Ok(false);
        };
        file.id = existing.id;
        self.files.save(file)?;
        debug!(accession = %accession, "updated file");
        Ok(true)
    }

    /// Number of stored files.
    pub fn count(&self) -> CoreResult<u64> {
        self.files.count()
    }

    /// Adds project accessions to a file.
    ///
    /// Returns `false` if no file has `file_accession`.
    pub fn add_project_accessions<I, S>(
        &self,
        file_accession: &str,
        projects: I,
    ) -> CoreResult<bool>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.merge_accessions(
            file_accession,
            projects,
            |file| &mut file.project_accessions,
            "project",
        )
    }

    /// Adds analysis accessions to a file.
    ///
    /// Returns `false` if no file has `file_accession`.
    pub fn add_analysis_accessions<I, S>(
        &self,
        file_accession: &str,
        analyses: I,
    ) -> CoreResult<bool>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.merge_accessions(
            file_accession,
            analyses,
            |file| &mut file.analysis_accessions,
            "analysis",
        )
    }

    fn merge_accessions<I, S>(
        &self,
        file_accession: &str,
        values: I,
        target: impl FnOnce(&mut ArchiveFile) -> &mut BTreeSet<String>,
        kind: &str,
    ) -> CoreResult<bool>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let Some(mut file) = self.find_by_file_accession(file_accession)? else {
            warn!(accession = file_accession, "file does not exist");
            return Ok(false);
        };
        let set = target(&mut file);
        let before = set.len();
        set.extend(values.into_iter().map(Into::into));
        let added = set.len() - before;
        self.files.save(&mut file)?;
        info!(accession = file_accession, kind, added, "updated file accessions");
        Ok(true)
    }

    /// One page of files matching `filter`.
    pub fn search_files(&self, filter: &str, page: &PageRequest) -> CoreResult<Page<ArchiveFile>> {
        let clauses = parse_filter(filter)?;
        let files = self.files.filter_by_attributes(&clauses, page)?;
        debug!(filter, total = files.total_elements, "searched files");
        Ok(files)
    }

    /// Every file of a project.
    pub fn find_files_by_project_accession(&self, project: &str) -> CoreResult<Vec<ArchiveFile>> {
        let clauses = [FilterClause::all_of(fields::PROJECT_ACCESSIONS, [project])];
        self.files.filter_all(&clauses)
    }

    /// One page of a project's files that also match `filter`.
    pub fn find_files_by_project_accession_and_filter(
        &self,
        project: &str,
        filter: &str,
        page: &PageRequest,
    ) -> CoreResult<Page<ArchiveFile>> {
        let mut clauses = vec![FilterClause::all_of(fields::PROJECT_ACCESSIONS, [project])];
        clauses.extend(parse_filter(filter)?);
        self.files.filter_by_attributes(&clauses, page)
    }

    /// The file with `accession`.
    pub fn find_by_file_accession(&self, accession: &str) -> CoreResult<Option<ArchiveFile>> {
        self.files.find_by_field(fields::ACCESSION, accession)
    }

    /// One page of all files.
    pub fn find_all(&self, page: &PageRequest) -> CoreResult<Page<ArchiveFile>> {
        self.files.find_all(page)
    }

    /// Files belonging to any of `projects`.
    pub fn find_files_by_project_accessions<I, S>(
        &self,
        projects: I,
    ) -> CoreResult<Vec<ArchiveFile>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files.find_by_values_in(fields::PROJECT_ACCESSIONS, projects, None)
    }

    /// Files matching a compiled predicate.
    pub fn count_where(&self, predicate: &Predicate) -> CoreResult<u64> {
        self.files.count_where(predicate)
    }

    /// Stores `run`, replacing the run already kept for its accession.
    ///
    /// Returns `false`, storing nothing, if no file has the run's accession.
    pub fn update_ms_run(&self, run: &mut MsRun) -> CoreResult<bool> {
        if self.find_by_file_accession(&run.accession)?.is_none() {
            warn!(accession = %run.accession, "file of MS run does not exist");
            return Ok(false);
        }
        if let Some(existing) = self.find_ms_run_by_accession(&run.accession)? {
            run.id = existing.id;
        }
        self.runs.save(run)?;
        debug!(accession = %run.accession, "updated MS run");
        Ok(true)
    }

    /// Sets acquisition details of the run of a raw file.
    ///
    /// The run is created from the file when none exists yet. Returns `None`
    /// if no file has `accession` or the file is not a raw file.
    pub fn update_ms_run_metadata(
        &self,
        accession: &str,
        metadata: &MsRunMetadata,
    ) -> CoreResult<Option<MsRun>> {
        let Some(file) = self.find_by_file_accession(accession)? else {
            warn!(accession, "file of MS run does not exist");
            return Ok(None);
        };
        let is_raw = file
            .file_category
            .as_deref()
            .is_some_and(|category| category.eq_ignore_ascii_case(RAW_CATEGORY));
        if !is_raw {
            warn!(accession, "file is not a raw file");
            return Ok(None);
        }

        let mut run = match self.find_ms_run_by_accession(accession)? {
            Some(run) => run,
            None => MsRun::from_file(&file),
        };
        run.apply(metadata);
        self.runs.save(&mut run)?;
        debug!(accession, "updated MS run metadata");
        Ok(Some(run))
    }

    /// Every MS run of a project.
    pub fn ms_runs_by_project(&self, project: &str) -> CoreResult<Vec<MsRun>> {
        let clauses = [FilterClause::all_of(fields::PROJECT_ACCESSIONS, [project])];
        self.runs.filter_all(&clauses)
    }

    /// The MS run of the file with `accession`.
    pub fn find_ms_run_by_accession(&self, accession: &str) -> CoreResult<Option<MsRun>> {
        self.runs.find_by_field(fields::ACCESSION, accession)
    }

    /// Removes every file and MS run.
    ///
    /// Returns the number of files removed.
    pub fn delete_all(&self) -> CoreResult<u64> {
        let removed = self.files.delete_all()?;
        let runs = self.runs.delete_all()?;
        info!(removed, runs, "deleted all files");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Database;
    use pride_storage::MemoryBackend;
    use std::sync::Arc;

    fn service() -> FileService {
        FileService::new(Arc::new(Database::open_in_memory().unwrap()), &Config::default())
    }

    #[test]
    fn insert_mints_sequential_accessions() {
        let service = service();
        let mut a = ArchiveFile::new("Filename.txt");
        let mut b = ArchiveFile::new("Other.txt");
        assert_eq!(service.insert(&mut a).unwrap(), "PXF00000000001");
        assert_eq!(service.insert(&mut b).unwrap(), "PXF00000000002");
        assert_eq!(service.count().unwrap(), 2);
        let found = service.find_by_file_accession("PXF00000000002").unwrap().unwrap();
        assert_eq!(found.file_name, "Other.txt");
    }

    #[test]
    fn insert_rejects_existing_accession() {
        let service = service();
        let mut file = ArchiveFile::new("a.raw");
        file.accession = Some("PXF123".into());
        assert!(matches!(
            service.insert(&mut file),
            Err(CoreError::AlreadyAssigned { .. })
        ));
        assert_eq!(service.count().unwrap(), 0);
    }

    #[test]
    fn update_replaces_by_accession() {
        let service = service();
        let mut file = ArchiveFile::new("a.raw");
        service.insert(&mut file).unwrap();

        let mut changed = ArchiveFile::new("renamed.raw");
        changed.accession = file.accession.clone();
        assert!(service.update(&mut changed).unwrap());
        assert_eq!(service.count().unwrap(), 1);

        let mut ghost = ArchiveFile::new("ghost");
        ghost.accession = Some("PXF99999999999".into());
        assert!(!service.update(&mut ghost).unwrap());
    }

    #[test]
    fn batch_reports_each_item() {
        let service = service();
        let mut existing = ArchiveFile::new("old.raw");
        existing.accession = Some("PXF00000000500".into());
        let batch = vec![
            ArchiveFile::new("a.raw"),
            existing,
            ArchiveFile::new("b.raw"),
        ];
        let results = service.insert_all(batch).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(
            results[0].1.as_ref().unwrap().accession.as_deref(),
            Some("PXF00000000001")
        );
        assert!(matches!(results[1].1, Err(CoreError::AlreadyAssigned { .. })));
        assert_eq!(
            results[2].1.as_ref().unwrap().accession.as_deref(),
            Some("PXF00000000002")
        );
        assert_eq!(service.count().unwrap(), 2);
    }

    #[test]
    fn batch_write_failure_is_per_item_and_burns_the_accession() {
        let backend = MemoryBackend::new();
        let db =
            Database::open_with_backend(Config::default(), Box::new(backend.clone())).unwrap();
        let service = FileService::new(Arc::new(db), &Config::default());

        // One append for the counter, one for the first file.
        backend.fail_appends_after(2);
        let results = service
            .insert_all(vec![ArchiveFile::new("a.raw"), ArchiveFile::new("b.raw")])
            .unwrap();
        assert!(results[0].1.is_ok());
        assert!(matches!(results[1].1, Err(CoreError::Storage(_))));

        backend.heal();
        let mut next = ArchiveFile::new("c.raw");
        assert_eq!(service.insert(&mut next).unwrap(), "PXF00000000003");
    }

    #[test]
    fn project_and_analysis_accessions_merge() {
        let service = service();
        let mut file = ArchiveFile::new("a.raw").with_projects(["PXD1"]);
        let accession = service.insert(&mut file).unwrap();

        assert!(service.add_project_accessions(&accession, ["PXD2", "PXD1"]).unwrap());
        assert!(service.add_analysis_accessions(&accession, ["PXDA000001"]).unwrap());
        assert!(!service.add_project_accessions("PXF00000000404", ["PXD3"]).unwrap());

        let stored = service.find_by_file_accession(&accession).unwrap().unwrap();
        assert_eq!(stored.project_accessions.len(), 2);
        assert!(stored.analysis_accessions.contains("PXDA000001"));
        assert!(!stored.project_accessions.contains("PXDA000001"));
    }

    #[test]
    fn project_scoped_searches() {
        let service = service();
        for (name, category, projects) in [
            ("a.raw", "RAW", vec!["PXD1"]),
            ("b.mzid", "RESULT", vec!["PXD1", "PXD2"]),
            ("c.raw", "RAW", vec!["PXD2"]),
        ] {
            let mut file = ArchiveFile::new(name)
                .with_category(category)
                .with_projects(projects);
            service.insert(&mut file).unwrap();
        }

        assert_eq!(service.find_files_by_project_accession("PXD1").unwrap().len(), 2);
        let raw_in_pxd2 = service
            .find_files_by_project_accession_and_filter(
                "PXD2",
                "fileCategory==RAW",
                &PageRequest::first(10).unwrap(),
            )
            .unwrap();
        assert_eq!(raw_in_pxd2.total_elements, 1);
        assert_eq!(raw_in_pxd2.items[0].file_name, "c.raw");
        assert_eq!(
            service.find_files_by_project_accessions(["PXD2", "PXD9"]).unwrap().len(),
            2
        );

        let page = service
            .search_files("fileName==*.RAW", &PageRequest::first(10).unwrap())
            .unwrap();
        assert_eq!(page.total_elements, 2);
        assert!(matches!(
            service.search_files("owner==me", &PageRequest::first(10).unwrap()),
            Err(CoreError::UnknownField { .. })
        ));
        assert_eq!(service.delete_all().unwrap(), 3);
    }

    #[test]
    fn project_scope_is_matched_literally() {
        let service = service();
        for (name, project) in [("a.raw", "PXD1"), ("b.raw", "PXD2")] {
            let mut file = ArchiveFile::new(name).with_projects([project]);
            service.insert(&mut file).unwrap();
        }
        let first = PageRequest::first(10).unwrap();

        assert!(service.find_files_by_project_accession("*").unwrap().is_empty());
        let starred = service
            .find_files_by_project_accession_and_filter("*", "", &first)
            .unwrap();
        assert_eq!(starred.total_elements, 0);

        let widened = service
            .find_files_by_project_accession_and_filter("PXD1", "PXD2", &first);
        assert!(matches!(widened, Err(CoreError::FilterSyntax { .. })));

        let scoped = service
            .find_files_by_project_accession_and_filter("PXD1", "fileName=*.raw", &first)
            .unwrap();
        assert_eq!(scoped.total_elements, 1);
        assert_eq!(scoped.items[0].file_name, "a.raw");
    }

    #[test]
    fn ms_runs_need_an_existing_file() {
        let service = service();
        let mut file = ArchiveFile::new("a.raw").with_category("RAW").with_projects(["PXD1"]);
        let accession = service.insert(&mut file).unwrap();

        let mut orphan = MsRun {
            accession: "PXF00000000404".into(),
            ..MsRun::default()
        };
        assert!(!service.update_ms_run(&mut orphan).unwrap());
        assert!(service.find_ms_run_by_accession("PXF00000000404").unwrap().is_none());

        let mut run = MsRun::from_file(&file);
        run.metadata.scan_count = Some(10);
        assert!(service.update_ms_run(&mut run).unwrap());
        run.metadata.scan_count = Some(11);
        assert!(service.update_ms_run(&mut run).unwrap());

        assert_eq!(service.ms_runs_by_project("PXD1").unwrap().len(), 1);
        assert!(service.ms_runs_by_project("PXD2").unwrap().is_empty());
        let stored = service.find_ms_run_by_accession(&accession).unwrap().unwrap();
        assert_eq!(stored.metadata.scan_count, Some(11));
    }

    #[test]
    fn metadata_is_only_set_on_raw_files() {
        let service = service();
        let mut raw = ArchiveFile::new("a.raw").with_category("raw").with_projects(["PXD1"]);
        let mut result = ArchiveFile::new("b.mzid").with_category("RESULT");
        let raw_accession = service.insert(&mut raw).unwrap();
        let result_accession = service.insert(&mut result).unwrap();

        let metadata = MsRunMetadata {
            instrument_model: Some("Q Exactive".into()),
            ..MsRunMetadata::default()
        };
        assert!(service
            .update_ms_run_metadata(&result_accession, &metadata)
            .unwrap()
            .is_none());
        assert!(service
            .update_ms_run_metadata("PXF00000000404", &metadata)
            .unwrap()
            .is_none());

        let run = service
            .update_ms_run_metadata(&raw_accession, &metadata)
            .unwrap()
            .unwrap();
        assert_eq!(run.file_name, "a.raw");
        assert_eq!(run.metadata.instrument_model.as_deref(), Some("Q Exactive"));

        let scans = MsRunMetadata {
            scan_count: Some(42),
            ..MsRunMetadata::default()
        };
        let run = service
            .update_ms_run_metadata(&raw_accession, &scans)
            .unwrap()
            .unwrap();
        assert_eq!(run.metadata.instrument_model.as_deref(), Some("Q Exactive"));
        assert_eq!(service.ms_runs_by_project("PXD1").unwrap(), vec![run]);

        assert_eq!(service.delete_all().unwrap(), 2);
        assert!(service.find_ms_run_by_accession(&raw_accession).unwrap().is_none());
    }

    #[test]
    fn oversized_file_is_not_stored() {
        let service = service();
        let mut file = ArchiveFile::new("huge.raw");
        file.file_size_bytes = Some(u64::MAX);
        assert!(matches!(
            service.insert(&mut file),
            Err(CoreError::InvalidDocument { .. })
        ));
        assert_eq!(service.count().unwrap(), 0);
    }
}
