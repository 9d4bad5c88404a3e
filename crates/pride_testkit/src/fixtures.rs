//! Test fixtures and archive helpers.
//!
//! Provides convenience functions for setting up test archives
//! and common test scenarios.

use pride_core::service::{AnalysisService, FileService, MoleculesService, PsmService};
use pride_core::store::{Database, SharedStore};
use pride_core::Config;
use pride_storage::MemoryBackend;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Directory name of the on-disk database inside a fixture's temp dir.
const ARCHIVE_DIR: &str = "archive";

/// A test archive with automatic cleanup.
pub struct TestArchive {
    /// The database instance.
    pub db: Arc<Database>,
    config: Config,
    /// Shared log bytes of an in-memory archive, for reopening.
    backend: Option<MemoryBackend>,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: Option<TempDir>,
}

impl TestArchive {
    /// Creates a new in-memory test archive.
    pub fn memory() -> Self {
        Self::memory_with_config(Config::default())
    }

    /// Creates a new in-memory test archive with `config`.
    pub fn memory_with_config(config: Config) -> Self {
        let backend = MemoryBackend::new();
        let db = Database::open_with_backend(config.clone(), Box::new(backend.clone()))
            .expect("Failed to open in-memory database");
        Self {
            db: Arc::new(db),
            config,
            backend: Some(backend),
            _temp_dir: None,
        }
    }

    /// Creates a new file-based test archive.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = Config::default();
        let db = Database::open(temp_dir.path().join(ARCHIVE_DIR), config.clone())
            .expect("Failed to open file database");
        Self {
            db: Arc::new(db),
            config,
            backend: None,
            _temp_dir: Some(temp_dir),
        }
    }

    /// Returns the database path if file-based, None if in-memory.
    pub fn path(&self) -> Option<PathBuf> {
        self._temp_dir.as_ref().map(|d| d.path().join(ARCHIVE_DIR))
    }

    /// The in-memory log backend, None if file-based.
    pub fn backend(&self) -> Option<&MemoryBackend> {
        self.backend.as_ref()
    }

    /// The configuration the archive was opened with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The database as a shared store handle.
    pub fn store(&self) -> SharedStore {
        self.db.clone()
    }

    /// A file service over this archive.
    pub fn files(&self) -> FileService {
        FileService::new(self.store(), &self.config)
    }

    /// An analysis service over this archive.
    pub fn analyses(&self) -> AnalysisService {
        AnalysisService::new(self.store(), &self.config)
    }

    /// A protein and peptide service over this archive.
    pub fn molecules(&self) -> MoleculesService {
        MoleculesService::new(self.store(), &self.config)
    }

    /// A PSM service over this archive.
    pub fn psms(&self) -> PsmService {
        PsmService::new(self.store(), &self.config)
    }

    /// Closes the database and opens it again from its log.
    ///
    /// Every service created from this archive must be dropped first, or
    /// an on-disk archive stays locked.
    pub fn reopen(self) -> Self {
        let Self {
            db,
            config,
            backend,
            _temp_dir,
        } = self;
        drop(db);

        let db = match (&backend, &_temp_dir) {
            (Some(backend), _) => {
                Database::open_with_backend(config.clone(), Box::new(backend.clone()))
            }
            (None, Some(dir)) => Database::open(dir.path().join(ARCHIVE_DIR), config.clone()),
            (None, None) => unreachable!("archive has neither backend nor directory"),
        }
        .expect("Failed to reopen database");

        Self {
            db: Arc::new(db),
            config,
            backend,
            _temp_dir,
        }
    }
}

impl std::ops::Deref for TestArchive {
    type Target = Database;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

/// Runs a test with a temporary in-memory archive.
///
/// # Example
///
/// ```rust,ignore
/// use pride_testkit::with_temp_archive;
///
/// #[test]
/// fn my_test() {
///     with_temp_archive(|archive| {
///         let files = archive.files();
///         // ... test operations
///     });
/// }
/// ```
pub fn with_temp_archive<F, R>(f: F) -> R
where
    F: FnOnce(&TestArchive) -> R,
{
    let archive = TestArchive::memory();
    f(&archive)
}

/// Runs a test with a temporary file-based archive.
pub fn with_file_archive<F, R>(f: F) -> R
where
    F: FnOnce(&TestArchive, &Path) -> R,
{
    let archive = TestArchive::file();
    let path = archive.path().expect("File archive should have a path");
    f(&archive, &path)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;
    use pride_core::model::{ArchiveFile, PeptideEvidence, ProteinEvidence, PsmSummaryEvidence};

    /// First test project.
    pub const PROJECT_1: &str = "PROJECT-1-ACCESSION";
    /// Second test project.
    pub const PROJECT_2: &str = "PROJECT-2-ACCESSION";
    /// First test assay.
    pub const ASSAY_1: &str = "ASSAY-1-ACCESSION";
    /// Second test assay.
    pub const ASSAY_2: &str = "ASSAY-2-ACCESSION";
    /// First test protein.
    pub const PROTEIN_1: &str = "PROTEIN-1-ACCESSION";
    /// Second test protein.
    pub const PROTEIN_2: &str = "PROTEIN-2-ACCESSION";

    const PSMS: &str = r#"[
        {
            "accession": "TEST-PSM-ID1",
            "usi": "mzspec:PROJECT-1-ACCESSION:run1:scan:1:MLVEYTQNQKEVLSEKEKKLEEYK/2",
            "peptideSequence": "MLVEYTQNQKEVLSEKEKKLEEYK",
            "spectrumAccession": "SPECTRUM-ID1",
            "proteinAccession": "PROTEIN-1-ACCESSION",
            "projectAccession": "PROJECT-1-ACCESSION",
            "assayAccession": "ASSAY-1-ACCESSION"
        },
        {
            "accession": "TEST-PSM-ID2",
            "usi": "mzspec:PROJECT-2-ACCESSION:run2:scan:1:YSQPEDSLIPFFEITVPESQLTVSQFTLPK/2",
            "peptideSequence": "YSQPEDSLIPFFEITVPESQLTVSQFTLPK",
            "spectrumAccession": "SPECTRUM-ID1",
            "proteinAccession": "PROTEIN-2-ACCESSION",
            "projectAccession": "PROJECT-2-ACCESSION",
            "assayAccession": "ASSAY-2-ACCESSION"
        },
        {
            "accession": "TEST-PSM-ID3",
            "usi": "mzspec:PROJECT-2-ACCESSION:run2:scan:3:YSQPEDSLIPFFEITVPE/2",
            "peptideSequence": "YSQPEDSLIPFFEITVPE",
            "spectrumAccession": "SPECTRUM-ID3",
            "proteinAccession": "PROTEIN-2-ACCESSION",
            "projectAccession": "PROJECT-2-ACCESSION",
            "assayAccession": "ASSAY-2-ACCESSION"
        }
    ]"#;

    /// The three canned PSMs, unsaved.
    pub fn test_psms() -> Vec<PsmSummaryEvidence> {
        serde_json::from_str(PSMS).expect("Invalid PSM fixture")
    }

    /// Creates an archive holding the canned PSMs.
    ///
    /// `PROJECT_1` has one PSM on `PROTEIN_1`; `PROJECT_2` has two on
    /// `PROTEIN_2`.
    pub fn psm_archive() -> TestArchive {
        let archive = TestArchive::memory();
        let service = archive.psms();
        for mut psm in test_psms() {
            service.save(&mut psm).expect("Failed to save PSM");
        }
        drop(service);
        archive
    }

    /// Creates an archive with two proteins in `PROJECT_1` and one decoy in
    /// `PROJECT_2`, each backed by two peptides.
    pub fn molecule_archive() -> TestArchive {
        let archive = TestArchive::memory();
        let service = archive.molecules();
        let proteins = [
            (PROTEIN_1, PROJECT_1, ASSAY_1, false),
            (PROTEIN_2, PROJECT_1, ASSAY_1, false),
            ("DECOY-PROTEIN", PROJECT_2, ASSAY_2, true),
        ];
        for (protein, project, assay, decoy) in proteins {
            let mut evidence = ProteinEvidence::new(protein, project, assay);
            evidence.is_decoy = decoy;
            evidence.number_psms = 2;
            service
                .save_protein_evidence(&mut evidence)
                .expect("Failed to save protein");

            for n in 1..=2 {
                let mut peptide =
                    PeptideEvidence::new(format!("{protein}-PEP{n}"), protein, project, assay);
                peptide.peptide_sequence = Some(format!("PEPTIDE{n}K"));
                peptide.is_decoy = decoy;
                service
                    .save_peptide_evidence(&mut peptide)
                    .expect("Failed to save peptide");
            }
        }
        drop(service);
        archive
    }

    /// Creates an archive holding `count` files of `project`, named
    /// `file-000.raw` upwards.
    pub fn file_archive(project: &str, count: usize) -> TestArchive {
        let archive = TestArchive::memory();
        let files = (0..count)
            .map(|i| ArchiveFile::new(format!("file-{i:03}.raw")).with_projects([project]))
            .collect();
        let results = archive.files().insert_all(files).expect("Failed to insert files");
        assert!(
            results.iter().all(|(_, result)| result.is_ok()),
            "Every fixture file should be stored"
        );
        archive
    }
}
