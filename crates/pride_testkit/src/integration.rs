//! Cross-module integration test helpers.
//!
//! Provides utilities for checking that services, accession minting and
//! the store agree with each other.

use crate::fixtures::TestArchive;
use pride_core::model::{Analysis, ArchiveFile};
use pride_core::{CoreError, ANALYSIS_ACCESSION, FILE_ACCESSION};
use std::collections::BTreeMap;

/// A test harness that remembers everything it inserted.
pub struct ArchiveHarness {
    /// The archive under test.
    pub archive: TestArchive,
    files: BTreeMap<String, ArchiveFile>,
    analyses: BTreeMap<String, Analysis>,
}

impl ArchiveHarness {
    /// Creates a new harness over an in-memory archive.
    pub fn new() -> Self {
        Self::with_archive(TestArchive::memory())
    }

    /// Creates a new harness over `archive`.
    pub fn with_archive(archive: TestArchive) -> Self {
        Self {
            archive,
            files: BTreeMap::new(),
            analyses: BTreeMap::new(),
        }
    }

    /// Inserts a file and tracks it under its new accession.
    pub fn insert_file(&mut self, mut file: ArchiveFile) -> String {
        let accession = self
            .archive
            .files()
            .insert(&mut file)
            .expect("Failed to insert file");
        assert!(FILE_ACCESSION.matches(&accession), "Malformed accession {accession}");
        self.files.insert(accession.clone(), file);
        accession
    }

    /// Inserts an analysis and tracks it under its new accession.
    pub fn insert_analysis(&mut self, mut analysis: Analysis) -> String {
        let accession = self
            .archive
            .analyses()
            .insert(&mut analysis)
            .expect("Failed to insert analysis");
        assert!(ANALYSIS_ACCESSION.matches(&accession), "Malformed accession {accession}");
        self.analyses.insert(accession.clone(), analysis);
        accession
    }

    /// Verifies all tracked entities are in the archive.
    pub fn verify_all(&self) {
        let files = self.archive.files();
        for (accession, expected) in &self.files {
            let actual = files
                .find_by_file_accession(accession)
                .expect("Failed to get file");
            assert_eq!(actual.as_ref(), Some(expected), "File mismatch for {accession}");
        }

        let analyses = self.archive.analyses();
        for (accession, expected) in &self.analyses {
            let actual = analyses
                .find_by_accession(accession)
                .expect("Failed to get analysis");
            assert_eq!(actual.as_ref(), Some(expected), "Analysis mismatch for {accession}");
        }
    }

    /// Returns the count of tracked entities.
    pub fn tracked_count(&self) -> usize {
        self.files.len() + self.analyses.len()
    }

    /// Closes and reopens the archive, keeping the tracked entities.
    pub fn reopen(self) -> Self {
        Self {
            archive: self.archive.reopen(),
            files: self.files,
            analyses: self.analyses,
        }
    }
}

impl Default for ArchiveHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Accession minting checks.
pub mod accessions {
    use super::*;

    /// Checks that inserting an entity that already has an accession is
    /// refused and spends no sequence value.
    pub fn test_existing_accession_is_refused(archive: &TestArchive) {
        let files = archive.files();
        let allocator = pride_core::SequenceAllocator::new(archive.store());
        let before = allocator
            .current(FILE_ACCESSION.sequence())
            .expect("Failed to read sequence");

        let mut file = ArchiveFile::new("given.raw");
        file.accession = Some("PXF00000000099".to_string());
        let result = files.insert(&mut file);
        assert!(
            matches!(result, Err(CoreError::AlreadyAssigned { .. })),
            "Insert should be refused, got {result:?}"
        );
        assert_eq!(file.accession.as_deref(), Some("PXF00000000099"));

        let after = allocator
            .current(FILE_ACCESSION.sequence())
            .expect("Failed to read sequence");
        assert_eq!(before, after, "No sequence value should be spent");
    }

    /// Checks that file and analysis accessions come from separate counters.
    pub fn test_sequences_are_independent(archive: &TestArchive) {
        let mut file = ArchiveFile::new("a.raw");
        let mut analysis = Analysis::new("reanalysis");
        let file_accession = archive.files().insert(&mut file).expect("Failed to insert file");
        let analysis_accession = archive
            .analyses()
            .insert(&mut analysis)
            .expect("Failed to insert analysis");

        assert_eq!(file_accession, FILE_ACCESSION.format(1).expect("Format failed"));
        assert_eq!(
            analysis_accession,
            ANALYSIS_ACCESSION.format(1).expect("Format failed")
        );
    }
}

/// Filter and paging checks.
pub mod queries {
    use super::*;
    use pride_core::PageRequest;

    /// Checks that a filter on a field outside the allow-list fails instead
    /// of matching everything.
    pub fn test_unknown_field_is_rejected(archive: &TestArchive) {
        let result = archive
            .files()
            .search_files("noSuchField=x", &PageRequest::first(10).expect("Bad page"));
        assert!(
            matches!(result, Err(CoreError::UnknownField { .. })),
            "Unknown field should be rejected, got {result:?}"
        );
    }

    /// Checks page sizes and totals for `total` files in pages of `size`.
    pub fn test_page_walk(archive: &TestArchive, filter: &str, total: u64, size: u64) {
        let files = archive.files();
        let pages = total.div_ceil(size);
        for number in 0..=pages {
            let page = files
                .search_files(filter, &PageRequest::of(number, size).expect("Bad page"))
                .expect("Search failed");
            let expected = total.saturating_sub(number * size).min(size);
            assert_eq!(page.total_elements, total);
            assert_eq!(page.len() as u64, expected, "Wrong size for page {number}");
        }
    }
}
