//! Integration tests across services, minting, queries and persistence.

use pride_core::model::{Analysis, ArchiveFile, ProteinEvidence};
use pride_core::service::{FileService, PeptideQuery};
use pride_core::store::{Database, Sort};
use pride_core::{
    AccessionFactory, Config, CoreError, PageRequest, SequenceAllocator, ANALYSIS_ACCESSION,
    FILE_ACCESSION,
};
use pride_storage::MemoryBackend;
use pride_testkit::prelude::*;
use pride_testkit::scenarios::{self, ASSAY_1, ASSAY_2, PROJECT_1, PROJECT_2, PROTEIN_1, PROTEIN_2};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;

fn page(number: u64, size: u64) -> PageRequest {
    PageRequest::of(number, size).unwrap()
}

#[test]
fn concurrent_inserts_mint_every_accession_once() {
    let archive = TestArchive::memory();
    let files = Arc::new(archive.files());

    let handles: Vec<_> = (0..10)
        .map(|t| {
            let files = Arc::clone(&files);
            thread::spawn(move || {
                (0..10)
                    .map(|i| {
                        files
                            .insert(&mut ArchiveFile::new(format!("{t}-{i}.raw")))
                            .unwrap()
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let minted: BTreeSet<String> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    let expected: BTreeSet<String> = (1..=100).map(|n| FILE_ACCESSION.format(n).unwrap()).collect();
    assert_eq!(minted, expected);
}

#[test]
fn batch_assigns_ascending_block_in_input_order() {
    let archive = TestArchive::memory();
    let files = archive.files();
    files.insert(&mut ArchiveFile::new("first.raw")).unwrap();

    let mut given = ArchiveFile::new("given.raw");
    given.accession = Some("PXF00000000777".to_string());
    let batch = vec![
        ArchiveFile::new("b0.raw"),
        given,
        ArchiveFile::new("b1.raw"),
        ArchiveFile::new("b2.raw"),
    ];

    let results = files.insert_all(batch).unwrap();
    assert_eq!(results.len(), 4);
    assert_eq!(results[1].0.file_name, "given.raw");
    assert!(matches!(results[1].1, Err(CoreError::AlreadyAssigned { .. })));

    let minted: Vec<String> = results
        .iter()
        .filter_map(|(_, result)| result.as_ref().ok())
        .map(|file| file.accession.clone().unwrap())
        .collect();
    assert_eq!(
        minted,
        vec!["PXF00000000002", "PXF00000000003", "PXF00000000004"]
    );
    assert_eq!(results[3].1.as_ref().unwrap().file_name, "b2.raw");

    let allocator = SequenceAllocator::new(archive.store());
    assert_eq!(allocator.reserve(FILE_ACCESSION.sequence(), 1).unwrap(), 4);
}

#[test]
fn existing_accession_is_refused_without_spending() {
    let archive = TestArchive::memory();
    archive.files().insert(&mut ArchiveFile::new("a.raw")).unwrap();
    accessions::test_existing_accession_is_refused(&archive);

    let mut next = ArchiveFile::new("b.raw");
    assert_eq!(archive.files().insert(&mut next).unwrap(), "PXF00000000002");
}

#[test]
fn accession_sequences_are_independent() {
    accessions::test_sequences_are_independent(&TestArchive::memory());
}

#[test]
fn factory_and_services_share_counters() {
    let archive = TestArchive::memory();
    let factory = AccessionFactory::new(archive.store());

    let mut analysis = Analysis::new("standalone");
    assert_eq!(
        factory.mint_single(&mut analysis, &ANALYSIS_ACCESSION).unwrap(),
        "PXDA000001"
    );
    let mut stored = Analysis::new("stored");
    assert_eq!(archive.analyses().insert(&mut stored).unwrap(), "PXDA000002");
}

#[test]
fn filters_compile_to_the_expected_matches() {
    let archive = TestArchive::memory();
    let files = archive.files();
    let both = files
        .insert(&mut ArchiveFile::new("both.raw").with_projects(["PXD1", "PXD2"]))
        .unwrap();
    let one = files
        .insert(&mut ArchiveFile::new("one.mzid").with_category("RESULT").with_projects(["PXD1"]))
        .unwrap();
    files
        .insert(&mut ArchiveFile::new("other.raw").with_projects(["PXD3"]))
        .unwrap();

    let accessions = |filter: &str| -> Vec<String> {
        files
            .search_files(filter, &page(0, 100))
            .unwrap()
            .items
            .into_iter()
            .filter_map(|f| f.accession)
            .collect()
    };

    assert_eq!(accessions("projectAccessions=all=PXD1,PXD2"), vec![both.clone()]);
    assert_eq!(accessions("projectAccessions=in=PXD1,PXD2").len(), 2);
    assert_eq!(accessions("fileCategory==RESULT"), vec![one.clone()]);
    assert_eq!(accessions("fileName=*.MZID"), vec![one.clone()]);
    assert_eq!(accessions("fileName=both*,projectAccessions=PXD2"), vec![both]);
    assert_eq!(accessions("fileName=*.raw,projectAccessions=PXD1").len(), 1);
    assert_eq!(accessions("").len(), 3);

    assert!(matches!(
        files.search_files("fileName=a,b", &page(0, 10)),
        Err(CoreError::FilterSyntax { .. })
    ));
    assert!(matches!(
        files.search_files("fileName=x=y", &page(0, 10)),
        Err(CoreError::FilterSyntax { .. })
    ));
    queries::test_unknown_field_is_rejected(&archive);
}

#[test]
fn project_scope_is_anded_with_caller_filter() {
    let archive = TestArchive::memory();
    let files = archive.files();
    files
        .insert(&mut ArchiveFile::new("a.raw").with_category("RAW").with_projects(["PXD1"]))
        .unwrap();
    files
        .insert(&mut ArchiveFile::new("b.mzid").with_category("RESULT").with_projects(["PXD1"]))
        .unwrap();
    files
        .insert(&mut ArchiveFile::new("c.raw").with_category("RAW").with_projects(["PXD2"]))
        .unwrap();

    let scoped = files
        .find_files_by_project_accession_and_filter("PXD1", "fileCategory=RAW", &page(0, 10))
        .unwrap();
    assert_eq!(scoped.total_elements, 1);
    assert_eq!(scoped.items[0].file_name, "a.raw");

    let unfiltered = files
        .find_files_by_project_accession_and_filter("PXD1", "", &page(0, 10))
        .unwrap();
    assert_eq!(unfiltered.total_elements, 2);
}

#[test]
fn twenty_five_files_in_pages_of_ten() {
    let archive = scenarios::file_archive("PXD1", 25);
    let files = archive.files();

    let second = files
        .search_files("projectAccessions=all=PXD1", &page(2, 10))
        .unwrap();
    assert_eq!(second.len(), 5);
    assert_eq!(second.total_elements, 25);
    assert_eq!(second.total_pages(), 3);

    let past_end = files
        .search_files("projectAccessions=all=PXD1", &page(3, 10))
        .unwrap();
    assert!(past_end.is_empty());
    assert_eq!(past_end.total_elements, 25);

    queries::test_page_walk(&archive, "projectAccessions=all=PXD1", 25, 10);
}

#[test]
fn invalid_pages_are_rejected() {
    assert!(matches!(PageRequest::new(-1, 10), Err(CoreError::InvalidPage { .. })));
    assert!(matches!(PageRequest::new(0, 0), Err(CoreError::InvalidPage { .. })));

    let archive = TestArchive::memory();
    let oversized = archive.files().find_all(&page(0, 1_001));
    assert!(matches!(oversized, Err(CoreError::InvalidPage { .. })));
}

#[test]
fn file_archive_survives_reopen() {
    let archive = TestArchive::file();
    let accession = archive
        .files()
        .insert(&mut ArchiveFile::new("kept.raw").with_projects(["PXD1"]))
        .unwrap();
    archive
        .analyses()
        .insert(&mut Analysis::new("kept"))
        .unwrap();

    let archive = archive.reopen();
    let files = archive.files();
    let stored = files.find_by_file_accession(&accession).unwrap().unwrap();
    assert_eq!(stored.file_name, "kept.raw");

    assert_eq!(
        files.insert(&mut ArchiveFile::new("next.raw")).unwrap(),
        "PXF00000000002"
    );
    assert_eq!(
        archive.analyses().insert(&mut Analysis::new("next")).unwrap(),
        "PXDA000002"
    );
}

#[test]
fn second_open_of_a_locked_archive_fails() {
    with_file_archive(|_archive, path| {
        let second = Database::open(path, Config::default());
        assert!(matches!(second, Err(CoreError::DatabaseLocked)));
    });
}

#[test]
fn harness_round_trip_through_disk() {
    let mut harness = ArchiveHarness::with_archive(TestArchive::file());
    harness.insert_file(ArchiveFile::new("a.raw").with_projects(["PXD1"]));
    harness.insert_analysis(Analysis::new("reanalysis"));
    harness.reopen().verify_all();
}

#[test]
fn failed_batch_write_only_fails_that_file() {
    let backend = MemoryBackend::new();
    let db = Database::open_with_backend(Config::default(), Box::new(backend.clone())).unwrap();
    let files = FileService::new(Arc::new(db), &Config::default());

    // Counter update plus two files.
    backend.fail_appends_after(3);
    let results = files
        .insert_all(vec![
            ArchiveFile::new("a.raw"),
            ArchiveFile::new("b.raw"),
            ArchiveFile::new("c.raw"),
        ])
        .unwrap();
    assert!(results[0].1.is_ok());
    assert!(results[1].1.is_ok());
    assert!(matches!(results[2].1, Err(CoreError::Storage(_))));
    assert_eq!(files.count().unwrap(), 2);

    backend.heal();
    assert_eq!(
        files.insert(&mut ArchiveFile::new("d.raw")).unwrap(),
        "PXF00000000004"
    );
}

#[test]
fn psms_by_accession_and_project() {
    let archive = scenarios::psm_archive();
    let psms = archive.psms();

    for id in ["TEST-PSM-ID1", "TEST-PSM-ID2", "TEST-PSM-ID3"] {
        assert_eq!(psms.find_by_accession(id).unwrap().unwrap().accession, id);
    }
    assert!(psms.find_by_accession("TEST-PSM-ID4").unwrap().is_none());

    assert_eq!(psms.count_by_project_accession(PROJECT_1).unwrap(), 1);
    assert_eq!(psms.count_by_project_accession(PROJECT_2).unwrap(), 2);
}

#[test]
fn psms_by_ids_sorted_descending() {
    let archive = scenarios::psm_archive();
    let found = archive
        .psms()
        .find_by_ids_in(
            ["TEST-PSM-ID1", "TEST-PSM-ID3", "TEST-PSM-ID9"],
            Some(Sort::descending("accession")),
        )
        .unwrap();
    let ids: Vec<&str> = found.iter().map(|p| p.accession.as_str()).collect();
    assert_eq!(ids, vec!["TEST-PSM-ID3", "TEST-PSM-ID1"]);
}

#[test]
fn psm_wildcard_searches() {
    let archive = scenarios::psm_archive();
    let psms = archive.psms();
    let total = |filter: &str| psms.search_psms(filter, &page(0, 10)).unwrap().total_elements;

    assert_eq!(total("proteinAccession=PROTEIN-*"), 3);
    assert_eq!(total("proteinAccession=*1-ACCESSION"), 1);
    assert_eq!(total("proteinAccession=*2-ACCESSION"), 2);
    assert_eq!(total("proteinAccession=protein-*"), 3);
    assert_eq!(total(&format!("proteinAccession=*2-ACCESSION,assayAccession={ASSAY_1}")), 0);
}

#[test]
fn psm_save_replaces_by_accession() {
    let archive = scenarios::psm_archive();
    let psms = archive.psms();

    let mut changed = scenarios::test_psms().remove(0);
    changed.assay_accession = Some(ASSAY_2.to_string());
    psms.save(&mut changed).unwrap();

    assert_eq!(psms.count().unwrap(), 3);
    let stored = psms.find_by_accession("TEST-PSM-ID1").unwrap().unwrap();
    assert_eq!(stored.assay_accession.as_deref(), Some(ASSAY_2));

    let usis = psms
        .find_by_usis([stored.usi.clone().unwrap()], &page(0, 10))
        .unwrap();
    assert_eq!(usis.total_elements, 1);

    assert_eq!(psms.delete_all().unwrap(), 3);
    assert_eq!(psms.count().unwrap(), 0);
}

#[test]
fn molecule_lookups() {
    let archive = scenarios::molecule_archive();
    let molecules = archive.molecules();

    let proteins = molecules
        .find_proteins_by_project_accession(PROJECT_1, &page(0, 10))
        .unwrap();
    assert_eq!(proteins.total_elements, 2);

    let evidence = molecules
        .get_protein_evidence(PROTEIN_2, PROJECT_1, ASSAY_1)
        .unwrap()
        .unwrap();
    assert_eq!(evidence.number_psms, 2);
    assert!(molecules
        .get_protein_evidence(PROTEIN_2, PROJECT_2, ASSAY_1)
        .unwrap()
        .is_none());

    assert_eq!(molecules.count_by_project_accession(PROJECT_2).unwrap(), 2);
    assert_eq!(molecules.count_by_assay_accession(ASSAY_1).unwrap(), 4);
    assert_eq!(
        molecules
            .find_peptide_evidences_by_assay_accession(ASSAY_2, &page(0, 10))
            .unwrap()
            .total_elements,
        2
    );

    let peptides = molecules
        .find_peptide_evidences_by_protein_evidence(PROTEIN_1, PROJECT_1, ASSAY_1, &page(0, 10))
        .unwrap();
    assert_eq!(peptides.total_elements, 2);

    let both_proteins = format!("{PROTEIN_1},{PROTEIN_2}");
    let query = PeptideQuery {
        project_accession: Some(PROJECT_1),
        protein_accession: Some(&both_proteins),
        peptide_sequence: Some("PEPTIDE1K"),
        ..PeptideQuery::default()
    };
    let found = molecules.find_peptide_evidences(&query, &page(0, 10)).unwrap();
    assert_eq!(found.total_elements, 2);

    let one = molecules
        .find_peptide_evidence(PROJECT_1, ASSAY_1, PROTEIN_1, &format!("{PROTEIN_1}-PEP2"))
        .unwrap()
        .unwrap();
    assert_eq!(one.peptide_sequence.as_deref(), Some("PEPTIDE2K"));
}

#[test]
fn saving_protein_twice_updates_in_place() {
    let archive = scenarios::molecule_archive();
    let molecules = archive.molecules();

    let mut again = ProteinEvidence::new(PROTEIN_1, PROJECT_1, ASSAY_1);
    again.number_psms = 9;
    molecules.save_protein_evidence(&mut again).unwrap();

    let all = molecules.find_all_protein_evidences(&page(0, 10)).unwrap();
    assert_eq!(all.total_elements, 3);
    let stored = molecules
        .get_protein_evidence(PROTEIN_1, PROJECT_1, ASSAY_1)
        .unwrap()
        .unwrap();
    assert_eq!(stored.number_psms, 9);
}

#[test]
fn protein_wildcard_after_double_equals() {
    let archive = scenarios::molecule_archive();
    let molecules = archive.molecules();

    let found = molecules
        .search_proteins("reportedAccession==PROTEIN-*", &page(0, 10))
        .unwrap();
    let mut reported: Vec<&str> = found
        .items
        .iter()
        .map(|p| p.reported_accession.as_str())
        .collect();
    reported.sort_unstable();
    assert_eq!(reported, vec![PROTEIN_1, PROTEIN_2]);

    let decoys = molecules
        .search_proteins("reportedAccession=*-PROTEIN,isDecoy=true", &page(0, 10))
        .unwrap();
    assert_eq!(decoys.total_elements, 1);
}
