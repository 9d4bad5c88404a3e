use super::{
    fields, non_negative, optional_text, required_text, stored_integer, text_set, ArchiveFile,
};
use crate::document::{Document, Value};
use crate::error::CoreResult;
use crate::repository::DocumentCodec;
use crate::types::DocumentId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Acquisition details of a raw file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MsRunMetadata {
    /// Instrument the run was acquired on.
    pub instrument_model: Option<String>,
    /// Number of spectra in the run.
    pub scan_count: Option<u64>,
    /// Acquisition start, as reported by the instrument.
    pub acquisition_date: Option<String>,
}

/// A mass-spectrometry run, keyed by the accession of its raw file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MsRun {
    /// Store id.
    #[serde(skip)]
    pub id: Option<DocumentId>,
    /// `PXF` accession of the raw file.
    pub accession: String,
    /// File name of the raw file.
    pub file_name: String,
    /// Projects the raw file belongs to.
    pub project_accessions: BTreeSet<String>,
    /// Acquisition details.
    #[serde(flatten)]
    pub metadata: MsRunMetadata,
}

impl MsRun {
    /// A run describing `file`, without acquisition details.
    pub fn from_file(file: &ArchiveFile) -> Self {
        Self {
            id: None,
            accession: file.accession.clone().unwrap_or_default(),
            file_name: file.file_name.clone(),
            project_accessions: file.project_accessions.clone(),
            metadata: MsRunMetadata::default(),
        }
    }

    /// Overwrites the details `metadata` carries and keeps the others.
    pub fn apply(&mut self, metadata: &MsRunMetadata) {
        if let Some(model) = &metadata.instrument_model {
            self.metadata.instrument_model = Some(model.clone());
        }
        if let Some(count) = metadata.scan_count {
            self.metadata.scan_count = Some(count);
        }
        if let Some(date) = &metadata.acquisition_date {
            self.metadata.acquisition_date = Some(date.clone());
        }
    }
}

impl DocumentCodec for MsRun {
    const COLLECTION: &'static str = "msruns";
    const FIELDS: &'static [&'static str] = &[
        fields::ACCESSION,
        "fileName",
        fields::PROJECT_ACCESSIONS,
        "instrumentModel",
        "scanCount",
        "acquisitionDate",
    ];

    fn document_id(&self) -> Option<DocumentId> {
        self.id
    }

    fn set_document_id(&mut self, id: DocumentId) {
        self.id = Some(id);
    }

    fn encode(&self) -> CoreResult<Document> {
        let scans = self
            .metadata
            .scan_count
            .map(|count| stored_integer(Self::COLLECTION, "scanCount", count))
            .transpose()?;
        Ok(Document::new()
            .with(fields::ACCESSION, self.accession.as_str())
            .with("fileName", self.file_name.as_str())
            .with(
                fields::PROJECT_ACCESSIONS,
                Value::Array(
                    self.project_accessions
                        .iter()
                        .map(|p| Value::Text(p.clone()))
                        .collect(),
                ),
            )
            .with("instrumentModel", self.metadata.instrument_model.clone())
            .with("scanCount", scans)
            .with("acquisitionDate", self.metadata.acquisition_date.clone()))
    }

    fn decode(id: DocumentId, doc: &Document) -> CoreResult<Self> {
        Ok(Self {
            id: Some(id),
            accession: required_text(Self::COLLECTION, doc, fields::ACCESSION)?,
            file_name: optional_text(doc, "fileName").unwrap_or_default(),
            project_accessions: text_set(doc, fields::PROJECT_ACCESSIONS),
            metadata: MsRunMetadata {
                instrument_model: optional_text(doc, "instrumentModel"),
                scan_count: non_negative(Self::COLLECTION, doc, "scanCount")?,
                acquisition_date: optional_text(doc, "acquisitionDate"),
            },
        })
    }
}
