use super::{fields, non_negative, optional_text, stored_integer, text_set};
use crate::accession::Accessioned;
use crate::document::{Document, Value};
use crate::error::CoreResult;
use crate::repository::DocumentCodec;
use crate::types::DocumentId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A file deposited in the archive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveFile {
    /// Store id.
    #[serde(skip)]
    pub id: Option<DocumentId>,
    /// `PXF` accession, minted on insert.
    pub accession: Option<String>,
    /// File name as submitted.
    pub file_name: String,
    /// Category such as `RAW` or `RESULT`.
    pub file_category: Option<String>,
    /// Size in bytes.
    pub file_size_bytes: Option<u64>,
    /// Checksum of the file contents.
    pub checksum: Option<String>,
    /// Projects the file belongs to.
    pub project_accessions: BTreeSet<String>,
    /// Analyses the file belongs to.
    pub analysis_accessions: BTreeSet<String>,
}

impl ArchiveFile {
    /// A new, unsaved file.
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            ..Self::default()
        }
    }

    /// Sets the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.file_category = Some(category.into());
        self
    }

    /// Adds project accessions.
    #[must_use]
    pub fn with_projects<I, S>(mut self, projects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.project_accessions.extend(projects.into_iter().map(Into::into));
        self
    }
}

fn list(set: &BTreeSet<String>) -> Value {
    Value::Array(set.iter().map(|s| Value::Text(s.clone())).collect())
}

impl DocumentCodec for ArchiveFile {
    const COLLECTION: &'static str = "files";
    const FIELDS: &'static [&'static str] = &[
        fields::ACCESSION,
        "fileName",
        "fileCategory",
        "fileSizeBytes",
        "checksum",
        fields::PROJECT_ACCESSIONS,
        fields::ANALYSIS_ACCESSIONS,
    ];

    fn document_id(&self) -> Option<DocumentId> {
        self.id
    }

    fn set_document_id(&mut self, id: DocumentId) {
        self.id = Some(id);
    }

    fn encode(&self) -> CoreResult<Document> {
        let size = self
            .file_size_bytes
            .map(|size| stored_integer(Self::COLLECTION, "fileSizeBytes", size))
            .transpose()?;
        Ok(Document::new()
            .with(fields::ACCESSION, self.accession.clone())
            .with("fileName", self.file_name.as_str())
            .with("fileCategory", self.file_category.clone())
            .with("fileSizeBytes", size)
            .with("checksum", self.checksum.clone())
            .with(fields::PROJECT_ACCESSIONS, list(&self.project_accessions))
            .with(fields::ANALYSIS_ACCESSIONS, list(&self.analysis_accessions)))
    }

    fn decode(id: DocumentId, doc: &Document) -> CoreResult<Self> {
        Ok(Self {
            id: Some(id),
            accession: optional_text(doc, fields::ACCESSION),
            file_name: optional_text(doc, "fileName").unwrap_or_default(),
            file_category: optional_text(doc, "fileCategory"),
            file_size_bytes: non_negative(Self::COLLECTION, doc, "fileSizeBytes")?,
            checksum: optional_text(doc, "checksum"),
            project_accessions: text_set(doc, fields::PROJECT_ACCESSIONS),
            analysis_accessions: text_set(doc, fields::ANALYSIS_ACCESSIONS),
        })
    }
}

impl Accessioned for ArchiveFile {
    fn accession(&self) -> Option<&str> {
        self.accession.as_deref()
    }

    fn set_accession(&mut self, accession: String) {
        self.accession = Some(accession);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    #[test]
    fn document_round_trip_keeps_sets() {
        let mut file = ArchiveFile::new("run1.raw")
            .with_category("RAW")
            .with_projects(["PXD000002", "PXD000001"]);
        file.file_size_bytes = Some(1024);
        file.accession = Some("PXF00000000001".into());

        let doc = file.encode().unwrap();
        assert_eq!(
            doc.text_list(fields::PROJECT_ACCESSIONS),
            vec!["PXD000001", "PXD000002"]
        );
        let back = ArchiveFile::decode(DocumentId::new(4), &doc).unwrap();
        assert_eq!(back.id, Some(DocumentId::new(4)));
        assert_eq!(back.file_name, "run1.raw");
        assert_eq!(back.file_size_bytes, Some(1024));
        assert_eq!(back.project_accessions, file.project_accessions);
    }

    #[test]
    fn negative_size_is_rejected() {
        let doc = Document::new().with("fileName", "x").with("fileSizeBytes", -1i64);
        assert!(ArchiveFile::decode(DocumentId::new(1), &doc).is_err());
    }

    #[test]
    fn size_beyond_integer_range_is_rejected() {
        let mut file = ArchiveFile::new("huge.raw");
        file.file_size_bytes = Some(u64::MAX);
        assert!(matches!(
            file.encode(),
            Err(CoreError::InvalidDocument { .. })
        ));

        file.file_size_bytes = Some(i64::MAX as u64);
        let back = ArchiveFile::decode(DocumentId::new(1), &file.encode().unwrap()).unwrap();
        assert_eq!(back.file_size_bytes, Some(i64::MAX as u64));
    }

    #[test]
    fn json_uses_camel_case() {
        let json = serde_json::to_value(ArchiveFile::new("a.raw")).unwrap();
        assert_eq!(json["fileName"], "a.raw");
        assert!(json.get("id").is_none());
    }
}
