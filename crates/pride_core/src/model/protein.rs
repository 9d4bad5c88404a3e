use super::{fields, non_negative, optional_text, required_text, stored_integer};
use crate::document::{Document, Value};
use crate::error::CoreResult;
use crate::repository::DocumentCodec;
use crate::types::DocumentId;
use serde::{Deserialize, Serialize};

/// A protein reported for one assay of a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProteinEvidence {
    /// Store id.
    #[serde(skip)]
    pub id: Option<DocumentId>,
    /// Protein accession as reported.
    pub reported_accession: String,
    /// Owning project.
    pub project_accession: String,
    /// Assay the protein was reported in.
    pub assay_accession: String,
    /// Amino-acid sequence.
    pub protein_sequence: Option<String>,
    /// Other members of the protein group.
    pub protein_group_members: Vec<String>,
    /// Whether this is a decoy hit.
    pub is_decoy: bool,
    /// Supporting PSM count.
    pub number_psms: u64,
}

impl ProteinEvidence {
    /// A new, unsaved protein evidence.
    pub fn new(
        reported_accession: impl Into<String>,
        project_accession: impl Into<String>,
        assay_accession: impl Into<String>,
    ) -> Self {
        Self {
            reported_accession: reported_accession.into(),
            project_accession: project_accession.into(),
            assay_accession: assay_accession.into(),
            ..Self::default()
        }
    }
}

impl DocumentCodec for ProteinEvidence {
    const COLLECTION: &'static str = "proteins";
    const FIELDS: &'static [&'static str] = &[
        fields::REPORTED_ACCESSION,
        fields::PROJECT_ACCESSION,
        fields::ASSAY_ACCESSION,
        "proteinSequence",
        "proteinGroupMembers",
        "isDecoy",
        "numberPsms",
    ];

    fn document_id(&self) -> Option<DocumentId> {
        self.id
    }

    fn set_document_id(&mut self, id: DocumentId) {
        self.id = Some(id);
    }

    fn encode(&self) -> CoreResult<Document> {
        let psms = stored_integer(Self::COLLECTION, "numberPsms", self.number_psms)?;
        Ok(Document::new()
            .with(fields::REPORTED_ACCESSION, self.reported_accession.as_str())
            .with(fields::PROJECT_ACCESSION, self.project_accession.as_str())
            .with(fields::ASSAY_ACCESSION, self.assay_accession.as_str())
            .with("proteinSequence", self.protein_sequence.clone())
            .with("proteinGroupMembers", self.protein_group_members.clone())
            .with("isDecoy", self.is_decoy)
            .with("numberPsms", psms))
    }

    fn decode(id: DocumentId, doc: &Document) -> CoreResult<Self> {
        Ok(Self {
            id: Some(id),
            reported_accession: required_text(Self::COLLECTION, doc, fields::REPORTED_ACCESSION)?,
            project_accession: required_text(Self::COLLECTION, doc, fields::PROJECT_ACCESSION)?,
            assay_accession: required_text(Self::COLLECTION, doc, fields::ASSAY_ACCESSION)?,
            protein_sequence: optional_text(doc, "proteinSequence"),
            protein_group_members: doc.text_list("proteinGroupMembers"),
            is_decoy: doc.get("isDecoy").and_then(Value::as_bool).unwrap_or(false),
            number_psms: non_negative(Self::COLLECTION, doc, "numberPsms")?.unwrap_or(0),
        })
    }
}
