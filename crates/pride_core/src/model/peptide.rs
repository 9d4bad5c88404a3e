use super::{fields, optional_text, required_text};
use crate::document::{Document, Value};
use crate::error::CoreResult;
use crate::repository::DocumentCodec;
use crate::types::DocumentId;
use serde::{Deserialize, Serialize};

/// A peptide supporting a protein in one assay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeptideEvidence {
    /// Store id.
    #[serde(skip)]
    pub id: Option<DocumentId>,
    /// Peptide accession.
    pub peptide_accession: String,
    /// Amino-acid sequence.
    pub peptide_sequence: Option<String>,
    /// Protein the peptide maps to.
    pub protein_accession: String,
    /// Owning project.
    pub project_accession: String,
    /// Assay the peptide was reported in.
    pub assay_accession: String,
    /// Whether this is a decoy hit.
    pub is_decoy: bool,
}

impl PeptideEvidence {
    /// A new, unsaved peptide evidence.
    pub fn new(
        peptide_accession: impl Into<String>,
        protein_accession: impl Into<String>,
        project_accession: impl Into<String>,
        assay_accession: impl Into<String>,
    ) -> Self {
        Self {
            peptide_accession: peptide_accession.into(),
            protein_accession: protein_accession.into(),
            project_accession: project_accession.into(),
            assay_accession: assay_accession.into(),
            ..Self::default()
        }
    }
}

impl DocumentCodec for PeptideEvidence {
    const COLLECTION: &'static str = "peptides";
    const FIELDS: &'static [&'static str] = &[
        fields::PEPTIDE_ACCESSION,
        fields::PEPTIDE_SEQUENCE,
        fields::PROTEIN_ACCESSION,
        fields::PROJECT_ACCESSION,
        fields::ASSAY_ACCESSION,
        "isDecoy",
    ];

    fn document_id(&self) -> Option<DocumentId> {
        self.id
    }

    fn set_document_id(&mut self, id: DocumentId) {
        self.id = Some(id);
    }

    fn encode(&self) -> CoreResult<Document> {
        Ok(Document::new()
            .with(fields::PEPTIDE_ACCESSION, self.peptide_accession.as_str())
            .with(fields::PEPTIDE_SEQUENCE, self.peptide_sequence.clone())
            .with(fields::PROTEIN_ACCESSION, self.protein_accession.as_str())
            .with(fields::PROJECT_ACCESSION, self.project_accession.as_str())
            .with(fields::ASSAY_ACCESSION, self.assay_accession.as_str())
            .with("isDecoy", self.is_decoy))
    }

    fn decode(id: DocumentId, doc: &Document) -> CoreResult<Self> {
        Ok(Self {
            id: Some(id),
            peptide_accession: required_text(Self::COLLECTION, doc, fields::PEPTIDE_ACCESSION)?,
            peptide_sequence: optional_text(doc, fields::PEPTIDE_SEQUENCE),
            protein_accession: required_text(Self::COLLECTION, doc, fields::PROTEIN_ACCESSION)?,
            project_accession: required_text(Self::COLLECTION, doc, fields::PROJECT_ACCESSION)?,
            assay_accession: required_text(Self::COLLECTION, doc, fields::ASSAY_ACCESSION)?,
            is_decoy: doc.get("isDecoy").and_then(Value::as_bool).unwrap_or(false),
        })
    }
}
