use super::{fields, optional_text, required_text};
use crate::document::Document;
use crate::error::CoreResult;
use crate::repository::DocumentCodec;
use crate::types::DocumentId;
use serde::{Deserialize, Serialize};

/// Summary of one peptide-spectrum match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PsmSummaryEvidence {
    /// Store id.
    #[serde(skip)]
    pub id: Option<DocumentId>,
    /// PSM accession, assigned by the submission pipeline.
    pub accession: String,
    /// Universal spectrum identifier.
    pub usi: Option<String>,
    /// Matched peptide sequence.
    pub peptide_sequence: Option<String>,
    /// Spectrum accession within its file.
    pub spectrum_accession: Option<String>,
    /// Protein the peptide maps to.
    pub protein_accession: Option<String>,
    /// Owning project.
    pub project_accession: Option<String>,
    /// Assay the PSM comes from.
    pub assay_accession: Option<String>,
}

impl PsmSummaryEvidence {
    /// A new, unsaved PSM summary.
    pub fn new(accession: impl Into<String>) -> Self {
        Self {
            accession: accession.into(),
            ..Self::default()
        }
    }
}

impl DocumentCodec for PsmSummaryEvidence {
    const COLLECTION: &'static str = "psms";
    const FIELDS: &'static [&'static str] = &[
        fields::ACCESSION,
        fields::USI,
        fields::PEPTIDE_SEQUENCE,
        "spectrumAccession",
        fields::PROTEIN_ACCESSION,
        fields::PROJECT_ACCESSION,
        fields::ASSAY_ACCESSION,
    ];

    fn document_id(&self) -> Option<DocumentId> {
        self.id
    }

    fn set_document_id(&mut self, id: DocumentId) {
        self.id = Some(id);
    }

    fn encode(&self) -> CoreResult<Document> {
        Ok(Document::new()
            .with(fields::ACCESSION, self.accession.as_str())
            .with(fields::USI, self.usi.clone())
            .with(fields::PEPTIDE_SEQUENCE, self.peptide_sequence.clone())
            .with("spectrumAccession", self.spectrum_accession.clone())
            .with(fields::PROTEIN_ACCESSION, self.protein_accession.clone())
            .with(fields::PROJECT_ACCESSION, self.project_accession.clone())
            .with(fields::ASSAY_ACCESSION, self.assay_accession.clone()))
    }

    fn decode(id: DocumentId, doc: &Document) -> CoreResult<Self> {
        Ok(Self {
            id: Some(id),
            accession: required_text(Self::COLLECTION, doc, fields::ACCESSION)?,
            usi: optional_text(doc, fields::USI),
            peptide_sequence: optional_text(doc, fields::PEPTIDE_SEQUENCE),
            spectrum_accession: optional_text(doc, "spectrumAccession"),
            protein_accession: optional_text(doc, fields::PROTEIN_ACCESSION),
            project_accession: optional_text(doc, fields::PROJECT_ACCESSION),
            assay_accession: optional_text(doc, fields::ASSAY_ACCESSION),
        })
    }
}
