use super::{fields, optional_text, required_text, text_set};
use crate::accession::Accessioned;
use crate::document::{Document, Value};
use crate::error::CoreResult;
use crate::repository::DocumentCodec;
use crate::types::DocumentId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A reanalysis of one or more archive projects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    /// Store id.
    #[serde(skip)]
    pub id: Option<DocumentId>,
    /// `PXDA` accession, minted on insert.
    pub accession: Option<String>,
    /// Title.
    pub title: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Projects the analysis draws on.
    pub project_accessions: BTreeSet<String>,
}

impl Analysis {
    /// A new, unsaved analysis.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

impl DocumentCodec for Analysis {
    const COLLECTION: &'static str = "analyses";
    const FIELDS: &'static [&'static str] = &[
        fields::ACCESSION,
        "title",
        "description",
        fields::PROJECT_ACCESSIONS,
    ];

    fn document_id(&self) -> Option<DocumentId> {
        self.id
    }

    fn set_document_id(&mut self, id: DocumentId) {
        self.id = Some(id);
    }

    fn encode(&self) -> CoreResult<Document> {
        Ok(Document::new()
            .with(fields::ACCESSION, self.accession.clone())
            .with("title", self.title.as_str())
            .with("description", self.description.clone())
            .with(
                fields::PROJECT_ACCESSIONS,
                Value::Array(
                    self.project_accessions
                        .iter()
                        .map(|p| Value::Text(p.clone()))
                        .collect(),
                ),
            ))
    }

    fn decode(id: DocumentId, doc: &Document) -> CoreResult<Self> {
        Ok(Self {
            id: Some(id),
            accession: optional_text(doc, fields::ACCESSION),
            title: required_text(Self::COLLECTION, doc, "title")?,
            description: optional_text(doc, "description"),
            project_accessions: text_set(doc, fields::PROJECT_ACCESSIONS),
        })
    }
}

impl Accessioned for Analysis {
    fn accession(&self) -> Option<&str> {
        self.accession.as_deref()
    }

    fn set_accession(&mut self, accession: String) {
        self.accession = Some(accession);
    }
}
