//! Entity to document mapping.

use crate::document::Document;
use crate::error::CoreResult;
use crate::query::FieldSet;
use crate::types::DocumentId;

/// Types stored as documents of one collection.
///
/// # Example
///
/// ```rust
/// use pride_core::document::Document;
/// use pride_core::repository::DocumentCodec;
/// use pride_core::{CoreResult, DocumentId};
///
/// struct Tag {
///     id: Option<DocumentId>,
///     name: String,
/// }
///
/// impl DocumentCodec for Tag {
///     const COLLECTION: &'static str = "tags";
///     const FIELDS: &'static [&'static str] = &["name"];
///
///     fn document_id(&self) -> Option<DocumentId> {
///         self.id
///     }
///
///     fn set_document_id(&mut self, id: DocumentId) {
///         self.id = Some(id);
///     }
///
///     fn encode(&self) -> CoreResult<Document> {
///         Ok(Document::new().with("name", self.name.as_str()))
///     }
///
///     fn decode(id: DocumentId, doc: &Document) -> CoreResult<Self> {
///         Ok(Tag {
///             id: Some(id),
///             name: doc.text("name").unwrap_or_default().to_string(),
///         })
///     }
/// }
/// ```
pub trait DocumentCodec: Sized {
    /// Collection the entities live in.
    const COLLECTION: &'static str;

    /// Fields filters may reference.
    const FIELDS: &'static [&'static str];

    /// Store id, once the entity has been saved.
    fn document_id(&self) -> Option<DocumentId>;

    /// Records the store id after a save.
    fn set_document_id(&mut self, id: DocumentId);

    /// Converts the entity into a document. The store id is not part of it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::InvalidDocument`] if a value cannot be stored.
    fn encode(&self) -> CoreResult<Document>;

    /// Rebuilds an entity from a stored document.
    fn decode(id: DocumentId, document: &Document) -> CoreResult<Self>;

    /// The filter allow-list of the collection.
    fn field_set() -> FieldSet {
        FieldSet::new(Self::COLLECTION, Self::FIELDS.iter().copied())
    }
}
