//! The document store the data-access layer runs on.
//!
//! Components take a [`SharedStore`] and never open one themselves; the
//! process entry point owns the store's lifecycle.

mod database;
mod dir;
mod log;

pub use database::Database;
pub use log::{LogRecord, MutationLog};

use crate::document::{Document, Value};
use crate::error::CoreResult;
use crate::query::Predicate;
use crate::types::DocumentId;
use std::cmp::Ordering;
use std::sync::Arc;

/// Collection holding sequence counters as `{name, value}` documents.
pub const SEQUENCE_COLLECTION: &str = "sequences";

/// A shared handle to a document store.
pub type SharedStore = Arc<dyn DocumentStore>;

/// Operations the data-access layer needs from a document store.
///
/// Every method is atomic with respect to every other call on the same
/// store, including calls from other threads.
pub trait DocumentStore: Send + Sync {
    /// Inserts `document` and returns its new id.
    fn insert(&self, collection: &str, document: Document) -> CoreResult<DocumentId>;

    /// Replaces the document stored under `id`.
    ///
    /// Returns `false`, writing nothing, when no such document exists.
    fn replace(&self, collection: &str, id: DocumentId, document: Document) -> CoreResult<bool>;

    /// Fetches one document by id.
    fn get(&self, collection: &str, id: DocumentId) -> CoreResult<Option<Document>>;

    /// Returns matching documents in the requested order, after `skip` and
    /// `limit` are applied.
    fn find(
        &self,
        collection: &str,
        predicate: &Predicate,
        options: &FindOptions,
    ) -> CoreResult<Vec<(DocumentId, Document)>>;

    /// Counts matching documents.
    fn count(&self, collection: &str, predicate: &Predicate) -> CoreResult<u64>;

    /// Adds `by` to the named counter and returns the value it held before.
    ///
    /// A counter that does not exist yet is created at zero first.
    fn increment(&self, sequence: &str, by: u64) -> CoreResult<u64>;

    /// Removes every document of `collection` and returns how many there were.
    fn delete_all(&self, collection: &str) -> CoreResult<u64>;
}

/// Sort direction of one sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
}

/// Multi-key document ordering.
///
/// Missing fields sort as null. Documents that compare equal on every key
/// keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sort {
    keys: Vec<(String, SortDirection)>,
}

impl Sort {
    /// Orders by `field`, smallest first.
    pub fn ascending(field: impl Into<String>) -> Self {
        Self::default().then(field, SortDirection::Ascending)
    }

    /// Orders by `field`, largest first.
    pub fn descending(field: impl Into<String>) -> Self {
        Self::default().then(field, SortDirection::Descending)
    }

    /// Adds a tie-breaking key.
    #[must_use]
    pub fn then(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.keys.push((field.into(), direction));
        self
    }

    /// The sort keys, most significant first.
    pub fn keys(&self) -> &[(String, SortDirection)] {
        &self.keys
    }

    /// Whether no key is set.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Compares two documents under this ordering.
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        const NULL: Value = Value::Null;
        for (field, direction) in &self.keys {
            let left = a.get(field).unwrap_or(&NULL);
            let right = b.get(field).unwrap_or(&NULL);
            let ordering = match direction {
                SortDirection::Ascending => left.cmp_for_sort(right),
                SortDirection::Descending => right.cmp_for_sort(left),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

/// Paging and ordering for [`DocumentStore::find`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    /// Matches to skip.
    pub skip: u64,
    /// Most matches to return; `None` returns all.
    pub limit: Option<u64>,
    /// Ordering; `None` is insertion order.
    pub sort: Option<Sort>,
}

impl FindOptions {
    /// Every match in insertion order.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// One page of matches.
    #[must_use]
    pub fn page(skip: u64, limit: u64) -> Self {
        Self {
            skip,
            limit: Some(limit),
            sort: None,
        }
    }

    /// Sets the ordering.
    #[must_use]
    pub fn sorted(mut self, sort: Option<Sort>) -> Self {
        self.sort = sort;
        self
    }
}
