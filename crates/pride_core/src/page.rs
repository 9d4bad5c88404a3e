//! Paged queries.

use crate::config::Config;
use crate::document::Document;
use crate::error::{CoreError, CoreResult};
use crate::query::Predicate;
use crate::store::{FindOptions, SharedStore, Sort};
use crate::types::DocumentId;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A zero-based page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    page_number: u64,
    page_size: u64,
    sort: Option<Sort>,
}

impl PageRequest {
    /// Validates caller-supplied page coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidPage`] if `page_size` is not positive or
    /// `page_number` is negative.
    pub fn new(page_number: i64, page_size: i64) -> CoreResult<Self> {
        if page_size <= 0 {
            return Err(CoreError::invalid_page(format!(
                "page size must be positive, got {page_size}"
            )));
        }
        let page_number = u64::try_from(page_number).map_err(|_| {
            CoreError::invalid_page(format!("page number must not be negative, got {page_number}"))
        })?;
        Self::of(page_number, page_size.unsigned_abs())
    }

    /// Page `page_number` of `page_size` items.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidPage`] if `page_size` is zero.
    pub fn of(page_number: u64, page_size: u64) -> CoreResult<Self> {
        if page_size == 0 {
            return Err(CoreError::invalid_page("page size must be positive, got 0"));
        }
        Ok(Self {
            page_number,
            page_size,
            sort: None,
        })
    }

    /// The first page of `page_size` items.
    pub fn first(page_size: u64) -> CoreResult<Self> {
        Self::of(0, page_size)
    }

    /// Orders the page's items by `sort` instead of insertion order.
    #[must_use]
    pub fn sorted_by(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Zero-based page number.
    pub fn page_number(&self) -> u64 {
        self.page_number
    }

    /// Items per page.
    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Requested ordering.
    pub fn sort(&self) -> Option<&Sort> {
        self.sort.as_ref()
    }

    /// Items before this page.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidPage`] if the offset does not fit in a `u64`.
    pub fn offset(&self) -> CoreResult<u64> {
        self.page_number
            .checked_mul(self.page_size)
            .ok_or_else(|| CoreError::invalid_page("page offset out of range"))
    }
}

/// One page of results plus the total match count.
///
/// `total_elements` comes from a separate count and may be slightly off
/// from `items` under concurrent writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items of this page.
    pub items: Vec<T>,
    /// Zero-based page number.
    pub page_number: u64,
    /// Requested page size.
    pub page_size: u64,
    /// Matches across all pages.
    pub total_elements: u64,
}

impl<T> Page<T> {
    /// Number of pages needed for `total_elements`.
    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            0
        } else {
            self.total_elements.div_ceil(self.page_size)
        }
    }

    /// Items on this page.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether this page has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Converts every item, keeping the paging data.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page_number: self.page_number,
            page_size: self.page_size,
            total_elements: self.total_elements,
        }
    }

    /// Like [`Page::map`] with a fallible conversion.
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        Ok(Page {
            items: self.items.into_iter().map(f).collect::<Result<_, _>>()?,
            page_number: self.page_number,
            page_size: self.page_size,
            total_elements: self.total_elements,
        })
    }
}

/// Runs a predicate as a page fetch plus a total count.
#[derive(Clone)]
pub struct PaginatedQueryExecutor {
    store: SharedStore,
    max_page_size: u64,
}

impl PaginatedQueryExecutor {
    /// Creates an executor bounded by `config.max_page_size`.
    pub fn new(store: SharedStore, config: &Config) -> Self {
        Self {
            store,
            max_page_size: config.max_page_size,
        }
    }

    /// Largest page size accepted.
    pub fn max_page_size(&self) -> u64 {
        self.max_page_size
    }

    /// Fetches one page of `collection` documents matching `predicate`.
    ///
    /// The fetch and the count are separate store calls.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidPage`] if the page size exceeds the
    /// configured maximum or the offset overflows; store errors are passed
    /// through.
    pub fn find(
        &self,
        collection: &str,
        predicate: &Predicate,
        page: &PageRequest,
    ) -> CoreResult<Page<(DocumentId, Document)>> {
        if page.page_size() > self.max_page_size {
            return Err(CoreError::invalid_page(format!(
                "page size {} exceeds the maximum of {}",
                page.page_size(),
                self.max_page_size
            )));
        }

        let options =
            FindOptions::page(page.offset()?, page.page_size()).sorted(page.sort().cloned());
        let items = self.store.find(collection, predicate, &options)?;
        let total_elements = self.store.count(collection, predicate)?;
        debug!(
            collection,
            page = page.page_number(),
            size = page.page_size(),
            returned = items.len(),
            total = total_elements,
            "paged query"
        );

        Ok(Page {
            items,
            page_number: page.page_number(),
            page_size: page.page_size(),
            total_elements,
        })
    }
}

impl std::fmt::Debug for PaginatedQueryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginatedQueryExecutor")
            .field("max_page_size", &self.max_page_size)
            .finish_non_exhaustive()
    }
}
