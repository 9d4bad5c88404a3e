//! Named monotonic counters.

use crate::error::{CoreError, CoreResult};
use crate::query::Predicate;
use crate::store::{FindOptions, SharedStore, SEQUENCE_COLLECTION};
use std::ops::Range;
use tracing::trace;

/// Reserves contiguous ranges of sequence values.
///
/// Each reservation is one atomic increment in the store, so concurrent
/// callers, in this process or another one sharing the store, always get
/// disjoint ranges. Counters start at zero and are created on first use.
///
/// Nothing here retries: a failed increment may or may not have happened,
/// and a blind retry could skip a range.
#[derive(Clone)]
pub struct SequenceAllocator {
    store: SharedStore,
}

impl SequenceAllocator {
    /// Creates an allocator over `store`.
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Reserves `count` values and returns the first.
    ///
    /// The reserved range is `[start, start + count)`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOperation`] when `count` is zero, and
    /// passes store failures through.
    pub fn reserve(&self, sequence: &str, count: u64) -> CoreResult<u64> {
        if count == 0 {
            return Err(CoreError::invalid_operation(format!(
                "cannot reserve zero values from sequence '{sequence}'"
            )));
        }
        let start = self.store.increment(sequence, count)?;
        trace!(sequence, start, count, "reserved sequence range");
        Ok(start)
    }

    /// Like [`SequenceAllocator::reserve`], returning the whole range.
    pub fn reserve_range(&self, sequence: &str, count: u64) -> CoreResult<Range<u64>> {
        let start = self.reserve(sequence, count)?;
        Ok(start..start + count)
    }

    /// Reads the counter without reserving anything.
    ///
    /// A counter that was never used reads as zero.
    pub fn current(&self, sequence: &str) -> CoreResult<u64> {
        let found = self.store.find(
            SEQUENCE_COLLECTION,
            &Predicate::equals("name", sequence),
            &FindOptions::page(0, 1),
        )?;
        Ok(found
            .first()
            .and_then(|(_, doc)| doc.integer("value"))
            .and_then(|value| u64::try_from(value).ok())
            .unwrap_or(0))
    }
}

impl std::fmt::Debug for SequenceAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequenceAllocator").finish_non_exhaustive()
    }
}
