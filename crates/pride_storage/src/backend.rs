//! Storage backend trait definition.

use crate::error::StorageResult;

/// An append-only byte store holding the document store's mutation log.
///
/// # Invariants
///
/// - `append` returns the offset the bytes were written at, which is the
///   previous `size`
/// - `read_at` returns exactly the bytes previously appended at that range
/// - after `sync` returns, everything appended so far survives a process crash
/// - `truncate` only ever shrinks the store; it is used to cut a torn
///   trailing record after a crash
pub trait StorageBackend: Send + Sync {
    /// Reads `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::ReadPastEnd`] if the range is not fully
    /// inside the store, or an I/O error.
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>>;

    /// Appends `data` and returns the offset it was written at.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails. A failed append may or may not
    /// have reached the medium.
    fn append(&mut self, data: &[u8]) -> StorageResult<u64>;

    /// Pushes buffered writes to the operating system.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    fn flush(&mut self) -> StorageResult<()>;

    /// Forces data and metadata to stable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync fails.
    fn sync(&mut self) -> StorageResult<()>;

    /// Returns the number of bytes stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Shrinks the store to `new_size` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::TruncatePastEnd`] when `new_size` is
    /// larger than the current size.
    fn truncate(&mut self, new_size: u64) -> StorageResult<()>;

    /// Reads the whole store.
    ///
    /// # Errors
    ///
    /// Returns an error if the size or the read fails.
    fn read_all(&self) -> StorageResult<Vec<u8>> {
        let size = self.size()?;
        let len = usize::try_from(size).map_err(|_| {
            crate::StorageError::Unavailable(format!(
                "store of {size} bytes does not fit in memory"
            ))
        })?;
        self.read_at(0, len)
    }
}
