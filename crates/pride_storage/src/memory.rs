//! In-memory storage backend.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// An in-memory append-only store.
///
/// Clones share the same bytes, so a test can hand one clone to a database
/// and keep another to inspect or corrupt the log afterwards.
///
/// Appends can be made to fail after a budget is spent
/// ([`MemoryBackend::fail_appends_after`]), which stands in for a store that
/// drops its connection mid-batch.
///
/// # Example
///
/// ```rust
/// use pride_storage::{MemoryBackend, StorageBackend};
///
/// let backend = MemoryBackend::new();
/// let mut writer = backend.clone();
/// writer.append(b"abc").unwrap();
/// assert_eq!(backend.data(), b"abc");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Shared>,
}

#[derive(Debug, Default)]
struct Shared {
    data: RwLock<Vec<u8>>,
    /// Remaining successful appends; `None` means unlimited.
    append_budget: Mutex<Option<usize>>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend holding `data`, e.g. a log captured from another run.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            inner: Arc::new(Shared {
                data: RwLock::new(data),
                append_budget: Mutex::new(None),
            }),
        }
    }

    /// Returns a copy of the stored bytes.
    #[must_use]
    pub fn data(&self) -> Vec<u8> {
        self.inner.data.read().clone()
    }

    /// Lets the next `appends` appends succeed and fails every one after that
    /// with [`StorageError::Unavailable`].
    pub fn fail_appends_after(&self, appends: usize) {
        *self.inner.append_budget.lock() = Some(appends);
    }

    /// Lifts a limit set by [`MemoryBackend::fail_appends_after`].
    pub fn heal(&self) {
        *self.inner.append_budget.lock() = None;
    }
}

impl StorageBackend for MemoryBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let data = self.inner.data.read();
        let size = data.len() as u64;
        let end = offset.saturating_add(len as u64);

        if end > size {
            return Err(StorageError::ReadPastEnd { offset, len, size });
        }

        Ok(data[offset as usize..end as usize].to_vec())
    }

    fn append(&mut self, bytes: &[u8]) -> StorageResult<u64> {
        {
            let mut budget = self.inner.append_budget.lock();
            match budget.as_mut() {
                Some(0) => {
                    return Err(StorageError::Unavailable(
                        "append rejected by memory backend".into(),
                    ))
                }
                Some(remaining) => *remaining -= 1,
                None => {}
            }
        }

        let mut data = self.inner.data.write();
        let offset = data.len() as u64;
        data.extend_from_slice(bytes);
        Ok(offset)
    }

    fn flush(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn sync(&mut self) -> StorageResult<()> {
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.inner.data.read().len() as u64)
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        let mut data = self.inner.data.write();
        let size = data.len() as u64;
        if new_size > size {
            return Err(StorageError::TruncatePastEnd {
                requested: new_size,
                size,
            });
        }
        data.truncate(new_size as usize);
        Ok(())
    }
}
