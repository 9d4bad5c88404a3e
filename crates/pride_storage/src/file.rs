//! File-based storage backend.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// A single append-only file.
///
/// `flush` hands buffered bytes to the OS; `sync` calls `File::sync_all`.
/// The file handle and the cached length sit behind one mutex so that an
/// append and the size it reports can never interleave with another append.
///
/// # Example
///
/// ```no_run
/// use pride_storage::{FileBackend, StorageBackend};
/// use std::path::Path;
///
/// let mut backend = FileBackend::open(Path::new("mutations.log")).unwrap();
/// backend.append(b"frame").unwrap();
/// backend.sync().unwrap();
/// ```
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    state: Mutex<FileState>,
}

#[derive(Debug)]
struct FileState {
    file: File,
    len: u64,
}

impl FileBackend {
    /// Opens the file at `path`, creating it when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or created.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        let len = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            state: Mutex::new(FileState { file, len }),
        })
    }

    /// Like [`FileBackend::open`], creating missing parent directories first.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory or the file cannot be created.
    pub fn open_with_create_dirs(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::open(path)
    }

    /// Returns the path of the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Files that can be cut back to a given length.
trait SetLen {
    fn set_len(&mut self, size: u64) -> io::Result<()>;
}

impl SetLen for File {
    fn set_len(&mut self, size: u64) -> io::Result<()> {
        File::set_len(self, size)
    }
}

/// Writes `data` at `offset`, cutting the file back to `offset` if the
/// write fails so no partial frame is left behind.
fn write_at_end<F>(file: &mut F, offset: u64, data: &[u8]) -> io::Result<()>
where
    F: Write + Seek + SetLen,
{
    file.seek(SeekFrom::Start(offset))?;
    if let Err(e) = file.write_all(data) {
        // The next append seeks to `offset` again even if this fails.
        let _ = file.set_len(offset);
        return Err(e);
    }
    Ok(())
}

impl StorageBackend for FileBackend {
    fn read_at(&self, offset: u64, len: usize) -> StorageResult<Vec<u8>> {
        let mut state = self.state.lock();
        let size = state.len;
        if offset.saturating_add(len as u64) > size {
            return Err(StorageError::ReadPastEnd { offset, len, size });
        }
        if len == 0 {
            return Ok(Vec::new());
        }

        let mut buffer = vec![0u8; len];
        state.file.seek(SeekFrom::Start(offset))?;
        state.file.read_exact(&mut buffer)?;
        Ok(buffer)
    }

    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        let state = self.state.get_mut();
        let offset = state.len;
        if data.is_empty() {
            return Ok(offset);
        }

        write_at_end(&mut state.file, offset, data)?;
        state.len += data.len() as u64;
        Ok(offset)
    }

    fn flush(&mut self) -> StorageResult<()> {
        self.state.get_mut().file.flush()?;
        Ok(())
    }

    fn sync(&mut self) -> StorageResult<()> {
        self.state.get_mut().file.sync_all()?;
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(self.state.lock().len)
    }

    fn truncate(&mut self, new_size: u64) -> StorageResult<()> {
        let state = self.state.get_mut();
        if new_size > state.len {
            return Err(StorageError::TruncatePastEnd {
                requested: new_size,
                size: state.len,
            });
        }

        state.file.set_len(new_size)?;
        state.file.sync_all()?;
        state.len = new_size;
        Ok(())
    }
}
