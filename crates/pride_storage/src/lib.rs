//! # PRIDE Storage
//!
//! Byte-level storage for the archive's embedded document store.
//!
//! Backends are **opaque append-only byte stores**: the document store frames,
//! encodes and checks its mutation log records itself, and a backend only has
//! to keep the bytes it was given, in order.
//!
//! ## Available Backends
//!
//! - [`MemoryBackend`] - ephemeral stores and tests (supports fault injection)
//! - [`FileBackend`] - a single log file on disk
//!
//! ## Example
//!
//! ```rust
//! use pride_storage::{MemoryBackend, StorageBackend};
//!
//! let mut backend = MemoryBackend::new();
//! let offset = backend.append(b"frame").unwrap();
//! assert_eq!(backend.read_at(offset, 5).unwrap(), b"frame");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::MemoryBackend;
