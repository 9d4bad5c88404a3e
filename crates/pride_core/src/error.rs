//! Error types for the archive data-access layer.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised by the archive data-access layer.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] pride_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Entity creation attempted on an entity that already carries an accession.
    #[error("accession already assigned: {accession}")]
    AlreadyAssigned {
        /// The accession the entity already carries.
        accession: String,
    },

    /// A reserved sequence value does not fit the accession width.
    #[error("sequence value {value} does not fit {width} digits of accession prefix {prefix}")]
    AccessionOverflow {
        /// Accession prefix.
        prefix: String,
        /// Configured digit width.
        width: usize,
        /// The number that did not fit.
        value: u64,
    },

    /// Malformed filter clause.
    #[error("invalid filter clause '{clause}': {reason}")]
    FilterSyntax {
        /// The offending clause text.
        clause: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Filter references a field outside the collection's allow-list.
    #[error("unknown filter field '{field}' for collection {collection}")]
    UnknownField {
        /// The rejected field name.
        field: String,
        /// The collection being queried.
        collection: String,
    },

    /// Page number or page size out of range.
    #[error("invalid page request: {message}")]
    InvalidPage {
        /// Description of the problem.
        message: String,
    },

    /// Record encoding or decoding failed.
    #[error("codec error: {message}")]
    Codec {
        /// Description of the failure.
        message: String,
    },

    /// The mutation log is damaged.
    #[error("mutation log corruption at offset {offset}: {message}")]
    LogCorruption {
        /// Offset of the damaged frame.
        offset: u64,
        /// Description of the damage.
        message: String,
    },

    /// Checksum mismatch on a log frame.
    #[error("checksum mismatch at offset {offset}: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// Offset of the frame.
        offset: u64,
        /// Checksum stored in the frame.
        expected: u32,
        /// Checksum computed over the frame.
        actual: u32,
    },

    /// Another process holds the database directory.
    #[error("database locked: another process has exclusive access")]
    DatabaseLocked,

    /// Invalid database directory or format.
    #[error("invalid database format: {message}")]
    InvalidFormat {
        /// Description of the format issue.
        message: String,
    },

    /// A stored document cannot be turned into an entity.
    #[error("invalid {collection} document: {message}")]
    InvalidDocument {
        /// Collection the document came from.
        collection: String,
        /// Description of the problem.
        message: String,
    },

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why the operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates an already-assigned error.
    pub fn already_assigned(accession: impl Into<String>) -> Self {
        Self::AlreadyAssigned {
            accession: accession.into(),
        }
    }

    /// Creates a filter syntax error for `clause`.
    pub fn filter_syntax(clause: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::FilterSyntax {
            clause: clause.into(),
            reason: reason.into(),
        }
    }

    /// Creates an unknown field error.
    pub fn unknown_field(field: impl Into<String>, collection: impl Into<String>) -> Self {
        Self::UnknownField {
            field: field.into(),
            collection: collection.into(),
        }
    }

    /// Creates an invalid page error.
    pub fn invalid_page(message: impl Into<String>) -> Self {
        Self::InvalidPage {
            message: message.into(),
        }
    }

    /// Creates a codec error.
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec {
            message: message.into(),
        }
    }

    /// Creates a log corruption error.
    pub fn log_corruption(offset: u64, message: impl Into<String>) -> Self {
        Self::LogCorruption {
            offset,
            message: message.into(),
        }
    }

    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Creates an invalid document error.
    pub fn invalid_document(collection: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            collection: collection.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Returns true for store-level failures a caller may retry.
    ///
    /// A failed `reserve` is never safe to retry blindly: the increment may
    /// have been applied before the failure was reported.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Io(_))
    }

    /// Returns true when the caller sent a request that can never succeed as written.
    #[must_use]
    pub fn is_rejected_request(&self) -> bool {
        matches!(
            self,
            Self::FilterSyntax { .. } | Self::UnknownField { .. } | Self::InvalidPage { .. }
        )
    }
}
