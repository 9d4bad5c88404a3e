//! Append-only mutation log.
//!
//! Every frame is laid out as
//!
//! ```text
//! | magic (4) | version (2) | length (4) | payload (length) | checksum (4) |
//! ```
//!
//! with little-endian integers, a CBOR payload and a checksum made of the
//! first four bytes of the SHA-256 digest of everything before it.
//!
//! A frame cut short at the end of the log is what a crash during an append
//! leaves behind; replay stops there and cuts the tail off. A complete frame
//! with a bad checksum or magic is corruption and fails the replay.

use crate::document::Document;
use crate::error::{CoreError, CoreResult};
use crate::types::DocumentId;
use parking_lot::Mutex;
use pride_storage::StorageBackend;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

/// Frame magic.
pub const LOG_MAGIC: [u8; 4] = *b"PXML";

/// Current frame version.
pub const LOG_VERSION: u16 = 1;

/// magic (4) + version (2) + length (4)
const HEADER_SIZE: usize = 10;

const CHECKSUM_SIZE: usize = 4;

/// One logged mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LogRecord {
    /// Stores `document` under `id`, inserting or replacing.
    Put {
        /// Target collection.
        collection: String,
        /// Document id.
        id: DocumentId,
        /// New document contents.
        document: Document,
    },
    /// Removes every document of a collection.
    Clear {
        /// Target collection.
        collection: String,
    },
}

impl LogRecord {
    /// The collection the record touches.
    pub fn collection(&self) -> &str {
        match self {
            LogRecord::Put { collection, .. } | LogRecord::Clear { collection } => collection,
        }
    }
}

fn checksum(bytes: &[u8]) -> u32 {
    let digest = Sha256::digest(bytes);
    u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]])
}

/// Encodes `record` as one framed log entry.
///
/// # Errors
///
/// Returns [`CoreError::Codec`] if the record cannot be serialized.
pub(crate) fn encode_frame(record: &LogRecord) -> CoreResult<Vec<u8>> {
    let mut payload = Vec::new();
    ciborium::into_writer(record, &mut payload).map_err(|e| CoreError::codec(e.to_string()))?;

    let len = u32::try_from(payload.len())
        .map_err(|_| CoreError::invalid_operation("log record payload too large"))?;

    let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len() + CHECKSUM_SIZE);
    frame.extend_from_slice(&LOG_MAGIC);
    frame.extend_from_slice(&LOG_VERSION.to_le_bytes());
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(&payload);
    let sum = checksum(&frame);
    frame.extend_from_slice(&sum.to_le_bytes());
    Ok(frame)
}

/// Outcome of decoding a log image.
#[derive(Debug, Default)]
pub(crate) struct Replay {
    /// Records of every complete frame, in log order.
    pub records: Vec<LogRecord>,
    /// Length of the valid prefix.
    pub valid_len: u64,
    /// Whether an incomplete trailing frame was found.
    pub torn_tail: bool,
}

/// Decodes every frame of `bytes`.
///
/// # Errors
///
/// Returns [`CoreError::LogCorruption`] for bad magic, an unknown version
/// or an undecodable payload, and [`CoreError::ChecksumMismatch`] for a
/// complete frame whose checksum does not match.
pub(crate) fn decode_frames(bytes: &[u8]) -> CoreResult<Replay> {
    let mut replay = Replay::default();
    let mut pos = 0usize;

    while pos < bytes.len() {
        let offset = pos as u64;
        let remaining = &bytes[pos..];
        if remaining.len() < HEADER_SIZE {
            replay.torn_tail = true;
            break;
        }

        if remaining[0..4] != LOG_MAGIC {
            return Err(CoreError::log_corruption(offset, "invalid magic"));
        }
        let version = u16::from_le_bytes([remaining[4], remaining[5]]);
        if version > LOG_VERSION {
            return Err(CoreError::log_corruption(
                offset,
                format!("unsupported version {version}"),
            ));
        }
        let len =
            u32::from_le_bytes([remaining[6], remaining[7], remaining[8], remaining[9]]) as usize;

        let frame_len = HEADER_SIZE + len + CHECKSUM_SIZE;
        if remaining.len() < frame_len {
            replay.torn_tail = true;
            break;
        }

        let body = &remaining[..HEADER_SIZE + len];
        let stored = u32::from_le_bytes([
            remaining[HEADER_SIZE + len],
            remaining[HEADER_SIZE + len + 1],
            remaining[HEADER_SIZE + len + 2],
            remaining[HEADER_SIZE + len + 3],
        ]);
        let computed = checksum(body);
        if stored != computed {
            return Err(CoreError::ChecksumMismatch {
                offset,
                expected: stored,
                actual: computed,
            });
        }

        let record: LogRecord = ciborium::from_reader(&body[HEADER_SIZE..])
            .map_err(|e| CoreError::log_corruption(offset, e.to_string()))?;
        replay.records.push(record);
        pos += frame_len;
        replay.valid_len = pos as u64;
    }

    Ok(replay)
}

/// Writes and replays the mutation log on a storage backend.
pub struct MutationLog {
    backend: Mutex<Box<dyn StorageBackend>>,
    sync_on_write: bool,
}

impl MutationLog {
    /// Wraps `backend`.
    pub fn new(backend: Box<dyn StorageBackend>, sync_on_write: bool) -> Self {
        Self {
            backend: Mutex::new(backend),
            sync_on_write,
        }
    }

    /// Appends one record and returns the offset of its frame.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or the write fails; nothing should be
    /// applied for a record whose append failed.
    pub fn append(&self, record: &LogRecord) -> CoreResult<u64> {
        let frame = encode_frame(record)?;
        let mut backend = self.backend.lock();
        let offset = backend.append(&frame)?;
        if self.sync_on_write {
            backend.sync()?;
        }
        Ok(offset)
    }

    /// Reads back every record, cutting off a torn trailing frame.
    ///
    /// # Errors
    ///
    /// See [`decode_frames`]; storage failures are passed through.
    pub fn replay(&self) -> CoreResult<Vec<LogRecord>> {
        let mut backend = self.backend.lock();
        let bytes = backend.read_all()?;
        let replay = decode_frames(&bytes)?;
        if replay.torn_tail {
            warn!(
                valid_len = replay.valid_len,
                size = bytes.len(),
                "cutting torn frame off the end of the mutation log"
            );
            backend.truncate(replay.valid_len)?;
        }
        Ok(replay.records)
    }

    /// Flushes buffered frames to stable storage.
    pub fn sync(&self) -> CoreResult<()> {
        self.backend.lock().sync()?;
        Ok(())
    }

    /// Current log size in bytes.
    pub fn size(&self) -> CoreResult<u64> {
        Ok(self.backend.lock().size()?)
    }
}

impl std::fmt::Debug for MutationLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationLog")
            .field("sync_on_write", &self.sync_on_write)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pride_storage::MemoryBackend;

    fn put(id: u64, name: &str) -> LogRecord {
        LogRecord::Put {
            collection: "files".into(),
            id: DocumentId::new(id),
            document: Document::new().with("fileName", name),
        }
    }

    #[test]
    fn append_and_replay() {
        let backend = MemoryBackend::new();
        let log = MutationLog::new(Box::new(backend.clone()), false);
        log.append(&put(1, "a.raw")).unwrap();
        log.append(&LogRecord::Clear {
            collection: "files".into(),
        })
        .unwrap();
        log.append(&put(2, "b.raw")).unwrap();

        let reopened = MutationLog::new(Box::new(backend), false);
        let records = reopened.replay().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0], put(1, "a.raw"));
        assert_eq!(records[1].collection(), "files");
        assert_eq!(records[2], put(2, "b.raw"));
    }

    #[test]
    fn empty_log_replays_nothing() {
        let log = MutationLog::new(Box::new(MemoryBackend::new()), false);
        assert!(log.replay().unwrap().is_empty());
        assert_eq!(log.size().unwrap(), 0);
    }

    #[test]
    fn torn_tail_is_cut() {
        let mut bytes = encode_frame(&put(1, "a.raw")).unwrap();
        let full = bytes.len() as u64;
        let second = encode_frame(&put(2, "b.raw")).unwrap();
        bytes.extend_from_slice(&second[..second.len() - 3]);

        let backend = MemoryBackend::with_data(bytes);
        let log = MutationLog::new(Box::new(backend.clone()), false);
        let records = log.replay().unwrap();
        assert_eq!(records, vec![put(1, "a.raw")]);
        assert_eq!(backend.data().len() as u64, full);
    }

    #[test]
    fn short_header_is_a_torn_tail() {
        let mut bytes = encode_frame(&put(1, "a.raw")).unwrap();
        bytes.extend_from_slice(&LOG_MAGIC[..2]);
        let replay = decode_frames(&bytes).unwrap();
        assert!(replay.torn_tail);
        assert_eq!(replay.records.len(), 1);
    }

    #[test]
    fn flipped_payload_byte_fails_checksum() {
        let mut bytes = encode_frame(&put(1, "a.raw")).unwrap();
        bytes[HEADER_SIZE + 2] ^= 0xFF;
        assert!(matches!(
            decode_frames(&bytes),
            Err(CoreError::ChecksumMismatch { offset: 0, .. })
        ));
    }

    #[test]
    fn bad_magic_is_corruption() {
        let mut bytes = encode_frame(&put(1, "a.raw")).unwrap();
        let first = bytes.len() as u64;
        let mut second = encode_frame(&put(2, "b.raw")).unwrap();
        second[0] = b'X';
        bytes.extend_from_slice(&second);
        match decode_frames(&bytes) {
            Err(CoreError::LogCorruption { offset, .. }) => assert_eq!(offset, first),
            other => panic!("expected corruption, got {other:?}"),
        }
    }

    #[test]
    fn newer_version_is_rejected() {
        let mut bytes = encode_frame(&put(1, "a.raw")).unwrap();
        bytes[4] = 9;
        assert!(matches!(
            decode_frames(&bytes),
            Err(CoreError::LogCorruption { .. })
        ));
    }
}
