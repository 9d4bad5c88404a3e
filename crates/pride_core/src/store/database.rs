//! Embedded document store.

use super::dir::DatabaseDir;
use super::log::{LogRecord, MutationLog};
use super::{DocumentStore, FindOptions, SEQUENCE_COLLECTION};
use crate::config::Config;
use crate::document::{Document, Value};
use crate::error::{CoreError, CoreResult};
use crate::query::Predicate;
use crate::types::DocumentId;
use parking_lot::RwLock;
use pride_storage::{FileBackend, MemoryBackend, StorageBackend};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::debug;

/// Field holding a counter's name in the sequence collection.
const SEQUENCE_NAME: &str = "name";
/// Field holding a counter's value in the sequence collection.
const SEQUENCE_VALUE: &str = "value";

#[derive(Debug)]
struct State {
    collections: HashMap<String, BTreeMap<DocumentId, Document>>,
    /// Counter name to its document in the sequence collection.
    sequences: HashMap<String, DocumentId>,
    next_id: DocumentId,
}

impl State {
    fn new() -> Self {
        Self {
            collections: HashMap::new(),
            sequences: HashMap::new(),
            next_id: DocumentId::new(1),
        }
    }

    fn apply(&mut self, record: LogRecord) {
        match record {
            LogRecord::Put {
                collection,
                id,
                document,
            } => {
                if collection == SEQUENCE_COLLECTION {
                    if let Some(name) = document.text(SEQUENCE_NAME) {
                        self.sequences.insert(name.to_string(), id);
                    }
                }
                if id >= self.next_id {
                    self.next_id = id.next();
                }
                self.collections
                    .entry(collection)
                    .or_default()
                    .insert(id, document);
            }
            LogRecord::Clear { collection } => {
                if collection == SEQUENCE_COLLECTION {
                    self.sequences.clear();
                }
                self.collections.remove(&collection);
            }
        }
    }

    fn collection(&self, name: &str) -> Option<&BTreeMap<DocumentId, Document>> {
        self.collections.get(name)
    }

    fn sequence_value(&self, name: &str) -> Option<(DocumentId, u64)> {
        let id = *self.sequences.get(name)?;
        let value = self
            .collection(SEQUENCE_COLLECTION)
            .and_then(|docs| docs.get(&id))
            .and_then(|doc| doc.integer(SEQUENCE_VALUE))
            .and_then(|value| u64::try_from(value).ok())
            .unwrap_or(0);
        Some((id, value))
    }
}

/// An embedded document store over a mutation log.
///
/// All documents live in memory; the log on the storage backend is the
/// durable copy and is replayed on open. Every write, counter increments
/// included, is logged and applied under one exclusive guard, so each is
/// atomic and writes are totally ordered. Reads share the guard.
///
/// # Example
///
/// ```rust
/// use pride_core::store::{Database, DocumentStore};
///
/// let db = Database::open_in_memory().unwrap();
/// assert_eq!(db.increment("pride_files", 1).unwrap(), 0);
/// assert_eq!(db.increment("pride_files", 5).unwrap(), 1);
/// assert_eq!(db.increment("pride_files", 1).unwrap(), 6);
/// ```
pub struct Database {
    config: Config,
    state: RwLock<State>,
    log: MutationLog,
    dir: Option<DatabaseDir>,
}

impl Database {
    /// Opens an empty database that lives only as long as the process.
    pub fn open_in_memory() -> CoreResult<Self> {
        Self::open_with_backend(Config::default(), Box::new(MemoryBackend::new()))
    }

    /// Opens a database over `backend`, replaying whatever log it holds.
    ///
    /// # Errors
    ///
    /// Returns an error if the log is corrupt or cannot be read.
    pub fn open_with_backend(config: Config, backend: Box<dyn StorageBackend>) -> CoreResult<Self> {
        Self::open_inner(config, backend, None)
    }

    /// Opens the database directory at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DatabaseLocked`] if another process owns the
    /// directory, [`CoreError::InvalidFormat`] if it is missing and
    /// `create_if_missing` is off, or any replay error.
    pub fn open(path: impl AsRef<Path>, config: Config) -> CoreResult<Self> {
        let dir = DatabaseDir::open(path.as_ref(), config.create_if_missing)?;
        let backend = FileBackend::open(&dir.log_path())?;
        Self::open_inner(config, Box::new(backend), Some(dir))
    }

    fn open_inner(
        config: Config,
        backend: Box<dyn StorageBackend>,
        dir: Option<DatabaseDir>,
    ) -> CoreResult<Self> {
        let log = MutationLog::new(backend, config.sync_on_write);
        let mut state = State::new();
        let records = log.replay()?;
        let replayed = records.len();
        for record in records {
            state.apply(record);
        }
        debug!(
            records = replayed,
            collections = state.collections.len(),
            "opened database"
        );

        Ok(Self {
            config,
            state: RwLock::new(state),
            log,
            dir,
        })
    }

    /// The configuration the database was opened with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Directory of a file-backed database.
    pub fn path(&self) -> Option<&Path> {
        self.dir.as_ref().map(DatabaseDir::path)
    }

    /// Size of the mutation log in bytes.
    pub fn log_size(&self) -> CoreResult<u64> {
        self.log.size()
    }

    /// Forces the mutation log to stable storage.
    pub fn sync(&self) -> CoreResult<()> {
        self.log.sync()
    }

    /// Names of the non-empty collections, sorted.
    pub fn collection_names(&self) -> Vec<String> {
        let state = self.state.read();
        let mut names: Vec<String> = state
            .collections
            .iter()
            .filter(|(_, docs)| !docs.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Current value of every counter, sorted by name.
    pub fn sequences(&self) -> Vec<(String, u64)> {
        let state = self.state.read();
        let mut out: Vec<(String, u64)> = state
            .sequences
            .keys()
            .filter_map(|name| {
                state
                    .sequence_value(name)
                    .map(|(_, value)| (name.clone(), value))
            })
            .collect();
        out.sort();
        out
    }

    fn reject_sequence_collection(collection: &str) -> CoreResult<()> {
        if collection == SEQUENCE_COLLECTION {
            return Err(CoreError::invalid_operation(format!(
                "collection '{SEQUENCE_COLLECTION}' is only written through counters"
            )));
        }
        Ok(())
    }
}

impl DocumentStore for Database {
    fn insert(&self, collection: &str, document: Document) -> CoreResult<DocumentId> {
        Self::reject_sequence_collection(collection)?;
        let mut state = self.state.write();
        let id = state.next_id;
        let record = LogRecord::Put {
            collection: collection.to_string(),
            id,
            document,
        };
        self.log.append(&record)?;
        state.apply(record);
        Ok(id)
    }

    fn replace(&self, collection: &str, id: DocumentId, document: Document) -> CoreResult<bool> {
        Self::reject_sequence_collection(collection)?;
        let mut state = self.state.write();
        let exists = state
            .collection(collection)
            .is_some_and(|docs| docs.contains_key(&id));
        if !exists {
            return Ok(false);
        }
        let record = LogRecord::Put {
            collection: collection.to_string(),
            id,
            document,
        };
        self.log.append(&record)?;
        state.apply(record);
        Ok(true)
    }

    fn get(&self, collection: &str, id: DocumentId) -> CoreResult<Option<Document>> {
        let state = self.state.read();
        Ok(state
            .collection(collection)
            .and_then(|docs| docs.get(&id))
            .cloned())
    }

    fn find(
        &self,
        collection: &str,
        predicate: &Predicate,
        options: &FindOptions,
    ) -> CoreResult<Vec<(DocumentId, Document)>> {
        let state = self.state.read();
        let Some(docs) = state.collection(collection) else {
            return Ok(Vec::new());
        };

        let mut hits: Vec<(&DocumentId, &Document)> = docs
            .iter()
            .filter(|(_, doc)| predicate.matches(doc))
            .collect();
        if let Some(sort) = options.sort.as_ref().filter(|sort| !sort.is_empty()) {
            // Stable, so ties stay in id order.
            hits.sort_by(|(_, a), (_, b)| sort.compare(a, b));
        }

        let skip = usize::try_from(options.skip).unwrap_or(usize::MAX);
        let limit = options
            .limit
            .map_or(usize::MAX, |limit| usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(hits
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|(id, doc)| (*id, doc.clone()))
            .collect())
    }

    fn count(&self, collection: &str, predicate: &Predicate) -> CoreResult<u64> {
        let state = self.state.read();
        Ok(state.collection(collection).map_or(0, |docs| {
            docs.values().filter(|doc| predicate.matches(doc)).count() as u64
        }))
    }

    fn increment(&self, sequence: &str, by: u64) -> CoreResult<u64> {
        let mut state = self.state.write();
        let (id, prior) = match state.sequence_value(sequence) {
            Some(found) => found,
            None => (state.next_id, 0),
        };

        let overflow = || CoreError::invalid_operation(format!("sequence '{sequence}' overflowed"));
        let next = prior.checked_add(by).ok_or_else(overflow)?;
        let stored = i64::try_from(next).map_err(|_| overflow())?;

        let record = LogRecord::Put {
            collection: SEQUENCE_COLLECTION.to_string(),
            id,
            document: Document::new()
                .with(SEQUENCE_NAME, sequence)
                .with(SEQUENCE_VALUE, Value::Integer(stored)),
        };
        self.log.append(&record)?;
        state.apply(record);
        Ok(prior)
    }

    fn delete_all(&self, collection: &str) -> CoreResult<u64> {
        Self::reject_sequence_collection(collection)?;
        let mut state = self.state.write();
        let removed = state.collection(collection).map_or(0, |docs| docs.len() as u64);
        if removed == 0 {
            return Ok(0);
        }
        let record = LogRecord::Clear {
            collection: collection.to_string(),
        };
        self.log.append(&record)?;
        state.apply(record);
        Ok(removed)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("config", &self.config)
            .field("path", &self.path())
            .field("log", &self.log)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Sort, SortDirection};
    use std::sync::Arc;
    use std::thread;
    use tempfile::tempdir;

    fn file(name: &str, size: i64) -> Document {
        Document::new().with("fileName", name).with("fileSizeBytes", size)
    }

    #[test]
    fn insert_get_replace() {
        let db = Database::open_in_memory().unwrap();
        let id = db.insert("files", file("a.raw", 10)).unwrap();
        assert_eq!(db.get("files", id).unwrap(), Some(file("a.raw", 10)));

        assert!(db.replace("files", id, file("a.raw", 20)).unwrap());
        assert_eq!(db.get("files", id).unwrap(), Some(file("a.raw", 20)));
        assert!(!db.replace("files", DocumentId::new(999), file("x", 1)).unwrap());
        assert_eq!(db.get("files", DocumentId::new(999)).unwrap(), None);
    }

    #[test]
    fn ids_increase_across_collections() {
        let db = Database::open_in_memory().unwrap();
        let a = db.insert("files", file("a", 1)).unwrap();
        let b = db.insert("analyses", Document::new()).unwrap();
        let c = db.insert("files", file("c", 1)).unwrap();
        assert!(a < b && b < c);
    }

    #[test]
    fn find_filters_sorts_and_pages() {
        let db = Database::open_in_memory().unwrap();
        for (name, size) in [("c.raw", 3), ("a.raw", 1), ("b.mzid", 2), ("d.raw", 1)] {
            db.insert("files", file(name, size)).unwrap();
        }
        let raw = Predicate::Matches {
            field: "fileName".into(),
            pattern: crate::query::WildcardPattern::compile("*.raw").unwrap(),
        };
        assert_eq!(db.count("files", &raw).unwrap(), 3);

        let names = |opts: &FindOptions| -> Vec<String> {
            db.find("files", &raw, opts)
                .unwrap()
                .into_iter()
                .map(|(_, doc)| doc.text("fileName").unwrap().to_string())
                .collect()
        };
        assert_eq!(names(&FindOptions::all()), ["c.raw", "a.raw", "d.raw"]);
        assert_eq!(
            names(&FindOptions::all().sorted(Some(Sort::ascending("fileSizeBytes")))),
            ["a.raw", "d.raw", "c.raw"]
        );
        let desc = Sort::descending("fileSizeBytes").then("fileName", SortDirection::Descending);
        assert_eq!(
            names(&FindOptions::page(1, 1).sorted(Some(desc))),
            ["d.raw"]
        );
        assert!(names(&FindOptions::page(5, 10)).is_empty());
    }

    #[test]
    fn find_on_unknown_collection_is_empty() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.find("nothing", &Predicate::All, &FindOptions::all()).unwrap().is_empty());
        assert_eq!(db.count("nothing", &Predicate::All).unwrap(), 0);
    }

    #[test]
    fn increment_upserts_and_returns_prior() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.increment("pride_files", 1).unwrap(), 0);
        assert_eq!(db.increment("pride_files", 10).unwrap(), 1);
        assert_eq!(db.increment("pride_analyses", 1).unwrap(), 0);
        assert_eq!(db.increment("pride_files", 0).unwrap(), 11);
        assert_eq!(
            db.sequences(),
            vec![("pride_analyses".to_string(), 1), ("pride_files".to_string(), 11)]
        );
        assert_eq!(db.count(SEQUENCE_COLLECTION, &Predicate::All).unwrap(), 2);
    }

    #[test]
    fn increment_overflow_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.increment("s", i64::MAX as u64).unwrap();
        assert!(matches!(
            db.increment("s", 1),
            Err(CoreError::InvalidOperation { .. })
        ));
        assert_eq!(db.increment("s", 0).unwrap(), i64::MAX as u64);
    }

    #[test]
    fn sequence_collection_is_not_writable_directly() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.insert(SEQUENCE_COLLECTION, Document::new()).is_err());
        assert!(db.delete_all(SEQUENCE_COLLECTION).is_err());
    }

    #[test]
    fn delete_all_counts() {
        let db = Database::open_in_memory().unwrap();
        db.insert("files", file("a", 1)).unwrap();
        db.insert("files", file("b", 1)).unwrap();
        assert_eq!(db.delete_all("files").unwrap(), 2);
        assert_eq!(db.delete_all("files").unwrap(), 0);
        assert_eq!(db.count("files", &Predicate::All).unwrap(), 0);
    }

    #[test]
    fn failed_append_leaves_state_untouched() {
        let backend = MemoryBackend::new();
        let db = Database::open_with_backend(Config::default(), Box::new(backend.clone())).unwrap();
        db.insert("files", file("a", 1)).unwrap();
        backend.fail_appends_after(0);

        assert!(db.insert("files", file("b", 1)).is_err());
        assert!(db.increment("pride_files", 1).is_err());
        assert_eq!(db.count("files", &Predicate::All).unwrap(), 1);

        backend.heal();
        assert_eq!(db.increment("pride_files", 1).unwrap(), 0);
    }

    #[test]
    fn replay_restores_documents_and_counters() {
        let backend = MemoryBackend::new();
        let (kept, removed) = {
            let db =
                Database::open_with_backend(Config::default(), Box::new(backend.clone())).unwrap();
            let kept = db.insert("files", file("a", 1)).unwrap();
            let removed = db.insert("analyses", Document::new()).unwrap();
            db.delete_all("analyses").unwrap();
            db.increment("pride_files", 7).unwrap();
            (kept, removed)
        };

        let db = Database::open_with_backend(Config::default(), Box::new(backend)).unwrap();
        assert_eq!(db.get("files", kept).unwrap(), Some(file("a", 1)));
        assert_eq!(db.get("analyses", removed).unwrap(), None);
        assert_eq!(db.increment("pride_files", 1).unwrap(), 7);
        let fresh = db.insert("files", file("b", 1)).unwrap();
        assert!(fresh > removed);
    }

    #[test]
    fn file_database_survives_reopen() {
        let tmp = tempdir().unwrap();
        {
            let db = Database::open(tmp.path(), Config::default()).unwrap();
            db.insert("files", file("a", 1)).unwrap();
            db.increment("pride_files", 3).unwrap();
            assert!(matches!(
                Database::open(tmp.path(), Config::default()),
                Err(CoreError::DatabaseLocked)
            ));
        }
        let db = Database::open(tmp.path(), Config::default()).unwrap();
        assert_eq!(db.path(), Some(tmp.path()));
        assert_eq!(db.count("files", &Predicate::All).unwrap(), 1);
        assert_eq!(db.sequences(), vec![("pride_files".to_string(), 3)]);
    }

    #[test]
    fn concurrent_increments_hand_out_disjoint_values() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let db = Arc::clone(&db);
                thread::spawn(move || {
                    (0..50)
                        .map(|_| db.increment("pride_files", 1).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let mut seen: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..400).collect::<Vec<_>>());
    }
}
