//! Typed repository implementation.

use super::codec::DocumentCodec;
use crate::config::Config;
use crate::error::CoreResult;
use crate::filter::FilterClause;
use crate::page::{Page, PageRequest, PaginatedQueryExecutor};
use crate::query::{CriteriaBuilder, Predicate};
use crate::store::{FindOptions, SharedStore, Sort};
use crate::types::DocumentId;
use std::marker::PhantomData;

/// Entities of type `T` in their collection.
///
/// Searches go through the collection's [`crate::query::FieldSet`], so a
/// filter naming a field outside `T::FIELDS` is rejected.
pub struct Repository<T> {
    store: SharedStore,
    executor: PaginatedQueryExecutor,
    criteria: CriteriaBuilder,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DocumentCodec> Repository<T> {
    /// Creates the repository over `store`.
    pub fn new(store: SharedStore, config: &Config) -> Self {
        Self {
            executor: PaginatedQueryExecutor::new(store.clone(), config),
            criteria: CriteriaBuilder::new(T::field_set()),
            store,
            _marker: PhantomData,
        }
    }

    /// The collection name.
    pub fn collection(&self) -> &'static str {
        T::COLLECTION
    }

    /// Inserts a new entity, or replaces the stored one if it has an id.
    ///
    /// An entity whose id no longer exists is inserted afresh and gets a
    /// new id.
    pub fn save(&self, entity: &mut T) -> CoreResult<DocumentId> {
        let document = entity.encode()?;
        if let Some(id) = entity.document_id() {
            if self.store.replace(T::COLLECTION, id, document.clone())? {
                return Ok(id);
            }
        }
        let id = self.store.insert(T::COLLECTION, document)?;
        entity.set_document_id(id);
        Ok(id)
    }

    /// Fetches by store id.
    pub fn get(&self, id: DocumentId) -> CoreResult<Option<T>> {
        self.store
            .get(T::COLLECTION, id)?
            .map(|doc| T::decode(id, &doc))
            .transpose()
    }

    /// First entity matching `predicate`, in insertion order.
    pub fn find_one(&self, predicate: &Predicate) -> CoreResult<Option<T>> {
        let mut hits = self.find_where(predicate, &FindOptions::page(0, 1))?;
        Ok(hits.pop())
    }

    /// First entity whose `field` equals `value`.
    pub fn find_by_field(&self, field: &str, value: &str) -> CoreResult<Option<T>> {
        self.find_one(&Predicate::equals(field, value))
    }

    /// Every entity matching `predicate`, under `options`.
    pub fn find_where(&self, predicate: &Predicate, options: &FindOptions) -> CoreResult<Vec<T>> {
        self.store
            .find(T::COLLECTION, predicate, options)?
            .into_iter()
            .map(|(id, doc)| T::decode(id, &doc))
            .collect()
    }

    /// One page of entities matching `predicate`.
    pub fn find_page(&self, predicate: &Predicate, page: &PageRequest) -> CoreResult<Page<T>> {
        self.executor
            .find(T::COLLECTION, predicate, page)?
            .try_map(|(id, doc)| T::decode(id, &doc))
    }

    /// One page of all entities.
    pub fn find_all(&self, page: &PageRequest) -> CoreResult<Page<T>> {
        self.find_page(&Predicate::All, page)
    }

    /// Compiles filter clauses against the collection's allow-list.
    pub fn compile(&self, clauses: &[FilterClause]) -> CoreResult<Predicate> {
        self.criteria.compile(clauses)
    }

    /// One page of entities matching every clause.
    pub fn filter_by_attributes(
        &self,
        clauses: &[FilterClause],
        page: &PageRequest,
    ) -> CoreResult<Page<T>> {
        let predicate = self.compile(clauses)?;
        self.find_page(&predicate, page)
    }

    /// Every entity matching every clause.
    pub fn filter_all(&self, clauses: &[FilterClause]) -> CoreResult<Vec<T>> {
        let predicate = self.compile(clauses)?;
        self.find_where(&predicate, &FindOptions::all())
    }

    /// Entities whose `field` is one of `values`, optionally sorted.
    pub fn find_by_values_in<I, S>(
        &self,
        field: &str,
        values: I,
        sort: Option<Sort>,
    ) -> CoreResult<Vec<T>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let predicate = Predicate::any_of(field, values);
        self.find_where(&predicate, &FindOptions::all().sorted(sort))
    }

    /// Number of stored entities.
    pub fn count(&self) -> CoreResult<u64> {
        self.count_where(&Predicate::All)
    }

    /// Number of entities matching `predicate`.
    pub fn count_where(&self, predicate: &Predicate) -> CoreResult<u64> {
        self.store.count(T::COLLECTION, predicate)
    }

    /// Removes every entity and returns how many there were.
    pub fn delete_all(&self) -> CoreResult<u64> {
        self.store.delete_all(T::COLLECTION)
    }
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            executor: self.executor.clone(),
            criteria: self.criteria.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: DocumentCodec> std::fmt::Debug for Repository<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("collection", &T::COLLECTION)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::error::CoreError;
    use crate::filter::parse_filter;
    use crate::store::Database;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq)]
    struct Sample {
        id: Option<DocumentId>,
        name: String,
        tags: Vec<String>,
    }

    impl DocumentCodec for Sample {
        const COLLECTION: &'static str = "samples";
        const FIELDS: &'static [&'static str] = &["name", "tags"];

        fn document_id(&self) -> Option<DocumentId> {
            self.id
        }

        fn set_document_id(&mut self, id: DocumentId) {
            self.id = Some(id);
        }

        fn encode(&self) -> CoreResult<Document> {
            Ok(Document::new()
                .with("name", self.name.as_str())
                .with("tags", self.tags.clone()))
        }

        fn decode(id: DocumentId, doc: &Document) -> CoreResult<Self> {
            Ok(Self {
                id: Some(id),
                name: doc.text("name").unwrap_or_default().to_string(),
                tags: doc.text_list("tags"),
            })
        }
    }

    fn sample(name: &str, tags: &[&str]) -> Sample {
        Sample {
            id: None,
            name: name.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn repo() -> Repository<Sample> {
        Repository::new(Arc::new(Database::open_in_memory().unwrap()), &Config::default())
    }

    #[test]
    fn save_inserts_then_replaces() {
        let repo = repo();
        let mut s = sample("liver", &["PXD1"]);
        let id = repo.save(&mut s).unwrap();
        assert_eq!(s.id, Some(id));

        s.name = "kidney".into();
        assert_eq!(repo.save(&mut s).unwrap(), id);
        assert_eq!(repo.count().unwrap(), 1);
        assert_eq!(repo.get(id).unwrap().unwrap().name, "kidney");
    }

    #[test]
    fn save_with_vanished_id_inserts() {
        let repo = repo();
        let mut s = sample("liver", &[]);
        repo.save(&mut s).unwrap();
        repo.delete_all().unwrap();
        let old = s.id;
        let new = repo.save(&mut s).unwrap();
        assert_ne!(Some(new), old);
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn filter_by_attributes_pages() {
        let repo = repo();
        for i in 0..7 {
            repo.save(&mut sample(&format!("s{i}"), &["PXD1", "PXD2"])).unwrap();
        }
        repo.save(&mut sample("other", &["PXD1"])).unwrap();

        let clauses = parse_filter("tags=all=PXD1,PXD2").unwrap();
        let page = repo
            .filter_by_attributes(&clauses, &PageRequest::new(1, 5).unwrap())
            .unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page.total_elements, 7);
        assert_eq!(repo.filter_all(&clauses).unwrap().len(), 7);
    }

    #[test]
    fn unknown_filter_field_is_rejected() {
        let repo = repo();
        let clauses = parse_filter("owner==me").unwrap();
        assert!(matches!(
            repo.filter_all(&clauses),
            Err(CoreError::UnknownField { .. })
        ));
    }

    #[test]
    fn values_in_with_sort() {
        let repo = repo();
        for name in ["b", "c", "a"] {
            repo.save(&mut sample(name, &[])).unwrap();
        }
        let names: Vec<String> = repo
            .find_by_values_in("name", ["a", "c"], Some(Sort::descending("name")))
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, ["c", "a"]);
        assert!(repo.find_by_field("name", "z").unwrap().is_none());
    }
}
