//! In-memory document store
//!
//! Keeps every collection in a `Vec` and records the size of each bulk
//! write, which makes batching observable in tests and dry runs.

use super::types::{DocumentStore, IndexSpec};
use crate::error::{Error, Result};
use crate::types::{Collection, Document, JsonValue};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct CollectionData {
    documents: Vec<Document>,
    indexes: Vec<IndexSpec>,
    batch_sizes: Vec<usize>,
}

#[derive(Debug, Default)]
struct Inner {
    collections: HashMap<Collection, CollectionData>,
    failing: HashSet<Collection>,
}

/// Document store held entirely in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every insert into `collection` fail
    pub fn fail_writes_to(&self, collection: Collection) -> Result<()> {
        self.lock()?.failing.insert(collection);
        Ok(())
    }

    /// Sizes of the bulk writes received by a collection, in order
    pub fn batch_sizes(&self, collection: Collection) -> Result<Vec<usize>> {
        Ok(self
            .lock()?
            .collections
            .get(&collection)
            .map(|c| c.batch_sizes.clone())
            .unwrap_or_default())
    }

    /// Copy of every document in a collection
    pub fn documents(&self, collection: Collection) -> Result<Vec<Document>> {
        Ok(self
            .lock()?
            .collections
            .get(&collection)
            .map(|c| c.documents.clone())
            .unwrap_or_default())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| Error::store("memory store lock poisoned"))
    }
}

fn matches(document: &Document, field: &str, value: &str) -> bool {
    matches!(document.get(field), Some(JsonValue::String(s)) if s == value)
}

impl DocumentStore for MemoryStore {
    fn insert_many(&self, collection: Collection, documents: &[Document]) -> Result<()> {
        let mut inner = self.lock()?;
        if inner.failing.contains(&collection) {
            return Err(Error::store(format!("write to {collection} rejected")));
        }
        let data = inner.collections.entry(collection).or_default();
        data.documents.extend_from_slice(documents);
        data.batch_sizes.push(documents.len());
        Ok(())
    }

    fn ensure_index(&self, collection: Collection, index: &IndexSpec) -> Result<()> {
        let mut inner = self.lock()?;
        let data = inner.collections.entry(collection).or_default();
        if !data.indexes.contains(index) {
            data.indexes.push(index.clone());
        }
        Ok(())
    }

    fn find_one(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> Result<Option<Document>> {
        Ok(self.lock()?.collections.get(&collection).and_then(|c| {
            c.documents
                .iter()
                .find(|doc| matches(doc, field, value))
                .cloned()
        }))
    }

    fn count(&self, collection: Collection) -> Result<usize> {
        Ok(self
            .lock()?
            .collections
            .get(&collection)
            .map_or(0, |c| c.documents.len()))
    }

    fn count_where(&self, collection: Collection, field: &str, value: &str) -> Result<usize> {
        Ok(self.lock()?.collections.get(&collection).map_or(0, |c| {
            c.documents
                .iter()
                .filter(|doc| matches(doc, field, value))
                .count()
        }))
    }

    fn index_names(&self, collection: Collection) -> Result<Vec<String>> {
        Ok(self
            .lock()?
            .collections
            .get(&collection)
            .map(|c| c.indexes.iter().map(IndexSpec::name).collect())
            .unwrap_or_default())
    }
}
