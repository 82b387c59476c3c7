//! Block id lookups into the crosswalk

use super::attributes::GeoAttributes;
use crate::error::{Error, Result};
use crate::store::DocumentStore;
use crate::types::Collection;
use std::collections::HashMap;
use std::sync::Mutex;

/// Crosswalk column holding the block id
pub const BLOCK_ID_FIELD: &str = "tabblk2010";

/// Point lookup of a block's geography
pub trait GeoLookup: Send + Sync {
    /// `Ok(None)` when the block has no crosswalk entry
    fn lookup(&self, block: &str) -> Result<Option<GeoAttributes>>;
}

impl GeoLookup for HashMap<String, GeoAttributes> {
    fn lookup(&self, block: &str) -> Result<Option<GeoAttributes>> {
        Ok(self.get(block).cloned())
    }
}

/// Reads the `geo_xwalk` collection of a document store
#[derive(Debug)]
pub struct StoreLookup<S> {
    store: S,
}

impl<S: DocumentStore> StoreLookup<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: DocumentStore> GeoLookup for StoreLookup<S> {
    fn lookup(&self, block: &str) -> Result<Option<GeoAttributes>> {
        self.store
            .find_one(Collection::GeoXwalk, BLOCK_ID_FIELD, block)?
            .map(|entry| GeoAttributes::from_crosswalk(&entry))
            .transpose()
    }
}

/// Memoizes another lookup, including misses
///
/// Origin-destination files repeat the same work block on many rows.
/// The cache is cleared wholesale once it reaches `capacity` entries.
#[derive(Debug)]
pub struct CachedLookup<L> {
    inner: L,
    capacity: usize,
    cache: Mutex<HashMap<String, Option<GeoAttributes>>>,
}

impl<L: GeoLookup> CachedLookup<L> {
    pub fn new(inner: L, capacity: usize) -> Self {
        Self {
            inner,
            capacity: capacity.max(1),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Number of cached blocks
    pub fn len(&self) -> usize {
        self.cache.lock().map_or(0, |c| c.len())
    }

    /// Whether nothing is cached
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<L: GeoLookup> GeoLookup for CachedLookup<L> {
    fn lookup(&self, block: &str) -> Result<Option<GeoAttributes>> {
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| Error::store("lookup cache lock poisoned"))?;
        if let Some(hit) = cache.get(block) {
            return Ok(hit.clone());
        }

        let found = self.inner.lookup(block)?;
        if cache.len() >= self.capacity {
            cache.clear();
        }
        cache.insert(block.to_string(), found.clone());
        Ok(found)
    }
}
