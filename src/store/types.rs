//! Store types and traits

use crate::error::Result;
use crate::types::{Collection, Document};

/// Sort direction of an index key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexOrder {
    Ascending,
    #[default]
    Descending,
}

impl IndexOrder {
    /// Numeric direction as used in index names (`1` / `-1`)
    pub fn direction(self) -> i8 {
        match self {
            IndexOrder::Ascending => 1,
            IndexOrder::Descending => -1,
        }
    }
}

/// A single or compound index definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    /// Key fields in order
    pub fields: Vec<(String, IndexOrder)>,
}

impl IndexSpec {
    /// Single-field descending index
    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            fields: vec![(field.into(), IndexOrder::Descending)],
        }
    }

    /// Compound descending index
    pub fn compound_descending<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|f| (f.into(), IndexOrder::Descending))
                .collect(),
        }
    }

    /// Conventional name, e.g. `stusps_-1` or `home_zcta_code_-1_work_zcta_code_-1`
    pub fn name(&self) -> String {
        self.fields
            .iter()
            .map(|(field, order)| format!("{field}_{}", order.direction()))
            .collect::<Vec<_>>()
            .join("_")
    }

    /// Field names in order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(f, _)| f.as_str())
    }
}

/// A collection-oriented record store
///
/// Lookups compare string-valued fields only, which is all the block
/// crosswalk join needs.
pub trait DocumentStore: Send + Sync {
    /// Append documents as one bulk write
    fn insert_many(&self, collection: Collection, documents: &[Document]) -> Result<()>;

    /// Create an index if it does not exist yet
    fn ensure_index(&self, collection: Collection, index: &IndexSpec) -> Result<()>;

    /// First document whose `field` equals `value`
    fn find_one(&self, collection: Collection, field: &str, value: &str)
        -> Result<Option<Document>>;

    /// Number of documents in a collection
    fn count(&self, collection: Collection) -> Result<usize>;

    /// Number of documents whose `field` equals `value`
    fn count_where(&self, collection: Collection, field: &str, value: &str) -> Result<usize>;

    /// Names of indexes on a collection
    fn index_names(&self, collection: Collection) -> Result<Vec<String>>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for &S {
    fn insert_many(&self, collection: Collection, documents: &[Document]) -> Result<()> {
        (**self).insert_many(collection, documents)
    }

    fn ensure_index(&self, collection: Collection, index: &IndexSpec) -> Result<()> {
        (**self).ensure_index(collection, index)
    }

    fn find_one(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> Result<Option<Document>> {
        (**self).find_one(collection, field, value)
    }

    fn count(&self, collection: Collection) -> Result<usize> {
        (**self).count(collection)
    }

    fn count_where(&self, collection: Collection, field: &str, value: &str) -> Result<usize> {
        (**self).count_where(collection, field, value)
    }

    fn index_names(&self, collection: Collection) -> Result<Vec<String>> {
        (**self).index_names(collection)
    }
}
