//! Crosswalk bulk load

use super::lookup::BLOCK_ID_FIELD;
use crate::decode::{CsvRowReader, TextEncoding};
use crate::error::Result;
use crate::http::{FetchOutcome, ResourceKey, ResourceSource};
use crate::loader::{BatchLoader, BatchStats, WriteAck};
use crate::store::{DocumentStore, IndexSpec};
use crate::types::{Collection, StateCode};
use tracing::{debug, info, warn};

/// Fields indexed on `geo_xwalk` after every crosswalk load
pub const CROSSWALK_INDEX_FIELDS: [&str; 3] = ["stusps", "cty", BLOCK_ID_FIELD];

/// What a crosswalk load did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrosswalkOutcome {
    /// Rows were written and indexes ensured
    Loaded(BatchStats),
    /// The server has no crosswalk for the state
    NotFound { url: String },
}

/// Loads a state's block crosswalk into `geo_xwalk`
pub struct CrosswalkLoader<'a, F: ResourceSource + ?Sized, S: DocumentStore + ?Sized> {
    source: &'a F,
    store: &'a S,
    batch_size: usize,
}

impl<'a, F: ResourceSource + ?Sized, S: DocumentStore + ?Sized> CrosswalkLoader<'a, F, S> {
    pub fn new(source: &'a F, store: &'a S, batch_size: usize) -> Self {
        Self {
            source,
            store,
            batch_size,
        }
    }

    /// Fetch, decode as Latin-1 and insert every row, then index
    ///
    /// Writes are acknowledged: a failed batch aborts the load with the
    /// batches before it already persisted.
    pub async fn load(&self, state: &StateCode) -> Result<CrosswalkOutcome> {
        let key = ResourceKey::crosswalk(state.clone());

        let body = match self.source.fetch(&key).await? {
            FetchOutcome::Found(body) => body,
            FetchOutcome::NotFound { url, status } => {
                warn!(
                    "Could not find Geographic crosswalk table for {} ({} answered {})",
                    state, url, status
                );
                return Ok(CrosswalkOutcome::NotFound { url });
            }
        };

        let rows = CsvRowReader::from_gzip(body, TextEncoding::Latin1)?;
        let loader = BatchLoader::new(
            self.store,
            Collection::GeoXwalk,
            self.batch_size,
            WriteAck::Acknowledged,
        )?;
        let stats = loader.load(rows.map(|row| row.map(|r| r.into_document())))?;

        for field in CROSSWALK_INDEX_FIELDS {
            self.store
                .ensure_index(Collection::GeoXwalk, &IndexSpec::descending(field))?;
        }
        debug!("Ensured crosswalk indexes {:?}", CROSSWALK_INDEX_FIELDS);

        info!(
            "Loaded {} crosswalk rows for {} in {} batch(es)",
            stats.rows, state, stats.batches
        );
        Ok(CrosswalkOutcome::Loaded(stats))
    }
}
