//! Batched bulk writes

use crate::error::{Error, Result};
use crate::store::DocumentStore;
use crate::types::{Collection, Document};
use tracing::{debug, trace};

/// Whether a bulk write waits for the store to confirm it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteAck {
    Acknowledged,
    Unacknowledged,
}

/// Counters for one load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Records handed to the store
    pub rows: usize,
    /// Bulk writes issued
    pub batches: usize,
}

impl BatchStats {
    /// Fold another load's counters into this one
    pub fn merge(&mut self, other: BatchStats) {
        self.rows += other.rows;
        self.batches += other.batches;
    }
}

/// Writes records to one collection in batches of `batch_size`
pub struct BatchLoader<'a, S: DocumentStore + ?Sized> {
    store: &'a S,
    collection: Collection,
    batch_size: usize,
    ack: WriteAck,
}

impl<'a, S: DocumentStore + ?Sized> BatchLoader<'a, S> {
    /// Create a loader; a zero batch size is rejected
    pub fn new(
        store: &'a S,
        collection: Collection,
        batch_size: usize,
        ack: WriteAck,
    ) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::config("batch size must be greater than 0"));
        }
        Ok(Self {
            store,
            collection,
            batch_size,
            ack,
        })
    }

    /// Target collection
    pub fn collection(&self) -> Collection {
        self.collection
    }

    /// Issue one bulk write
    pub fn load_batch(&self, records: &[Document]) -> Result<()> {
        debug!(
            "Writing batch of {} records to {}",
            records.len(),
            self.collection
        );
        let result = self.store.insert_many(self.collection, records);
        match self.ack {
            WriteAck::Acknowledged => result,
            WriteAck::Unacknowledged => {
                if let Err(e) = result {
                    trace!("Unacknowledged write to {} failed: {e}", self.collection);
                }
                Ok(())
            }
        }
    }

    /// Drain `records` in batches
    ///
    /// The first error from the input stops the load; batches already
    /// written stay written and the partial batch is dropped.
    pub fn load<I>(&self, records: I) -> Result<BatchStats>
    where
        I: IntoIterator<Item = Result<Document>>,
    {
        let mut stats = BatchStats::default();
        let mut batch: Vec<Document> = Vec::with_capacity(self.batch_size);

        for record in records {
            batch.push(record?);
            if batch.len() == self.batch_size {
                self.load_batch(&batch)?;
                stats.rows += batch.len();
                stats.batches += 1;
                batch.clear();
            }
        }

        if !batch.is_empty() {
            self.load_batch(&batch)?;
            stats.rows += batch.len();
            stats.batches += 1;
        }

        Ok(stats)
    }
}
