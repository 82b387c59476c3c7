//! Execution engine module
//!
//! Walks the run matrix and drives every fetch → decode → enrich → load cycle.
//!
//! # Overview
//!
//! - `RunDriver` - owns the source, the store and the configuration
//! - `RunPlan` - states, years, groups, segments and job types to load
//! - `RunReport` - what was loaded, skipped and failed
//!
//! Iteration order is state → crosswalk → year → group → segment → job type.
//! A missing file is skipped. A transport failure follows the configured
//! [`ConnectivityPolicy`]; any other failure is confined to its resource.

mod types;

pub use crate::config::ConnectivityPolicy;
pub use types::{FailedResource, RunPlan, RunReport};

use crate::config::LoaderConfig;
use crate::decode::{CsvRowReader, RawRow, TextEncoding};
use crate::enrich::RowEnricher;
use crate::error::{Error, Result};
use crate::geo::{
    CachedLookup, CrosswalkLoader, CrosswalkOutcome, Side, StoreLookup, CROSSWALK_FIELDS,
};
use crate::http::{DatasetKey, FetchOutcome, HttpFetcher, ResourceKey, ResourceSource};
use crate::loader::{BatchLoader, BatchStats, WriteAck};
use crate::store::{DocumentStore, DuckDbStore, IndexSpec};
use crate::types::{DatasetGroup, Document, StateCode};
use bytes::Bytes;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Blocks remembered per dataset file
const LOOKUP_CACHE_CAPACITY: usize = 100_000;

/// Indexes built on a dataset collection when index creation is enabled
///
/// Origin-destination gets one compound home/work index per geography code;
/// area collections get one index per code field of their side.
pub fn dataset_index_specs(group: DatasetGroup) -> Vec<IndexSpec> {
    let codes = CROSSWALK_FIELDS
        .iter()
        .map(|(suffix, _)| *suffix)
        .filter(|suffix| suffix.contains("code"));

    match group {
        DatasetGroup::Od => codes
            .map(|suffix| {
                IndexSpec::compound_descending([
                    Side::Home.field(suffix),
                    Side::Work.field(suffix),
                ])
            })
            .collect(),
        DatasetGroup::Rac | DatasetGroup::Wac => Side::for_group(group)
            .iter()
            .flat_map(|side| {
                codes
                    .clone()
                    .map(move |suffix| IndexSpec::descending(side.field(suffix)))
            })
            .collect(),
    }
}

/// Rows and unresolved sides of one dataset file
struct DatasetLoad {
    stats: BatchStats,
    missing_geography: usize,
}

/// Orchestrates a full load run
pub struct RunDriver<F, S> {
    source: F,
    store: S,
    config: LoaderConfig,
}

impl RunDriver<HttpFetcher, DuckDbStore> {
    /// Driver against the configured HTTP endpoint and DuckDB database
    pub fn from_config(config: LoaderConfig) -> Result<Self> {
        config.validate()?;
        let source = HttpFetcher::from_config(&config)?;
        let store = DuckDbStore::open(&config.database)?;
        Ok(Self::new(source, store, config))
    }
}

impl<F: ResourceSource, S: DocumentStore> RunDriver<F, S> {
    /// Create a driver from explicit parts
    pub fn new(source: F, store: S, config: LoaderConfig) -> Self {
        Self {
            source,
            store,
            config,
        }
    }

    /// Get the store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the source
    pub fn source(&self) -> &F {
        &self.source
    }

    /// Get the configuration
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Execute a plan
    ///
    /// Returns `Err` only when a transport failure ends the run under
    /// [`ConnectivityPolicy::AbortRun`], or when the configuration is unusable.
    pub async fn run(&self, plan: &RunPlan) -> Result<RunReport> {
        let start = Instant::now();
        let mut report = RunReport::new();

        info!(
            "Starting run: {} state(s), {} year(s), {} dataset file(s)",
            plan.states.len(),
            if plan.load_datasets { plan.years.len() } else { 0 },
            plan.dataset_count()
        );

        for state in &plan.states {
            if plan.load_crosswalk {
                info!("Loading geographic crosswalk table for {}", state.upper());
                if !self.load_crosswalk(state, &mut report).await? {
                    continue;
                }
            } else {
                info!("Skipping geographic crosswalk table for {}", state.upper());
            }

            if !plan.load_datasets {
                continue;
            }

            for &year in &plan.years {
                info!("Loading data from {} for {}", year, state.upper());
                for key in plan.dataset_keys_for(state, year) {
                    self.load_dataset(&key, &mut report).await?;
                }
            }
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Run finished: {} loaded, {} not found, {} failed, {} rows",
            report.loaded.len(),
            report.skipped.len(),
            report.failed.len(),
            report.rows_written
        );
        Ok(report)
    }

    /// Load one state's crosswalk
    ///
    /// Returns whether the state's datasets should be loaded. A crosswalk
    /// that is absent upstream does not stop them; one that failed does.
    pub async fn load_crosswalk(
        &self,
        state: &StateCode,
        report: &mut RunReport,
    ) -> Result<bool> {
        let loader =
            CrosswalkLoader::new(&self.source, &self.store, self.config.xwalk_batch_size);
        let resource = self.source.describe(&ResourceKey::crosswalk(state.clone()));

        match loader.load(state).await {
            Ok(CrosswalkOutcome::Loaded(stats)) => {
                report.record_crosswalk(stats);
                Ok(true)
            }
            Ok(CrosswalkOutcome::NotFound { .. }) => {
                report.crosswalks_missing += 1;
                Ok(true)
            }
            Err(e) => {
                self.handle_failure(resource, e, report)?;
                warn!("Skipping datasets for {} without a crosswalk", state.upper());
                Ok(false)
            }
        }
    }

    /// Fetch, enrich and write one dataset file
    pub async fn load_dataset(&self, key: &DatasetKey, report: &mut RunReport) -> Result<()> {
        let resource = ResourceKey::from(key.clone());
        let url = self.source.describe(&resource);

        let outcome = match self.source.fetch(&resource).await {
            Ok(outcome) => outcome,
            Err(e) => return self.handle_failure(url, e, report),
        };

        let body = match outcome {
            FetchOutcome::Found(body) => body,
            FetchOutcome::NotFound { .. } => {
                warn!(
                    "No {} data for segment {} in {} in the year {} of type {}",
                    key.group, key.segment, key.state, key.year, key.job_type
                );
                report.record_skipped(url);
                return Ok(());
            }
        };

        match self.write_dataset(key, body) {
            Ok(load) => {
                if load.missing_geography > 0 {
                    warn!(
                        "{} geography side(s) in {} had no crosswalk entry",
                        load.missing_geography, url
                    );
                }
                info!("Successfully loaded {}", url);
                report.record_loaded(url, load.stats, load.missing_geography);
                Ok(())
            }
            Err(e) => self.handle_failure(url, e, report),
        }
    }

    fn write_dataset(&self, key: &DatasetKey, body: Bytes) -> Result<DatasetLoad> {
        let rows = CsvRowReader::from_gzip(body, TextEncoding::Utf8)?;
        let lookup = CachedLookup::new(StoreLookup::new(&self.store), LOOKUP_CACHE_CAPACITY);
        let enricher = RowEnricher::new(key, &lookup);
        let collection = key.group.collection();
        let loader = BatchLoader::new(
            &self.store,
            collection,
            self.config.dataset_batch_size,
            WriteAck::Unacknowledged,
        )?;

        let mut missing_geography = 0;
        let records = rows.map(|row: Result<RawRow>| -> Result<Document> {
            let enrichment = enricher.enrich(row?)?;
            missing_geography += enrichment.missing.len();
            Ok(enrichment.record.into_document())
        });
        let stats = loader.load(records)?;

        if self.config.index_dataset_collections && stats.rows > 0 {
            for spec in dataset_index_specs(key.group) {
                self.store.ensure_index(collection, &spec)?;
            }
            debug!("Ensured geography indexes on {}", collection);
        }

        Ok(DatasetLoad {
            stats,
            missing_geography,
        })
    }

    /// Apply the failure policy to one resource
    fn handle_failure(&self, resource: String, err: Error, report: &mut RunReport) -> Result<()> {
        if err.is_connectivity() {
            match self.config.connectivity_policy {
                ConnectivityPolicy::AbortRun => {
                    error!("Was unable to load {}: {}", resource, err);
                    return Err(err);
                }
                ConnectivityPolicy::SkipResource => {
                    warn!("Was unable to load {}: {}; continuing", resource, err);
                }
            }
        } else {
            error!("Failed to load {}: {}", resource, err);
        }
        report.record_failed(resource, err);
        Ok(())
    }
}
