//! Engine types
//!
//! Run plan and run report for the load driver.

use crate::http::DatasetKey;
use crate::loader::BatchStats;
use crate::types::{default_years, DatasetGroup, JobType, Segment, Selection, StateCode};
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// The combination matrix of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    /// States in load order
    pub states: Vec<StateCode>,
    /// Data years
    pub years: Vec<u16>,
    /// Dataset groups
    pub groups: Vec<DatasetGroup>,
    /// Segments; `All` resolves per group
    pub segments: Selection<Segment>,
    /// Job types
    pub job_types: Vec<JobType>,
    /// Load each state's crosswalk before its datasets
    pub load_crosswalk: bool,
    /// Load dataset files at all (false for a crosswalk-only run)
    pub load_datasets: bool,
}

impl RunPlan {
    /// Full matrix for `states`: every year, group, segment and job type
    pub fn new(states: Vec<StateCode>) -> Self {
        Self {
            states,
            years: default_years(),
            groups: DatasetGroup::ALL.to_vec(),
            segments: Selection::All,
            job_types: JobType::ALL.to_vec(),
            load_crosswalk: true,
            load_datasets: true,
        }
    }

    /// Only the crosswalk tables of `states`
    pub fn crosswalk_only(states: Vec<StateCode>) -> Self {
        Self {
            load_datasets: false,
            ..Self::new(states)
        }
    }

    /// Set years
    #[must_use]
    pub fn with_years(mut self, years: Vec<u16>) -> Self {
        self.years = years;
        self
    }

    /// Set dataset groups
    #[must_use]
    pub fn with_groups(mut self, groups: Vec<DatasetGroup>) -> Self {
        self.groups = groups;
        self
    }

    /// Set segments
    #[must_use]
    pub fn with_segments(mut self, segments: Selection<Segment>) -> Self {
        self.segments = segments;
        self
    }

    /// Set job types
    #[must_use]
    pub fn with_job_types(mut self, job_types: Vec<JobType>) -> Self {
        self.job_types = job_types;
        self
    }

    /// Skip or load the crosswalk
    #[must_use]
    pub fn with_crosswalk(mut self, load: bool) -> Self {
        self.load_crosswalk = load;
        self
    }

    /// Dataset files of one state-year, in group → segment → job type order
    pub fn dataset_keys_for(&self, state: &StateCode, year: u16) -> Vec<DatasetKey> {
        let mut keys = Vec::new();
        for &group in &self.groups {
            let segments = self.segments.expand(|| group.segments());
            for segment in segments {
                if !segment.applies_to(group) {
                    debug!("Segment {} does not apply to {}; skipping", segment, group);
                    continue;
                }
                for &job_type in &self.job_types {
                    keys.push(DatasetKey {
                        state: state.clone(),
                        group,
                        segment,
                        job_type,
                        year,
                    });
                }
            }
        }
        keys
    }

    /// Number of dataset files the plan covers
    pub fn dataset_count(&self) -> usize {
        if !self.load_datasets {
            return 0;
        }
        let per_state_year: usize = self
            .groups
            .iter()
            .map(|&group| {
                self.segments
                    .expand(|| group.segments())
                    .into_iter()
                    .filter(|s| s.applies_to(group))
                    .count()
                    * self.job_types.len()
            })
            .sum();
        per_state_year * self.states.len() * self.years.len()
    }
}

/// A resource that could not be loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedResource {
    /// URL or path of the resource
    pub resource: String,
    /// Rendered error
    pub error: String,
}

/// Outcome counters of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Dataset files written
    pub loaded: Vec<String>,
    /// Dataset files the server does not have
    pub skipped: Vec<String>,
    /// Resources that failed part-way or could not be reached
    pub failed: Vec<FailedResource>,
    /// Crosswalk tables written
    pub crosswalks_loaded: usize,
    /// Crosswalk tables the server does not have
    pub crosswalks_missing: usize,
    /// Crosswalk rows written
    pub crosswalk_rows: usize,
    /// Dataset rows handed to the store
    pub rows_written: usize,
    /// Bulk writes issued for dataset rows
    pub batches_written: usize,
    /// Record sides left without geography
    pub missing_geography: usize,
    /// Wall time in milliseconds
    pub duration_ms: u64,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a dataset file that was written
    pub fn record_loaded(&mut self, resource: impl Into<String>, stats: BatchStats, missing: usize) {
        self.loaded.push(resource.into());
        self.rows_written += stats.rows;
        self.batches_written += stats.batches;
        self.missing_geography += missing;
    }

    /// Record a dataset file that does not exist upstream
    pub fn record_skipped(&mut self, resource: impl Into<String>) {
        self.skipped.push(resource.into());
    }

    /// Record a failed resource
    pub fn record_failed(&mut self, resource: impl Into<String>, error: impl fmt::Display) {
        self.failed.push(FailedResource {
            resource: resource.into(),
            error: error.to_string(),
        });
    }

    /// Record a crosswalk table that was written
    pub fn record_crosswalk(&mut self, stats: BatchStats) {
        self.crosswalks_loaded += 1;
        self.crosswalk_rows += stats.rows;
    }

    /// Whether nothing failed
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Crosswalks: {} loaded ({} rows), {} not found",
            self.crosswalks_loaded, self.crosswalk_rows, self.crosswalks_missing
        )?;
        writeln!(
            f,
            "Datasets: {} loaded, {} not found, {} failed",
            self.loaded.len(),
            self.skipped.len(),
            self.failed.len()
        )?;
        writeln!(
            f,
            "Rows: {} in {} batch(es), {} side(s) without geography",
            self.rows_written, self.batches_written, self.missing_geography
        )?;
        for failure in &self.failed {
            writeln!(f, "  failed: {} ({})", failure.resource, failure.error)?;
        }
        write!(f, "Finished in {} ms", self.duration_ms)
    }
}
