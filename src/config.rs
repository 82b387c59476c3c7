//! Loader configuration
//!
//! Connection settings are explicit values handed to each component at
//! construction. Sources, lowest precedence first: built-in defaults, an
//! optional YAML file, `LODES_*` environment variables, then CLI flags.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default LODES file server
pub const DEFAULT_ENDPOINT: &str = "http://lehd.ces.census.gov/onthemap/LODES7";

/// Environment variable overriding [`LoaderConfig::endpoint`]
pub const ENDPOINT_ENV: &str = "LODES_ENDPOINT";

/// Environment variable overriding [`LoaderConfig::database`]
pub const DATABASE_ENV: &str = "LODES_DATABASE";

/// What to do when the file server cannot be reached at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectivityPolicy {
    /// Stop the whole run on the first transport failure
    #[default]
    AbortRun,
    /// Log the failure and continue with the next resource
    SkipResource,
}

/// Complete loader configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Base URL of the LODES file server
    pub endpoint: String,

    /// DuckDB database file (or `:memory:`)
    pub database: String,

    /// HTTP request timeout in seconds
    pub timeout_secs: u64,

    /// Rows per bulk write for dataset files
    pub dataset_batch_size: usize,

    /// Rows per bulk write for crosswalk files
    pub xwalk_batch_size: usize,

    /// Reaction to transport failures
    pub connectivity_policy: ConnectivityPolicy,

    /// Build geography indexes on dataset collections after each load
    pub index_dataset_collections: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            database: "lodes.duckdb".to_string(),
            timeout_secs: 300,
            dataset_batch_size: 20_000,
            xwalk_batch_size: 10_000,
            connectivity_policy: ConnectivityPolicy::AbortRun,
            index_dataset_collections: false,
        }
    }
}

impl LoaderConfig {
    /// Parse a YAML document; omitted fields keep their defaults
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Load from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Apply `LODES_ENDPOINT` / `LODES_DATABASE` if set
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable source
    #[must_use]
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup(ENDPOINT_ENV).filter(|v| !v.is_empty()) {
            self.endpoint = endpoint;
        }
        if let Some(database) = lookup(DATABASE_ENV).filter(|v| !v.is_empty()) {
            self.database = database;
        }
        self
    }

    /// Set the endpoint
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the database location
    #[must_use]
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Set the dataset batch size
    #[must_use]
    pub fn with_dataset_batch_size(mut self, size: usize) -> Self {
        self.dataset_batch_size = size;
        self
    }

    /// Set the crosswalk batch size
    #[must_use]
    pub fn with_xwalk_batch_size(mut self, size: usize) -> Self {
        self.xwalk_batch_size = size;
        self
    }

    /// Set the connectivity policy
    #[must_use]
    pub fn with_connectivity_policy(mut self, policy: ConnectivityPolicy) -> Self {
        self.connectivity_policy = policy;
        self
    }

    /// Enable or disable dataset index creation
    #[must_use]
    pub fn with_dataset_indexes(mut self, enabled: bool) -> Self {
        self.index_dataset_collections = enabled;
        self
    }

    /// HTTP timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check values that would otherwise fail deep inside a run
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.endpoint)?;
        if self.dataset_batch_size == 0 {
            return Err(Error::config("dataset_batch_size must be greater than 0"));
        }
        if self.xwalk_batch_size == 0 {
            return Err(Error::config("xwalk_batch_size must be greater than 0"));
        }
        if self.database.trim().is_empty() {
            return Err(Error::config("database must not be empty"));
        }
        Ok(())
    }
}
