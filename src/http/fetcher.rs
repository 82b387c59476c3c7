//! Source fetcher
//!
//! Maps a resource key to its path on the LODES server and retrieves it.
//! A non-200 response is an expected absence, not an error.

use super::client::{HttpClient, HttpClientConfig};
use crate::config::LoaderConfig;
use crate::error::Result;
use crate::types::{DatasetGroup, JobType, Segment, StateCode};
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use tracing::debug;

/// One dataset file: state × group × segment × job type × year
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetKey {
    pub state: StateCode,
    pub group: DatasetGroup,
    pub segment: Segment,
    pub job_type: JobType,
    pub year: u16,
}

/// Identifies one compressed CSV on the file server
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceKey {
    /// Per-state block crosswalk
    Crosswalk { state: StateCode },
    /// A dataset file
    Dataset(DatasetKey),
}

impl ResourceKey {
    /// Crosswalk key for a state
    pub fn crosswalk(state: StateCode) -> Self {
        Self::Crosswalk { state }
    }

    /// Path relative to the endpoint
    pub fn path(&self) -> String {
        match self {
            ResourceKey::Crosswalk { state } => format!("{state}/{state}_xwalk.csv.gz"),
            ResourceKey::Dataset(key) => format!(
                "{state}/{group}/{state}_{group}_{segment}_{job_type}_{year}.csv.gz",
                state = key.state,
                group = key.group,
                segment = key.segment,
                job_type = key.job_type,
                year = key.year,
            ),
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

impl From<DatasetKey> for ResourceKey {
    fn from(key: DatasetKey) -> Self {
        ResourceKey::Dataset(key)
    }
}

/// Result of a fetch that reached the server
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// Gzip-compressed CSV payload
    Found(Bytes),
    /// The server answered with something other than 200
    NotFound { url: String, status: u16 },
}

impl FetchOutcome {
    /// Whether the resource was absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchOutcome::NotFound { .. })
    }
}

/// Anything that can produce LODES resources
#[async_trait]
pub trait ResourceSource: Send + Sync {
    /// Retrieve a resource; transport failures are `Err(Error::Connectivity)`
    async fn fetch(&self, key: &ResourceKey) -> Result<FetchOutcome>;

    /// Location used in log messages
    fn describe(&self, key: &ResourceKey) -> String {
        key.path()
    }
}

/// Fetches resources from the LODES HTTP file server
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: HttpClient,
}

impl HttpFetcher {
    /// Create a fetcher rooted at `endpoint`
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let config = HttpClientConfig::builder().base_url(endpoint).build();
        Ok(Self {
            client: HttpClient::with_config(config)?,
        })
    }

    /// Create a fetcher from loader configuration
    pub fn from_config(config: &LoaderConfig) -> Result<Self> {
        let http = HttpClientConfig::builder()
            .base_url(config.endpoint.clone())
            .timeout(config.timeout())
            .build();
        Ok(Self {
            client: HttpClient::with_config(http)?,
        })
    }
}

#[async_trait]
impl ResourceSource for HttpFetcher {
    async fn fetch(&self, key: &ResourceKey) -> Result<FetchOutcome> {
        let response = self.client.get(&key.path()).await?;

        if !response.is_ok() {
            debug!("{} answered {}", response.url, response.status.as_u16());
            return Ok(FetchOutcome::NotFound {
                url: response.url,
                status: response.status.as_u16(),
            });
        }

        Ok(FetchOutcome::Found(response.body))
    }

    fn describe(&self, key: &ResourceKey) -> String {
        self.client.build_url(&key.path())
    }
}
