//! HTTP client for the LODES file server
//!
//! A thin wrapper over reqwest that:
//! - resolves paths against a base URL
//! - classifies transport failures as connectivity errors
//! - leaves status interpretation to the caller
//!
//! There are no retries: a failed request is reported once.

use crate::error::{Error, Result};
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL for all requests
    pub base_url: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(300),
            user_agent: format!("lodes-loader/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// A fully read response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Final URL requested
    pub url: String,
    /// Response status
    pub status: StatusCode,
    /// Complete body
    pub body: Bytes,
}

impl HttpResponse {
    /// Whether the status is 200 OK (the only success contract upstream offers)
    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK
    }
}

/// HTTP client for GET-ing whole resources
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// GET a resource and read its whole body
    ///
    /// Any status is returned as-is. Failures to connect, time-outs and
    /// broken bodies become [`Error::Connectivity`].
    pub async fn get(&self, path: &str) -> Result<HttpResponse> {
        let url = self.build_url(path);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::connectivity(&url, e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::connectivity(&url, e))?;

        debug!("GET {} -> {} ({} bytes)", url, status.as_u16(), body.len());

        Ok(HttpResponse { url, status, body })
    }

    /// Build full URL from path
    pub fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }

        match &self.config.base_url {
            Some(base) => {
                let base = base.trim_end_matches('/');
                let path = path.trim_start_matches('/');
                format!("{base}/{path}")
            }
            None => path.to_string(),
        }
    }
}
