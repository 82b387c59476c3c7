//! HTTP module
//!
//! Retrieves compressed LODES resources from the static file server.
//!
//! # Overview
//!
//! - `HttpClient` - reqwest wrapper that reads whole bodies
//! - `ResourceKey` - deterministic file path for a crosswalk or dataset file
//! - `ResourceSource` - fetch seam; `HttpFetcher` is the HTTP implementation
//!
//! Absence (any non-200 status) is `FetchOutcome::NotFound`; a transport
//! failure is `Error::Connectivity`.

mod client;
mod fetcher;

pub use client::{HttpClient, HttpClientConfig, HttpResponse};
pub use fetcher::{DatasetKey, FetchOutcome, HttpFetcher, ResourceKey, ResourceSource};
