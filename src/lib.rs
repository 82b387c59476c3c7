// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # LODES Loader
//!
//! Ingests the Census Bureau's LEHD Origin-Destination Employment Statistics
//! (LODES) files into a local DuckDB database, joining every record to its
//! block-level geography.
//!
//! ## Features
//!
//! - **Crosswalk Load**: per-state block crosswalk, Latin-1 decoded and indexed
//! - **Dataset Load**: od, rac and wac files for any state/year/segment/job type
//! - **Enrichment**: home and work geography copied onto every record
//! - **Batched Writes**: fixed-size bulk inserts, acknowledged or fire-and-forget
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use lodes_loader::config::LoaderConfig;
//! use lodes_loader::engine::{RunDriver, RunPlan};
//!
//! #[tokio::main]
//! async fn main() -> lodes_loader::Result<()> {
//!     let config = LoaderConfig::default().with_database("lodes.duckdb");
//!     let driver = RunDriver::from_config(config)?;
//!
//!     let plan = RunPlan::new(vec!["ak".parse()?]).with_years(vec![2011]);
//!     let report = driver.run(&plan).await?;
//!     println!("{report}");
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           RunDriver                             │
//! │  state → crosswalk → year → group → segment → job type          │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌───────────┬───────────┬──────┴──────┬─────────────┬────────────┐
//! │   HTTP    │  Decode   │   Enrich    │   Loader    │   Store    │
//! ├───────────┼───────────┼─────────────┼─────────────┼────────────┤
//! │ Fetcher   │ gzip      │ createdate  │ Batches     │ DuckDB     │
//! │ NotFound  │ CSV       │ labels      │ Ack modes   │ Memory     │
//! │           │ Latin-1   │ geography   │             │ Indexes    │
//! └───────────┴───────────┴─────────────┴─────────────┴────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the loader
pub mod error;

/// Closed enumerations and common aliases
pub mod types;

/// Loader configuration
pub mod config;

/// HTTP client and resource fetcher
pub mod http;

/// Gzip and CSV decoding
pub mod decode;

/// Document stores
pub mod store;

/// Geographic crosswalk
pub mod geo;

/// Row enrichment
pub mod enrich;

/// Batched bulk writes
pub mod loader;

/// Run orchestration
pub mod engine;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use config::LoaderConfig;
pub use engine::{RunDriver, RunPlan, RunReport};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
