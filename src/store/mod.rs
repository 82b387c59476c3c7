//! Document store module
//!
//! Persists schemaless records into named collections.
//!
//! # Overview
//!
//! - `DocumentStore` - the seam every writer and reader goes through
//! - `DuckDbStore` - DuckDB-backed store (file or in-memory)
//! - `MemoryStore` - process-local store that also records batch sizes
//!
//! Stores append: inserting the same record twice keeps two copies.

mod engine;
mod memory;
mod types;

pub use engine::DuckDbStore;
pub use memory::MemoryStore;
pub use types::{DocumentStore, IndexOrder, IndexSpec};

#[cfg(test)]
mod tests;
