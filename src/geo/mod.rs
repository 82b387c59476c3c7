//! Geographic crosswalk module
//!
//! The crosswalk maps a census block (`tabblk2010`) to its county, tract,
//! place and district names and codes.
//!
//! # Overview
//!
//! - `GeoAttributes` - the per-side geography copied onto enriched records
//! - `GeoLookup` - block id to attributes; `StoreLookup` reads the store
//! - `CrosswalkLoader` - one-time bulk load of a state's crosswalk
//!
//! Loading is not idempotent: running it twice for a state appends every
//! row again. Clear `geo_xwalk` first when reloading.

mod attributes;
mod loader;
mod lookup;

pub use attributes::{GeoAttributes, Side, CROSSWALK_FIELDS};
pub use loader::{CrosswalkLoader, CrosswalkOutcome, CROSSWALK_INDEX_FIELDS};
pub use lookup::{CachedLookup, GeoLookup, StoreLookup, BLOCK_ID_FIELD};

#[cfg(test)]
mod tests;
