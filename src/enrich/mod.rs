//! Row enrichment
//!
//! Turns one raw dataset row into a record ready for the store:
//!
//! - `createdate` parsed from `YYYYMMDD`
//! - segment code and label for residence/workplace area rows
//! - `main_state`, `data_year` and the job type label
//! - `home_*` / `work_*` geography copied from the crosswalk
//!
//! A geocode with no crosswalk entry does not fail the row. The side is left
//! out entirely and reported in [`Enrichment::missing`].

mod enricher;
mod types;

pub use enricher::{parse_create_date, RowEnricher, CREATE_DATE_FIELD, CREATE_DATE_FORMAT};
pub use types::{EnrichedRecord, Enrichment, MissingGeography};
