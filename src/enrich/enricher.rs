//! Row enricher

use super::types::{EnrichedRecord, Enrichment, MissingGeography};
use crate::decode::RawRow;
use crate::error::{Error, Result};
use crate::geo::{GeoLookup, Side};
use crate::http::DatasetKey;
use crate::types::Segment;
use chrono::NaiveDate;
use tracing::debug;

/// Column holding the publication date
pub const CREATE_DATE_FIELD: &str = "createdate";

/// Compact date layout of `createdate`
pub const CREATE_DATE_FORMAT: &str = "%Y%m%d";

/// Parse a compact `YYYYMMDD` date
pub fn parse_create_date(value: &str) -> Result<NaiveDate> {
    // chrono accepts variable-width fields, so pin the length first
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::malformed(
            CREATE_DATE_FIELD,
            value,
            "expected an 8-digit YYYYMMDD date",
        ));
    }
    NaiveDate::parse_from_str(value, CREATE_DATE_FORMAT)
        .map_err(|e| Error::malformed(CREATE_DATE_FIELD, value, e.to_string()))
}

/// Enriches the rows of one dataset file
pub struct RowEnricher<'a, L: GeoLookup + ?Sized> {
    key: &'a DatasetKey,
    lookup: &'a L,
}

impl<'a, L: GeoLookup + ?Sized> RowEnricher<'a, L> {
    pub fn new(key: &'a DatasetKey, lookup: &'a L) -> Self {
        Self { key, lookup }
    }

    /// Enrich one row
    ///
    /// Fails only on a malformed `createdate` or a lookup error. Unmatched
    /// geocodes are returned in [`Enrichment::missing`].
    pub fn enrich(&self, row: RawRow) -> Result<Enrichment> {
        let raw_date = row
            .get(CREATE_DATE_FIELD)
            .ok_or_else(|| Error::malformed(CREATE_DATE_FIELD, "", "column is missing"))?;
        let create_date = parse_create_date(raw_date)?;

        let segment = match self.key.segment {
            Segment::Area(segment) if self.key.group.has_area_segments() => Some(segment),
            _ => None,
        };

        let mut missing = Vec::new();
        let mut home = None;
        let mut work = None;
        for side in [Side::Home, Side::Work] {
            let Some(geocode) = row.get_non_empty(side.geocode_field()) else {
                continue;
            };
            match self.lookup.lookup(geocode)? {
                Some(attrs) => match side {
                    Side::Home => home = Some(attrs),
                    Side::Work => work = Some(attrs),
                },
                None => {
                    debug!(
                        "No crosswalk entry for {} {} in {}; leaving {}_* fields out",
                        side.geocode_field(),
                        geocode,
                        self.key.state,
                        side.prefix()
                    );
                    missing.push(MissingGeography {
                        side,
                        geocode: geocode.to_string(),
                    });
                }
            }
        }

        Ok(Enrichment {
            record: EnrichedRecord {
                fields: row,
                create_date,
                segment,
                main_state: self.key.state.upper(),
                data_year: self.key.year,
                job_type: self.key.job_type,
                home,
                work,
            },
            missing,
        })
    }
}
