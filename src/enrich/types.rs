//! Enrichment result types

use crate::decode::RawRow;
use crate::geo::{GeoAttributes, Side};
use crate::types::{AreaSegment, Document, JobType, JsonValue};
use chrono::NaiveDate;

/// A present geocode without a crosswalk entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingGeography {
    pub side: Side,
    pub geocode: String,
}

/// A raw row plus everything derived from it
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    /// Source columns as published
    pub fields: RawRow,
    pub create_date: NaiveDate,
    /// Set for residence/workplace area rows only
    pub segment: Option<AreaSegment>,
    /// Uppercase state code
    pub main_state: String,
    pub data_year: u16,
    pub job_type: JobType,
    pub home: Option<GeoAttributes>,
    pub work: Option<GeoAttributes>,
}

impl EnrichedRecord {
    /// Geography for one side, if it was resolved
    pub fn geography(&self, side: Side) -> Option<&GeoAttributes> {
        match side {
            Side::Home => self.home.as_ref(),
            Side::Work => self.work.as_ref(),
        }
    }

    /// Flatten into the stored document shape
    ///
    /// Source columns keep their names; `createdate` becomes an ISO date.
    pub fn into_document(self) -> Document {
        let mut doc = self.fields.into_document();

        doc.insert(
            super::CREATE_DATE_FIELD.to_string(),
            JsonValue::String(self.create_date.format("%Y-%m-%d").to_string()),
        );
        if let Some(segment) = self.segment {
            doc.insert(
                "segment_code".to_string(),
                JsonValue::String(segment.code().to_string()),
            );
            doc.insert(
                "segment_name".to_string(),
                JsonValue::String(segment.label().to_string()),
            );
        }
        doc.insert("main_state".to_string(), JsonValue::String(self.main_state));
        doc.insert("data_year".to_string(), JsonValue::from(self.data_year));
        doc.insert(
            "job_type".to_string(),
            JsonValue::String(self.job_type.label().to_string()),
        );

        if let Some(home) = &self.home {
            home.write_prefixed(Side::Home, &mut doc);
        }
        if let Some(work) = &self.work {
            work.write_prefixed(Side::Work, &mut doc);
        }
        doc
    }
}

/// Output of enriching one row
#[derive(Debug, Clone, PartialEq)]
pub struct Enrichment {
    pub record: EnrichedRecord,
    /// Sides whose geography could not be resolved
    pub missing: Vec<MissingGeography>,
}
