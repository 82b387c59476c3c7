//! Per-side geography attributes

use crate::error::{Error, Result};
use crate::types::{DatasetGroup, Document, JsonValue};

/// Record field suffix paired with the crosswalk column it is copied from
pub const CROSSWALK_FIELDS: [(&str, &str); 18] = [
    ("state_abrv", "stusps"),
    ("state_name", "stname"),
    ("county_fips", "cty"),
    ("county_name", "ctyname"),
    ("census_tract_code", "trct"),
    ("census_tract_name", "trctname"),
    ("census_block_code", "bgrp"),
    ("census_block_name", "bgrpname"),
    ("zcta_code", "zcta"),
    ("zcta_name", "zctaname"),
    ("place_code", "stplc"),
    ("place_name", "stplcname"),
    ("cong_dist_code", "stcd113"),
    ("cong_dist_name", "stcd113name"),
    ("st_leg_lower_code", "stsldl"),
    ("st_leg_lower_name", "stsldlname"),
    ("st_leg_upper_code", "stsldu"),
    ("st_leg_upper_name", "stslduname"),
];

/// Which end of a commute a geocode describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Home,
    Work,
}

impl Side {
    /// Prefix of the enriched field names
    pub fn prefix(self) -> &'static str {
        match self {
            Side::Home => "home",
            Side::Work => "work",
        }
    }

    /// Source column holding this side's block id
    pub fn geocode_field(self) -> &'static str {
        match self {
            Side::Home => "h_geocode",
            Side::Work => "w_geocode",
        }
    }

    /// Sides whose geocode a group's files carry
    pub fn for_group(group: DatasetGroup) -> &'static [Side] {
        match group {
            DatasetGroup::Od => &[Side::Home, Side::Work],
            DatasetGroup::Rac => &[Side::Home],
            DatasetGroup::Wac => &[Side::Work],
        }
    }

    /// Prefixed field name, e.g. `home_county_fips`
    pub fn field(self, suffix: &str) -> String {
        format!("{}_{suffix}", self.prefix())
    }
}

/// Geography of one block, in [`CROSSWALK_FIELDS`] order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoAttributes {
    values: Vec<String>,
}

impl GeoAttributes {
    /// Extract the attributes from a crosswalk document
    ///
    /// Every mapped column must be present; a crosswalk entry missing one is
    /// malformed rather than partially usable.
    pub fn from_crosswalk(entry: &Document) -> Result<Self> {
        let values = CROSSWALK_FIELDS
            .iter()
            .map(|(_, column)| match entry.get(*column) {
                Some(JsonValue::String(s)) => Ok(s.clone()),
                Some(JsonValue::Null) | None => Err(Error::decode(format!(
                    "crosswalk entry {} has no '{column}' value",
                    entry
                        .get(super::BLOCK_ID_FIELD)
                        .map_or_else(|| "<unknown>".to_string(), JsonValue::to_string)
                ))),
                Some(other) => Ok(other.to_string()),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { values })
    }

    /// Value by record suffix, e.g. `county_fips`
    pub fn get(&self, suffix: &str) -> Option<&str> {
        CROSSWALK_FIELDS
            .iter()
            .position(|(s, _)| *s == suffix)
            .map(|i| self.values[i].as_str())
    }

    /// Suffix/value pairs in order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        CROSSWALK_FIELDS
            .iter()
            .zip(self.values.iter())
            .map(|((suffix, _), value)| (*suffix, value.as_str()))
    }

    /// Copy every attribute onto `document` under the side's prefix
    pub fn write_prefixed(&self, side: Side, document: &mut Document) {
        for (suffix, value) in self.iter() {
            document.insert(side.field(suffix), JsonValue::String(value.to_string()));
        }
    }
}
