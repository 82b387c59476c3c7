//! Common types used throughout the loader
//!
//! The upstream LODES file layout is a compatibility contract: dataset groups,
//! job types and segments are closed sets, modeled here as enums so that a
//! missing label is a compile error instead of a runtime lookup failure.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// A schemaless record as persisted in the document store
pub type Document = JsonObject;

// ============================================================================
// Dataset Group
// ============================================================================

/// Family of LODES files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetGroup {
    /// Origin-destination flows, keyed by home and work block
    Od,
    /// Residence area characteristics
    Rac,
    /// Workplace area characteristics
    Wac,
}

impl DatasetGroup {
    /// All groups in load order
    pub const ALL: [DatasetGroup; 3] = [DatasetGroup::Od, DatasetGroup::Rac, DatasetGroup::Wac];

    /// Code used in upstream paths and file names
    pub fn code(self) -> &'static str {
        match self {
            DatasetGroup::Od => "od",
            DatasetGroup::Rac => "rac",
            DatasetGroup::Wac => "wac",
        }
    }

    /// Collection that receives this group's records
    pub fn collection(self) -> Collection {
        match self {
            DatasetGroup::Od => Collection::OriginDestination,
            DatasetGroup::Rac => Collection::ResidenceArea,
            DatasetGroup::Wac => Collection::WorkArea,
        }
    }

    /// Segments published for this group
    pub fn segments(self) -> Vec<Segment> {
        match self {
            DatasetGroup::Od => OdPart::ALL.iter().copied().map(Segment::Od).collect(),
            DatasetGroup::Rac | DatasetGroup::Wac => AreaSegment::ALL
                .iter()
                .copied()
                .map(Segment::Area)
                .collect(),
        }
    }

    /// Whether rows of this group carry a segment dimension
    pub fn has_area_segments(self) -> bool {
        !matches!(self, DatasetGroup::Od)
    }
}

impl fmt::Display for DatasetGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for DatasetGroup {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "od" => Ok(DatasetGroup::Od),
            "rac" => Ok(DatasetGroup::Rac),
            "wac" => Ok(DatasetGroup::Wac),
            other => Err(Error::invalid_argument(
                "groups",
                format!("unknown dataset group '{other}' (expected od, rac or wac)"),
            )),
        }
    }
}

// ============================================================================
// Job Type
// ============================================================================

/// Employment category filter of a LODES file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobType {
    Jt00,
    Jt01,
    Jt02,
    Jt03,
    Jt04,
    Jt05,
}

impl JobType {
    pub const ALL: [JobType; 6] = [
        JobType::Jt00,
        JobType::Jt01,
        JobType::Jt02,
        JobType::Jt03,
        JobType::Jt04,
        JobType::Jt05,
    ];

    pub fn code(self) -> &'static str {
        match self {
            JobType::Jt00 => "JT00",
            JobType::Jt01 => "JT01",
            JobType::Jt02 => "JT02",
            JobType::Jt03 => "JT03",
            JobType::Jt04 => "JT04",
            JobType::Jt05 => "JT05",
        }
    }

    /// Human-readable label stored on enriched records
    pub fn label(self) -> &'static str {
        match self {
            JobType::Jt00 => "all",
            JobType::Jt01 => "primary",
            JobType::Jt02 => "private",
            JobType::Jt03 => "private primary",
            JobType::Jt04 => "federal",
            JobType::Jt05 => "federal primary",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for JobType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let code = s.trim().to_uppercase();
        JobType::ALL
            .into_iter()
            .find(|jt| jt.code() == code)
            .ok_or_else(|| {
                Error::invalid_argument("job_types", format!("unknown job type '{s}'"))
            })
    }
}

// ============================================================================
// Segments
// ============================================================================

/// Workforce segment of residence/workplace area files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AreaSegment {
    S000,
    Sa01,
    Sa02,
    Sa03,
    Se01,
    Se02,
    Se03,
    Si01,
    Si02,
    Si03,
}

impl AreaSegment {
    pub const ALL: [AreaSegment; 10] = [
        AreaSegment::S000,
        AreaSegment::Sa01,
        AreaSegment::Sa02,
        AreaSegment::Sa03,
        AreaSegment::Se01,
        AreaSegment::Se02,
        AreaSegment::Se03,
        AreaSegment::Si01,
        AreaSegment::Si02,
        AreaSegment::Si03,
    ];

    pub fn code(self) -> &'static str {
        match self {
            AreaSegment::S000 => "S000",
            AreaSegment::Sa01 => "SA01",
            AreaSegment::Sa02 => "SA02",
            AreaSegment::Sa03 => "SA03",
            AreaSegment::Se01 => "SE01",
            AreaSegment::Se02 => "SE02",
            AreaSegment::Se03 => "SE03",
            AreaSegment::Si01 => "SI01",
            AreaSegment::Si02 => "SI02",
            AreaSegment::Si03 => "SI03",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AreaSegment::S000 => "all",
            AreaSegment::Sa01 => "under 29",
            AreaSegment::Sa02 => "30 to 54",
            AreaSegment::Sa03 => "over 55",
            AreaSegment::Se01 => "$1250/month or less",
            AreaSegment::Se02 => "$1251-$3333/month",
            AreaSegment::Se03 => "more than $3333/month",
            AreaSegment::Si01 => "Goods Producing industry sectors",
            AreaSegment::Si02 => "Trade, Transportation, and Utilities industry sectors",
            AreaSegment::Si03 => "All Other Services industry sectors",
        }
    }
}

/// Part of an origin-destination file set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OdPart {
    /// Both blocks inside the state
    Main,
    /// Home block outside the state
    Aux,
}

impl OdPart {
    pub const ALL: [OdPart; 2] = [OdPart::Main, OdPart::Aux];

    pub fn code(self) -> &'static str {
        match self {
            OdPart::Main => "main",
            OdPart::Aux => "aux",
        }
    }
}

/// The segment slot of a file name: an area segment or an od part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    Area(AreaSegment),
    Od(OdPart),
}

impl Segment {
    pub fn code(self) -> &'static str {
        match self {
            Segment::Area(s) => s.code(),
            Segment::Od(p) => p.code(),
        }
    }

    /// Whether files of `group` are published for this segment
    pub fn applies_to(self, group: DatasetGroup) -> bool {
        match self {
            Segment::Area(_) => group.has_area_segments(),
            Segment::Od(_) => group == DatasetGroup::Od,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Segment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if let Some(part) = OdPart::ALL
            .into_iter()
            .find(|p| p.code().eq_ignore_ascii_case(trimmed))
        {
            return Ok(Segment::Od(part));
        }
        AreaSegment::ALL
            .into_iter()
            .find(|seg| seg.code().eq_ignore_ascii_case(trimmed))
            .map(Segment::Area)
            .ok_or_else(|| Error::invalid_argument("segments", format!("unknown segment '{s}'")))
    }
}

// ============================================================================
// Collections
// ============================================================================

/// Named collection in the document store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    GeoXwalk,
    OriginDestination,
    ResidenceArea,
    WorkArea,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::GeoXwalk,
        Collection::OriginDestination,
        Collection::ResidenceArea,
        Collection::WorkArea,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Collection::GeoXwalk => "geo_xwalk",
            Collection::OriginDestination => "origin_destination",
            Collection::ResidenceArea => "residence_area",
            Collection::WorkArea => "work_area",
        }
    }

    /// Reverse of [`Collection::name`]
    pub fn from_name(name: &str) -> Option<Self> {
        Collection::ALL.into_iter().find(|c| c.name() == name)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// States and Years
// ============================================================================

/// Two-letter USPS codes LODES publishes files for
pub const KNOWN_STATES: [&str; 51] = [
    "ak", "al", "ar", "az", "ca", "co", "ct", "dc", "de", "fl", "ga", "hi", "ia", "id", "il",
    "in", "ks", "ky", "la", "ma", "md", "me", "mi", "mn", "mo", "ms", "mt", "nc", "nd", "ne",
    "nh", "nj", "nm", "nv", "ny", "oh", "ok", "or", "pa", "ri", "sc", "sd", "tn", "tx", "ut",
    "va", "vt", "wa", "wi", "wv", "wy",
];

/// First data year expanded from `all`
pub const FIRST_YEAR: u16 = 2002;

/// Last data year expanded from `all` (inclusive)
pub const LAST_YEAR: u16 = 2011;

/// All data years in the default range
pub fn default_years() -> Vec<u16> {
    (FIRST_YEAR..=LAST_YEAR).collect()
}

/// Lowercase two-letter state code
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateCode(String);

impl StateCode {
    /// Validate `code` against an allow-list of lowercase codes
    pub fn parse_in(code: &str, allowed: &[String]) -> Result<Self> {
        let code = code.trim().to_lowercase();
        if allowed.iter().any(|s| *s == code) {
            Ok(Self(code))
        } else {
            Err(Error::invalid_argument(
                "states",
                format!("invalid state code '{code}'"),
            ))
        }
    }

    /// Lowercase form used in upstream paths
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Uppercase form stored on records
    pub fn upper(&self) -> String {
        self.0.to_uppercase()
    }
}

impl FromStr for StateCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let allowed: Vec<String> = KNOWN_STATES.iter().map(|s| (*s).to_string()).collect();
        Self::parse_in(s, &allowed)
    }
}

impl fmt::Display for StateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Selection
// ============================================================================

/// A comma-separated CLI selection where `all` means the full default set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection<T> {
    All,
    Only(Vec<T>),
}

impl<T> Default for Selection<T> {
    fn default() -> Self {
        Selection::All
    }
}

impl<T: Clone> Selection<T> {
    /// Parse `a,b,c` with `parse`; any `all` entry selects everything
    pub fn parse_with<F>(input: &str, mut parse: F) -> Result<Self>
    where
        F: FnMut(&str) -> Result<T>,
    {
        let parts: Vec<&str> = input
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            return Err(Error::invalid_argument("selection", "empty selection"));
        }
        if parts.iter().any(|p| p.eq_ignore_ascii_case("all")) {
            return Ok(Selection::All);
        }
        parts
            .into_iter()
            .map(&mut parse)
            .collect::<Result<Vec<_>>>()
            .map(Selection::Only)
    }

    /// Resolve against the default set
    pub fn expand(&self, all: impl FnOnce() -> Vec<T>) -> Vec<T> {
        match self {
            Selection::All => all(),
            Selection::Only(items) => items.clone(),
        }
    }
}

impl<T: FromStr<Err = Error> + Clone> FromStr for Selection<T> {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Selection::parse_with(s, |part| part.parse::<T>())
    }
}
