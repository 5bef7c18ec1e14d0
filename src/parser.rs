//! Tolerant field extraction for complaint CSV rows.
//!
//! Rows come in two shapes depending on the export: header-driven (columns
//! addressed by name) and fixed-position (columns addressed by index). Both
//! are expressed through [`FieldSelector`]; a pass resolves its selectors
//! once against the header row and then extracts one record per data row,
//! skipping anything malformed instead of failing the pass.

use anyhow::{Result, anyhow};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use csv::StringRecord;

/// Area codes shorter than this are treated as garbage (truncated zips,
/// placeholder values) and skipped.
const MIN_AREA_CODE_LEN: usize = 5;

type TimestampParser = fn(&str) -> Option<NaiveDateTime>;

fn twelve_hour(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%m/%d/%Y %I:%M:%S %p").ok()
}

fn twenty_four_hour(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%m/%d/%Y %H:%M:%S").ok()
}

fn date_only(raw: &str) -> Option<NaiveDateTime> {
    NaiveDate::parse_from_str(raw, "%m/%d/%Y")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// Timestamp layouts seen in 311-style exports, tried in order.
const TIMESTAMP_PARSERS: &[TimestampParser] = &[twelve_hour, twenty_four_hour, date_only];

/// Parses a timestamp by trying each known layout in order, returning the
/// first success. Empty or unrecognized input yields `None`, never an error.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    TIMESTAMP_PARSERS.iter().find_map(|parse| parse(raw))
}

/// Why a row was excluded from an aggregation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The csv reader could not decode the row at all.
    Unreadable,
    /// Fewer fields than the configured minimum.
    ShortRow,
    /// A required field is absent or empty.
    MissingField,
    /// A date field matched none of the known layouts.
    UnparseableDate,
    /// Created date outside the requested range or year bound.
    OutOfRange,
    /// Status still carries the "open" sentinel; no duration exists yet.
    StillOpen,
    /// Closed timestamp earlier than created.
    NegativeDuration,
    /// Area code too short to be real.
    BadAreaCode,
}

/// Addresses a column either by header name or by fixed position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSelector {
    ByName(String),
    ByIndex(usize),
}

impl FieldSelector {
    pub fn name(name: &str) -> Self {
        FieldSelector::ByName(name.to_string())
    }

    pub fn index(index: usize) -> Self {
        FieldSelector::ByIndex(index)
    }

    /// Parses a CLI selector value: integers select by position, anything
    /// else selects by header name.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.parse::<usize>() {
            Ok(index) => FieldSelector::ByIndex(index),
            Err(_) => FieldSelector::ByName(raw.to_string()),
        }
    }

    fn resolve(&self, headers: Option<&StringRecord>) -> Result<usize> {
        match self {
            FieldSelector::ByIndex(index) => Ok(*index),
            FieldSelector::ByName(name) => {
                let headers = headers.ok_or_else(|| {
                    anyhow!("column {name:?} is selected by name but the input has no header row")
                })?;
                headers
                    .iter()
                    .position(|h| h.trim() == name)
                    .ok_or_else(|| anyhow!("column {name:?} not found in header row"))
            }
        }
    }
}

/// Returns a trimmed, non-empty field value, or `None` when the position is
/// missing or blank.
fn field(row: &StringRecord, index: usize) -> Option<&str> {
    row.get(index).map(str::trim).filter(|v| !v.is_empty())
}

/// Inclusive calendar-date boundary for a counting pass. Comparison ignores
/// time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(anyhow!("start date {start} must not be after end date {end}"));
        }
        Ok(DateRange { start, end })
    }

    /// Parses `MM/DD/YYYY` boundary strings. A malformed boundary or an
    /// inverted range is a configuration error, raised before any row is
    /// read.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let start = parse_boundary(start)?;
        let end = parse_boundary(end)?;
        Self::new(start, end)
    }

    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        let date = ts.date();
        self.start <= date && date <= self.end
    }
}

fn parse_boundary(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%m/%d/%Y")
        .map_err(|_| anyhow!("date {raw:?} must be in MM/DD/YYYY format"))
}

/// Column selectors for the complaint-count pass.
#[derive(Debug, Clone)]
pub struct CountColumns {
    pub created: FieldSelector,
    pub category: FieldSelector,
    pub region: FieldSelector,
}

impl Default for CountColumns {
    fn default() -> Self {
        CountColumns {
            created: FieldSelector::name("Created Date"),
            category: FieldSelector::name("Complaint Type"),
            region: FieldSelector::name("Borough"),
        }
    }
}

impl CountColumns {
    pub fn wants_headers(&self) -> bool {
        [&self.created, &self.category, &self.region]
            .iter()
            .any(|s| matches!(s, FieldSelector::ByName(_)))
    }

    pub fn resolve(&self, headers: Option<&StringRecord>) -> Result<CountLayout> {
        Ok(CountLayout {
            created: self.created.resolve(headers)?,
            category: self.category.resolve(headers)?,
            region: self.region.resolve(headers)?,
        })
    }
}

/// Count-pass selectors resolved to positions.
#[derive(Debug, Clone, Copy)]
pub struct CountLayout {
    created: usize,
    category: usize,
    region: usize,
}

/// One qualifying row of the count pass.
#[derive(Debug, Clone, PartialEq)]
pub struct CountRecord {
    pub created: NaiveDateTime,
    pub category: String,
    pub region: String,
}

impl CountLayout {
    pub fn extract(&self, row: &StringRecord) -> Result<CountRecord, SkipReason> {
        let created_raw = field(row, self.created).ok_or(SkipReason::MissingField)?;
        let created = parse_timestamp(created_raw).ok_or(SkipReason::UnparseableDate)?;
        let category = field(row, self.category).ok_or(SkipReason::MissingField)?;
        let region = field(row, self.region).ok_or(SkipReason::MissingField)?;

        Ok(CountRecord {
            created,
            category: category.to_string(),
            region: region.to_string(),
        })
    }
}

/// Column selectors and parse rules for the resolution-time pass.
///
/// The defaults mirror the raw 311 export: fixed positions, no header row,
/// at least 23 fields per row.
#[derive(Debug, Clone)]
pub struct ResolutionColumns {
    pub created: FieldSelector,
    pub closed: FieldSelector,
    pub status: FieldSelector,
    pub area_code: FieldSelector,
    /// Rows with fewer fields are skipped.
    pub min_fields: usize,
    /// When set, rows created outside this calendar year are skipped.
    pub year_bound: Option<i32>,
    /// Status value marking a complaint that is not closed yet.
    pub still_open: String,
}

impl Default for ResolutionColumns {
    fn default() -> Self {
        ResolutionColumns {
            created: FieldSelector::index(22),
            closed: FieldSelector::index(1),
            status: FieldSelector::index(19),
            area_code: FieldSelector::index(8),
            min_fields: 23,
            year_bound: None,
            still_open: "In Progress".to_string(),
        }
    }
}

impl ResolutionColumns {
    pub fn wants_headers(&self) -> bool {
        [&self.created, &self.closed, &self.status, &self.area_code]
            .iter()
            .any(|s| matches!(s, FieldSelector::ByName(_)))
    }

    pub fn resolve(&self, headers: Option<&StringRecord>) -> Result<ResolutionLayout> {
        Ok(ResolutionLayout {
            created: self.created.resolve(headers)?,
            closed: self.closed.resolve(headers)?,
            status: self.status.resolve(headers)?,
            area_code: self.area_code.resolve(headers)?,
            min_fields: self.min_fields,
            year_bound: self.year_bound,
            still_open: self.still_open.clone(),
        })
    }
}

/// Resolution-pass selectors resolved to positions, plus the parse rules
/// that decide row-level skips.
#[derive(Debug, Clone)]
pub struct ResolutionLayout {
    created: usize,
    closed: usize,
    status: usize,
    area_code: usize,
    min_fields: usize,
    year_bound: Option<i32>,
    still_open: String,
}

/// One qualifying row of the resolution-time pass. `closed` never precedes
/// `created`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionRecord {
    pub created: NaiveDateTime,
    pub closed: NaiveDateTime,
    pub area_code: String,
}

impl ResolutionLayout {
    pub fn extract(&self, row: &StringRecord) -> Result<ResolutionRecord, SkipReason> {
        if row.len() < self.min_fields {
            return Err(SkipReason::ShortRow);
        }

        let area_code = field(row, self.area_code).ok_or(SkipReason::MissingField)?;
        if area_code.len() < MIN_AREA_CODE_LEN {
            return Err(SkipReason::BadAreaCode);
        }

        let closed_raw = field(row, self.closed).ok_or(SkipReason::MissingField)?;
        if let Some(status) = field(row, self.status) {
            if status == self.still_open {
                return Err(SkipReason::StillOpen);
            }
        }

        let created_raw = field(row, self.created).ok_or(SkipReason::MissingField)?;
        let created = parse_timestamp(created_raw).ok_or(SkipReason::UnparseableDate)?;

        if let Some(year) = self.year_bound {
            if created.year() != year {
                return Err(SkipReason::OutOfRange);
            }
        }

        let closed = parse_timestamp(closed_raw).ok_or(SkipReason::UnparseableDate)?;
        if closed < created {
            return Err(SkipReason::NegativeDuration);
        }

        Ok(ResolutionRecord {
            created,
            closed,
            area_code: area_code.to_string(),
        })
    }
}
