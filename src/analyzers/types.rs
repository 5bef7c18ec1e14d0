//! Data types produced by the aggregation passes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::stats::PassStats;

/// One output row of the count pass: how many complaints of one type were
/// filed in one borough. Serialized field names double as the CSV header.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CountRow {
    #[serde(rename = "complaint type")]
    pub category: String,
    #[serde(rename = "borough")]
    pub region: String,
    pub count: u64,
}

/// Result of a count pass: rows sorted lexicographically by
/// (complaint type, borough), plus the row tally.
#[derive(Debug)]
pub struct CountOutcome {
    pub rows: Vec<CountRow>,
    pub stats: PassStats,
}

/// Monthly mean resolution times, overall and per area code.
///
/// Months are `YYYY-MM` keyed off the closed timestamp. BTreeMap keeps the
/// JSON keys sorted, so the snapshot serializes deterministically. Buckets
/// with no qualifying rows are never present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResolutionSnapshot {
    pub overall: BTreeMap<String, f64>,
    pub by_zipcode: BTreeMap<String, BTreeMap<String, f64>>,
}

/// Result of a resolution-time pass.
#[derive(Debug)]
pub struct ResolutionOutcome {
    pub snapshot: ResolutionSnapshot,
    pub stats: PassStats,
}
