use anyhow::Result;
use csv::ReaderBuilder;
use std::collections::BTreeMap;
use std::io::Read;
use tracing::debug;

use crate::analyzers::types::{CountOutcome, CountRow};
use crate::parser::{CountColumns, DateRange, SkipReason};
use crate::stats::PassStats;

/// Counts complaints per (complaint type, borough) over an inclusive date
/// range.
///
/// A single pass over the rows: anything malformed or outside the range is
/// tallied and dropped, qualifying rows bump their bucket. The BTreeMap
/// accumulator yields the output rows already in lexicographic key order.
pub fn count_complaints<R: Read>(
    input: R,
    columns: &CountColumns,
    range: DateRange,
) -> Result<CountOutcome> {
    let wants_headers = columns.wants_headers();
    let mut reader = ReaderBuilder::new()
        .has_headers(wants_headers)
        .flexible(true)
        .from_reader(input);

    let headers = if wants_headers {
        Some(reader.headers()?.clone())
    } else {
        None
    };
    let layout = columns.resolve(headers.as_ref())?;

    let mut counts: BTreeMap<(String, String), u64> = BTreeMap::new();
    let mut stats = PassStats::default();

    for result in reader.records() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                debug!(error = %e, "Unreadable row");
                stats.record_skip(SkipReason::Unreadable);
                continue;
            }
        };

        match layout.extract(&row) {
            Ok(rec) if range.contains(rec.created) => {
                *counts.entry((rec.category, rec.region)).or_default() += 1;
                stats.record_valid();
            }
            Ok(_) => stats.record_skip(SkipReason::OutOfRange),
            Err(reason) => stats.record_skip(reason),
        }
    }

    let rows = counts
        .into_iter()
        .map(|((category, region), count)| CountRow {
            category,
            region,
            count,
        })
        .collect();

    Ok(CountOutcome { rows, stats })
}
