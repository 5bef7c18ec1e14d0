use anyhow::Result;
use csv::ReaderBuilder;
use std::collections::BTreeMap;
use std::io::Read;
use tracing::debug;

use crate::analyzers::types::{ResolutionOutcome, ResolutionSnapshot};
use crate::analyzers::utility::mean;
use crate::parser::{ResolutionColumns, SkipReason};
use crate::stats::PassStats;

/// Computes monthly mean resolution times, overall and per area code.
///
/// Each qualifying row contributes its closed-minus-created duration in
/// hours to two buckets: `(area code, month)` and the overall `month`
/// series, with the month taken from the closed timestamp. Finalization
/// replaces every bucket with its arithmetic mean, so empty buckets can
/// never appear in the snapshot.
pub fn resolution_averages<R: Read>(
    input: R,
    columns: &ResolutionColumns,
) -> Result<ResolutionOutcome> {
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

    let mut overall: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let mut by_area: BTreeMap<String, BTreeMap<String, Vec<f64>>> = BTreeMap::new();
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

        let rec = match layout.extract(&row) {
            Ok(rec) => rec,
            Err(reason) => {
                stats.record_skip(reason);
                continue;
            }
        };

        let hours = (rec.closed - rec.created).num_seconds() as f64 / 3600.0;
        let month = rec.closed.format("%Y-%m").to_string();

        by_area
            .entry(rec.area_code)
            .or_default()
            .entry(month.clone())
            .or_default()
            .push(hours);
        overall.entry(month).or_default().push(hours);

        stats.record_valid();
    }

    let snapshot = ResolutionSnapshot {
        overall: overall
            .into_iter()
            .map(|(month, hours)| (month, mean(&hours)))
            .collect(),
        by_zipcode: by_area
            .into_iter()
            .map(|(area, months)| {
                let means = months
                    .into_iter()
                    .map(|(month, hours)| (month, mean(&hours)))
                    .collect();
                (area, means)
            })
            .collect(),
    };

    Ok(ResolutionOutcome { snapshot, stats })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a 23-field row with values at the default positions:
    /// closed=1, area code=8, status=19, created=22.
    fn wide_row(closed: &str, zip: &str, status: &str, created: &str) -> String {
        let mut fields = vec![""; 23];
        fields[1] = closed;
        fields[8] = zip;
        fields[19] = status;
        fields[22] = created;
        fields.join(",")
    }

    fn run(rows: &[String]) -> ResolutionOutcome {
        let csv = rows.join("\n");
        resolution_averages(csv.as_bytes(), &ResolutionColumns::default()).unwrap()
    }

    #[test]
    fn test_monthly_means() {
        let outcome = run(&[
            // 24h and 48h resolutions in the same bucket
            wide_row("01/06/2024 10:00:00", "10001", "Closed", "01/05/2024 10:00:00"),
            wide_row("01/08/2024 10:00:00", "10001", "Closed", "01/06/2024 10:00:00"),
            // different zip, 12h
            wide_row("01/06/2024 22:00:00", "11201", "Closed", "01/06/2024 10:00:00"),
        ]);

        let snap = &outcome.snapshot;
        assert_eq!(snap.by_zipcode["10001"]["2024-01"], 36.0);
        assert_eq!(snap.by_zipcode["11201"]["2024-01"], 12.0);
        assert_eq!(snap.overall["2024-01"], 28.0);
        assert_eq!(outcome.stats.valid, 3);
    }

    #[test]
    fn test_month_keyed_by_closed_timestamp() {
        let outcome = run(&[wide_row(
            "02/01/2024 10:00:00",
            "10001",
            "Closed",
            "01/31/2024 10:00:00",
        )]);

        assert!(outcome.snapshot.overall.contains_key("2024-02"));
        assert!(!outcome.snapshot.overall.contains_key("2024-01"));
    }

    #[test]
    fn test_zero_duration_contributes_zero_hours() {
        let outcome = run(&[wide_row(
            "01/05/2024 10:00:00",
            "10001",
            "Closed",
            "01/05/2024 10:00:00",
        )]);

        assert_eq!(outcome.snapshot.overall["2024-01"], 0.0);
        assert_eq!(outcome.stats.valid, 1);
    }

    #[test]
    fn test_still_open_rows_are_excluded() {
        let outcome = run(&[
            wide_row("01/06/2024", "10001", "In Progress", "01/05/2024"),
            wide_row("01/06/2024", "10001", "Closed", "01/05/2024"),
        ]);

        assert_eq!(outcome.stats.still_open, 1);
        assert_eq!(outcome.stats.valid, 1);
        assert_eq!(outcome.snapshot.by_zipcode["10001"].len(), 1);
    }

    #[test]
    fn test_negative_duration_contributes_nowhere() {
        let outcome = run(&[wide_row(
            "01/04/2024 10:00:00",
            "10001",
            "Closed",
            "01/05/2024 10:00:00",
        )]);

        assert!(outcome.snapshot.overall.is_empty());
        assert!(outcome.snapshot.by_zipcode.is_empty());
        assert_eq!(outcome.stats.negative_durations, 1);
    }

    #[test]
    fn test_empty_buckets_never_appear() {
        let outcome = run(&[
            wide_row("01/06/2024", "10001", "Closed", "01/05/2024"),
            wide_row("", "10002", "Closed", "01/05/2024"),
        ]);

        assert!(!outcome.snapshot.by_zipcode.contains_key("10002"));
        for months in outcome.snapshot.by_zipcode.values() {
            assert!(!months.is_empty());
        }
    }

    #[test]
    fn test_header_row_skips_naturally() {
        // Fixed-position exports are read without a header row; the header
        // line simply fails date parsing and lands in the skip tally.
        let mut header_fields = vec!["x"; 23];
        header_fields[1] = "Closed Date";
        header_fields[8] = "Incident Zip";
        let outcome = run(&[
            header_fields.join(","),
            wide_row("01/06/2024", "10001", "Closed", "01/05/2024"),
        ]);

        assert_eq!(outcome.stats.valid, 1);
        assert_eq!(outcome.stats.skipped(), 1);
    }

    #[test]
    fn test_year_bound_filters_created_year() {
        let columns = ResolutionColumns {
            year_bound: Some(2024),
            ..ResolutionColumns::default()
        };
        let rows = [
            wide_row("01/06/2024", "10001", "Closed", "01/05/2024"),
            // created in 2023, closed in 2024
            wide_row("01/02/2024", "10001", "Closed", "12/30/2023"),
        ]
        .join("\n");
        let outcome = resolution_averages(rows.as_bytes(), &columns).unwrap();

        assert_eq!(outcome.stats.valid, 1);
        assert_eq!(outcome.stats.out_of_range, 1);
    }
}
