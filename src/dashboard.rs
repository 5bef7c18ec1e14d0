//! Chart-series extraction over a preprocessed resolution snapshot.
//!
//! The snapshot is loaded once and passed by reference; selection changes
//! are pure value-to-value functions, so whatever UI layer sits on top
//! (dropdowns, query params, a TUI) only has to re-render the returned
//! series. Months an area has no data for come back as `None` so the
//! renderer can show gaps.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;

use crate::analyzers::types::ResolutionSnapshot;

/// Fallback area codes used when the snapshot has fewer than two areas.
const FALLBACK_AREAS: [&str; 2] = ["10001", "10002"];

/// Reads a snapshot JSON from disk. The result is immutable; every series
/// computation takes it as an argument.
pub fn load_snapshot(path: &str) -> Result<ResolutionSnapshot> {
    let file =
        File::open(path).with_context(|| format!("failed to open snapshot file {path}"))?;
    let snapshot = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("snapshot file {path} is not valid JSON"))?;
    Ok(snapshot)
}

/// The month axis: every month with any qualifying data, ascending.
///
/// Every qualifying row contributes to the overall series, so per-area
/// months are always a subset of these.
pub fn month_axis(snapshot: &ResolutionSnapshot) -> Vec<String> {
    snapshot.overall.keys().cloned().collect()
}

/// Mean hours per month for one area, aligned to the given axis. Months
/// without data yield `None`.
pub fn series_for(
    snapshot: &ResolutionSnapshot,
    months: &[String],
    area: &str,
) -> Vec<Option<f64>> {
    let area_months = snapshot.by_zipcode.get(area);
    months
        .iter()
        .map(|month| area_months.and_then(|m| m.get(month)).copied())
        .collect()
}

/// The overall mean-hours series, aligned to the given axis.
pub fn overall_series(snapshot: &ResolutionSnapshot, months: &[String]) -> Vec<Option<f64>> {
    months
        .iter()
        .map(|month| snapshot.overall.get(month).copied())
        .collect()
}

/// Which of the two compared areas a selection change targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionSlot {
    Primary,
    Secondary,
}

/// The two area codes being compared against the overall series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesSelection {
    pub primary: String,
    pub secondary: String,
}

impl SeriesSelection {
    /// Default selection: the first two area codes in the snapshot, with
    /// fixed fallbacks when fewer exist.
    pub fn initial(snapshot: &ResolutionSnapshot) -> Self {
        let mut areas = snapshot.by_zipcode.keys();
        let primary = areas
            .next()
            .map(String::as_str)
            .unwrap_or(FALLBACK_AREAS[0]);
        let secondary = areas
            .next()
            .map(String::as_str)
            .unwrap_or(FALLBACK_AREAS[1]);
        SeriesSelection {
            primary: primary.to_string(),
            secondary: secondary.to_string(),
        }
    }

    /// Returns the selection with one slot replaced; the original is left
    /// untouched.
    pub fn with_selection(&self, slot: SelectionSlot, area: &str) -> Self {
        let mut next = self.clone();
        match slot {
            SelectionSlot::Primary => next.primary = area.to_string(),
            SelectionSlot::Secondary => next.secondary = area.to_string(),
        }
        next
    }
}

/// One named, month-aligned series.
#[derive(Debug, Serialize, PartialEq)]
pub struct AreaSeries {
    pub area: String,
    pub values: Vec<Option<f64>>,
}

/// Everything a chart needs for one render: the month axis, the overall
/// series, and the two selected area series.
#[derive(Debug, Serialize, PartialEq)]
pub struct SeriesReport {
    pub months: Vec<String>,
    pub overall: Vec<Option<f64>>,
    pub primary: AreaSeries,
    pub secondary: AreaSeries,
}

/// Builds the render state for a selection. Pure: same snapshot and
/// selection, same report.
pub fn report(snapshot: &ResolutionSnapshot, selection: &SeriesSelection) -> SeriesReport {
    let months = month_axis(snapshot);
    let overall = overall_series(snapshot, &months);
    let primary = AreaSeries {
        values: series_for(snapshot, &months, &selection.primary),
        area: selection.primary.clone(),
    };
    let secondary = AreaSeries {
        values: series_for(snapshot, &months, &selection.secondary),
        area: selection.secondary.clone(),
    };

    SeriesReport {
        months,
        overall,
        primary,
        secondary,
    }
}
