use tracing::{info, warn};

use crate::parser::SkipReason;

/// Row bookkeeping for a single aggregation pass.
///
/// Malformed rows never fail the pass; they land in one of the skip
/// counters instead and are reported once at the end.
#[derive(Debug, Default)]
pub struct PassStats {
    pub valid: u64,

    // skip reasons
    pub unreadable: u64,
    pub short_rows: u64,
    pub missing_fields: u64,
    pub unparseable_dates: u64,
    pub out_of_range: u64,
    pub still_open: u64,
    pub negative_durations: u64,
    pub bad_area_codes: u64,
}

impl PassStats {
    pub fn record_valid(&mut self) {
        self.valid += 1;
    }

    pub fn record_skip(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::Unreadable => self.unreadable += 1,
            SkipReason::ShortRow => self.short_rows += 1,
            SkipReason::MissingField => self.missing_fields += 1,
            SkipReason::UnparseableDate => self.unparseable_dates += 1,
            SkipReason::OutOfRange => self.out_of_range += 1,
            SkipReason::StillOpen => self.still_open += 1,
            SkipReason::NegativeDuration => self.negative_durations += 1,
            SkipReason::BadAreaCode => self.bad_area_codes += 1,
        }
    }

    /// Total rows excluded from the pass, across all reasons.
    pub fn skipped(&self) -> u64 {
        self.unreadable
            + self.short_rows
            + self.missing_fields
            + self.unparseable_dates
            + self.out_of_range
            + self.still_open
            + self.negative_durations
            + self.bad_area_codes
    }

    /// Logs the end-of-pass tally. Warns when nothing qualified.
    pub fn log_summary(&self) {
        info!(
            valid = self.valid,
            skipped = self.skipped(),
            unreadable = self.unreadable,
            short_rows = self.short_rows,
            missing_fields = self.missing_fields,
            unparseable_dates = self.unparseable_dates,
            out_of_range = self.out_of_range,
            still_open = self.still_open,
            negative_durations = self.negative_durations,
            bad_area_codes = self.bad_area_codes,
            "Pass complete"
        );

        if self.valid == 0 {
            warn!("No valid rows found");
        }
    }
}
