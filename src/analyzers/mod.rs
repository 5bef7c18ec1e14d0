//! Complaint aggregation passes.
//!
//! Each pass is a single synchronous sweep over CSV rows: tolerant field
//! extraction, bucket accumulation, then finalization into a sorted or
//! JSON-shaped result. Malformed rows are tallied, never fatal.

pub mod count;
pub mod resolution;
pub mod types;
pub mod utility;
