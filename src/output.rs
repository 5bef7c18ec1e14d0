//! Output formatting and persistence for aggregation results.
//!
//! Count rows re-serialize as CSV with a fixed header; snapshots and
//! series reports serialize as pretty-printed JSON.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

use crate::analyzers::types::CountRow;
use csv::WriterBuilder;
use std::fs::File;
use std::io::Write;

/// The count CSV header, fixed even when no rows qualified.
const COUNT_HEADER: [&str; 3] = ["complaint type", "borough", "count"];

/// Serializes count rows as CSV to any writer.
pub fn write_count_rows<W: Write>(writer: W, rows: &[CountRow]) -> Result<()> {
    let mut csv_writer = WriterBuilder::new().from_writer(writer);

    if rows.is_empty() {
        // serde-driven headers only appear with at least one record
        csv_writer.write_record(COUNT_HEADER)?;
    }
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;

    Ok(())
}

/// Writes count rows to the given path, or to stdout when no path is set.
pub fn write_count_output(path: Option<&str>, rows: &[CountRow]) -> Result<()> {
    match path {
        Some(path) => {
            debug!(path, rows = rows.len(), "Writing count CSV");
            let file = File::create(path)
                .with_context(|| format!("failed to create output file {path}"))?;
            write_count_rows(file, rows)
        }
        None => write_count_rows(std::io::stdout().lock(), rows),
    }
}

/// Serializes a value as pretty-printed JSON with a trailing newline.
pub fn write_json<W: Write>(mut writer: W, value: &impl Serialize) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Writes a value as pretty-printed JSON to the given path.
pub fn write_json_file(path: &str, value: &impl Serialize) -> Result<()> {
    debug!(path, "Writing JSON");
    let file =
        File::create(path).with_context(|| format!("failed to create output file {path}"))?;
    write_json(file, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::ResolutionSnapshot;
    use std::env;
    use std::fs;

    fn temp_path(name: &str) -> String {
        format!("{}/{}", env::temp_dir().display(), name)
    }

    fn sample_rows() -> Vec<CountRow> {
        vec![
            CountRow {
                category: "Heat".into(),
                region: "QUEENS".into(),
                count: 1,
            },
            CountRow {
                category: "Noise".into(),
                region: "BRONX".into(),
                count: 2,
            },
        ]
    }

    #[test]
    fn test_count_csv_header_and_rows() {
        let mut buf = Vec::new();
        write_count_rows(&mut buf, &sample_rows()).unwrap();

        let content = String::from_utf8(buf).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "complaint type,borough,count");
        assert_eq!(lines[1], "Heat,QUEENS,1");
        assert_eq!(lines[2], "Noise,BRONX,2");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_count_csv_empty_rows_still_writes_header() {
        let mut buf = Vec::new();
        write_count_rows(&mut buf, &[]).unwrap();

        let content = String::from_utf8(buf).unwrap();
        assert_eq!(content.trim(), "complaint type,borough,count");
    }

    #[test]
    fn test_write_count_output_to_file() {
        let path = temp_path("complaints_analyzer_test_counts.csv");
        let _ = fs::remove_file(&path);

        write_count_output(Some(&path), &sample_rows()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("complaint type,borough,count"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_json_round_trip() {
        let path = temp_path("complaints_analyzer_test_snapshot.json");
        let _ = fs::remove_file(&path);

        let mut snapshot = ResolutionSnapshot::default();
        snapshot.overall.insert("2024-01".into(), 36.5);

        write_json_file(&path, &snapshot).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let parsed: ResolutionSnapshot = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, snapshot);

        fs::remove_file(&path).unwrap();
    }
}
