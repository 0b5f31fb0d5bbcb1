//! Incremental CSV output writer
//!
//! Each resolved entity becomes one CSV file under a hierarchical
//! output directory keyed by its position in the crawl:
//!
//! ```text
//! {year}/{country}/{state}/{event_id}/event.csv
//! {year}/{country}/{state}/{event_id}/{race_type}/{race_id}/race.csv
//! {year}/{country}/{state}/{event_id}/{race_type}/{race_id}/results.csv
//! ```
//!
//! Intermediate directories are created on demand and existing files
//! are overwritten unconditionally: re-running a crawl re-writes every
//! file it reaches (at-least-once output semantics).

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::types::{value_to_cell, Record, SearchKey};

/// File name for an event record.
pub const EVENT_FILE: &str = "event.csv";
/// File name for a race metadata record.
pub const RACE_FILE: &str = "race.csv";
/// File name for a race results table.
pub const RESULTS_FILE: &str = "results.csv";

/// Writes entity records as CSV files under an output root.
pub struct CsvExporter {
    root: PathBuf,
}

impl CsvExporter {
    /// Create an exporter rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The output root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for one event, relative to the root.
    pub fn event_dir(&self, search: &SearchKey, event_id: &str) -> PathBuf {
        [
            sanitize_component(&search.year.to_string()),
            sanitize_component(&search.country_id),
            sanitize_component(&search.state_id),
            sanitize_component(event_id),
        ]
        .iter()
        .collect()
    }

    /// Directory for one race, relative to the root.
    pub fn race_dir(
        &self,
        search: &SearchKey,
        event_id: &str,
        race_type: &str,
        race_id: &str,
    ) -> PathBuf {
        let mut dir = self.event_dir(search, event_id);
        dir.push(sanitize_component(race_type));
        dir.push(sanitize_component(race_id));
        dir
    }

    /// Write a single record as a one-row CSV file.
    ///
    /// The header row is the record's own field order.
    pub fn write_record(
        &self,
        rel_dir: &Path,
        file_name: &str,
        record: &Record,
    ) -> Result<PathBuf> {
        let headers: Vec<String> = record.keys().cloned().collect();
        self.write_records(rel_dir, file_name, &headers, std::slice::from_ref(record))
    }

    /// Write a batch of records as a CSV file.
    ///
    /// # Arguments
    /// * `rel_dir` - Directory relative to the output root
    /// * `file_name` - File name within that directory
    /// * `headers` - Field list producing the header row and the
    ///   column order of every data row
    /// * `records` - One row each; a field absent from a record
    ///   renders as an empty cell
    ///
    /// Creates intermediate directories idempotently and overwrites
    /// any existing file at the path.
    pub fn write_records(
        &self,
        rel_dir: &Path,
        file_name: &str,
        headers: &[String],
        records: &[Record],
    ) -> Result<PathBuf> {
        let dir = self.root.join(rel_dir);
        fs::create_dir_all(&dir)?;

        let path = dir.join(file_name);
        let mut writer = BufWriter::new(File::create(&path)?);

        write_row(&mut writer, headers.iter().map(String::as_str))?;
        for record in records {
            let cells: Vec<String> = headers
                .iter()
                .map(|h| record.get(h).map(value_to_cell).unwrap_or_default())
                .collect();
            write_row(&mut writer, cells.iter().map(String::as_str))?;
        }

        writer.flush()?;
        Ok(path)
    }
}

/// Reduce a path component to a safe filename alphabet.
///
/// Site-supplied values (race types, ids) can carry spaces, slashes or
/// other separator characters; everything outside `[A-Za-z0-9._-]`
/// becomes an underscore. An empty component stays addressable as `_`.
fn sanitize_component(component: &str) -> String {
    let sanitized: String = component
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() {
        "_".to_string()
    } else {
        sanitized
    }
}

fn needs_quotes(cell: &str) -> bool {
    cell.contains(',') || cell.contains('"') || cell.contains('\n') || cell.contains('\r')
}

/// Write a single CSV row with RFC-4180-style quoting.
fn write_row<'a, W: Write>(writer: &mut W, cells: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut first = true;
    for cell in cells {
        if !first {
            write!(writer, ",")?;
        }
        first = false;

        if needs_quotes(cell) {
            write!(writer, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            write!(writer, "{}", cell)?;
        }
    }
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().expect("object literal")
    }

    fn search_key() -> SearchKey {
        SearchKey {
            year: 2021,
            race_type_id: "1".to_string(),
            country_id: "840".to_string(),
            state_id: "CA".to_string(),
        }
    }

    #[test]
    fn test_event_dir_layout() {
        let exporter = CsvExporter::new("/tmp/out");
        let dir = exporter.event_dir(&search_key(), "100");
        assert_eq!(dir, PathBuf::from("2021/840/CA/100"));
    }

    #[test]
    fn test_race_dir_layout() {
        let exporter = CsvExporter::new("/tmp/out");
        let dir = exporter.race_dir(&search_key(), "100", "Triathlon", "55");
        assert_eq!(dir, PathBuf::from("2021/840/CA/100/Triathlon/55"));
    }

    #[test]
    fn test_write_record_headers_from_field_order() {
        let tmp = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new(tmp.path());

        let path = exporter
            .write_record(
                Path::new("2021/840/CA/100"),
                EVENT_FILE,
                &record(json!({"EventId": "100", "EventName": "Spring Sprint", "Fee": 25})),
            )
            .unwrap();

        let contents = fs::read_to_string(path).unwrap();
        assert_eq!(contents, "EventId,EventName,Fee\n100,Spring Sprint,25\n");
    }

    #[test]
    fn test_write_records_missing_fields_are_empty_cells() {
        let tmp = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new(tmp.path());

        let headers = vec!["Name".to_string(), "Time".to_string()];
        let rows = vec![
            record(json!({"Name": "Jane", "Time": "01:02:03"})),
            record(json!({"Name": "Ada"})),
        ];

        let path = exporter
            .write_records(Path::new("r"), RESULTS_FILE, &headers, &rows)
            .unwrap();

        let contents = fs::read_to_string(path).unwrap();
        assert_eq!(contents, "Name,Time\nJane,01:02:03\nAda,\n");
    }

    #[test]
    fn test_second_write_wins() {
        let tmp = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new(tmp.path());
        let dir = Path::new("2021/840/CA/100");

        exporter
            .write_record(dir, EVENT_FILE, &record(json!({"EventId": "first"})))
            .unwrap();
        let path = exporter
            .write_record(dir, EVENT_FILE, &record(json!({"EventId": "second"})))
            .unwrap();

        let contents = fs::read_to_string(path).unwrap();
        assert_eq!(contents, "EventId\nsecond\n");
    }

    #[test]
    fn test_quoting() {
        let tmp = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new(tmp.path());

        let path = exporter
            .write_record(
                Path::new("q"),
                RACE_FILE,
                &record(json!({
                    "Name": "Run, swim",
                    "Note": "said \"go\"",
                })),
            )
            .unwrap();

        let contents = fs::read_to_string(path).unwrap();
        assert_eq!(contents, "Name,Note\n\"Run, swim\",\"said \"\"go\"\"\"\n");
    }

    #[test]
    fn test_sanitize_component() {
        assert_eq!(sanitize_component("Triathlon"), "Triathlon");
        assert_eq!(sanitize_component("Open Water"), "Open_Water");
        assert_eq!(sanitize_component("a/b\\c"), "a_b_c");
        assert_eq!(sanitize_component(""), "_");
    }

    #[test]
    fn test_nested_numbers_render_as_json() {
        let tmp = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new(tmp.path());

        let path = exporter
            .write_record(
                Path::new("n"),
                RACE_FILE,
                &record(json!({"Splits": ["10:00", "12:30"], "Rank": null})),
            )
            .unwrap();

        let contents = fs::read_to_string(path).unwrap();
        assert_eq!(contents, "Splits,Rank\n\"[\"\"10:00\"\",\"\"12:30\"\"]\",\n");
    }
}
