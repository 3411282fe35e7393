//! CSV table output.
//!
//! Records do not have to share a field set. The header is the union of all
//! keys in first-seen order (row by row, key by key) and a row that lacks a
//! column gets an empty cell there.
//!
//! Cell rendering:
//!
//! | JSON value | Cell |
//! |------------|------|
//! | string | the string, unquoted |
//! | `null` or missing | empty |
//! | number, bool | JSON text (`1`, `0.5`, `true`) |
//! | array, object | compact JSON |

use crate::models::ExtractedRecord;
use crate::utils::parent_dir;
use itertools::Itertools;
use serde_json::Value;
use std::error::Error;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Destination for the final row set.
pub trait RowSink {
    fn write_rows(&mut self, rows: &[ExtractedRecord]) -> Result<(), Box<dyn Error>>;
}

/// Writes rows to a CSV file, replacing any previous contents.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RowSink for CsvSink {
    #[instrument(level = "info", skip_all, fields(path = %self.path.display(), rows = rows.len()))]
    fn write_rows(&mut self, rows: &[ExtractedRecord]) -> Result<(), Box<dyn Error>> {
        fs::create_dir_all(parent_dir(&self.path))?;
        let file = File::create(&self.path)?;
        write_table(file, rows)?;
        info!("Wrote CSV table");
        Ok(())
    }
}

/// Union of all record keys in first-seen order.
pub fn columns(rows: &[ExtractedRecord]) -> Vec<&str> {
    rows.iter()
        .flat_map(|r| r.fields().keys().map(String::as_str))
        .unique()
        .collect()
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Write `rows` as CSV with a header line.
///
/// The header is [`columns`]; a row without a given column gets an empty
/// cell there. No rows writes nothing.
///
/// # Errors
///
/// Returns the underlying [`csv::Error`](::csv::Error) when the writer fails.
pub fn write_table<W: io::Write>(writer: W, rows: &[ExtractedRecord]) -> Result<(), ::csv::Error> {
    let columns = columns(rows);
    let mut wtr = ::csv::Writer::from_writer(writer);
    if columns.is_empty() {
        wtr.flush()?;
        return Ok(());
    }

    wtr.write_record(&columns)?;
    for row in rows {
        wtr.write_record(columns.iter().map(|c| cell(row.get(c))))?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> ExtractedRecord {
        match value {
            Value::Object(map) => ExtractedRecord::from_fields(map),
            other => panic!("expected object, got {other}"),
        }
    }

    fn render(rows: &[ExtractedRecord]) -> String {
        let mut buf = Vec::new();
        write_table(&mut buf, rows).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_uniform_rows() {
        let rows = vec![
            record(json!({
                "company_name": "Acme",
                "category": "ai",
                "sentiment_score": 1,
                "is_funding_news": true,
                "source": "Example News",
                "published": "2025-05-06T14:30:00Z",
                "url": "https://news.example.com/acme"
            })),
            record(json!({
                "company_name": "Globex, Inc.",
                "category": "robotics",
                "sentiment_score": -0.5,
                "is_funding_news": false,
                "source": "Wire",
                "published": "",
                "url": "https://wire.example.com/globex"
            })),
        ];

        assert_eq!(
            render(&rows),
            "company_name,category,sentiment_score,is_funding_news,source,published,url\n\
             Acme,ai,1,true,Example News,2025-05-06T14:30:00Z,https://news.example.com/acme\n\
             \"Globex, Inc.\",robotics,-0.5,false,Wire,,https://wire.example.com/globex\n"
        );
    }

    #[test]
    fn test_differing_field_sets_merge_columns() {
        let rows = vec![
            record(json!({"company_name": "Acme", "url": "u1"})),
            record(json!({"category": "ai", "url": "u2", "extra": [1, 2]})),
        ];

        assert_eq!(columns(&rows), vec!["company_name", "url", "category", "extra"]);
        assert_eq!(
            render(&rows),
            "company_name,url,category,extra\n\
             Acme,u1,,\n\
             ,u2,ai,\"[1,2]\"\n"
        );
    }

    #[test]
    fn test_null_values_are_blank() {
        let rows = vec![record(json!({"company_name": null, "category": "ai"}))];
        assert_eq!(render(&rows), "company_name,category\n,ai\n");
    }

    #[test]
    fn test_no_rows_writes_nothing() {
        assert_eq!(render(&[]), "");
    }

    #[test]
    fn test_csv_sink_creates_parent_dirs() {
        let dir = std::env::temp_dir().join(format!("ai_startup_news_csv_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        let path = dir.join("nested").join("out.csv");

        let mut sink = CsvSink::new(&path);
        sink.write_rows(&[record(json!({"company_name": "Acme"}))])
            .unwrap();

        assert_eq!(sink.path(), path.as_path());
        assert_eq!(fs::read_to_string(&path).unwrap(), "company_name\nAcme\n");
        let _ = fs::remove_dir_all(&dir);
    }
}
