use super::RecordSink;
use crate::types::AcceptedRecord;
use crate::Result;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Writes accepted records as CSV with a header row.
///
/// The header is the union of all record keys in first-seen order. Strings are
/// written as-is, `null` and missing fields as empty cells, and any other JSON
/// value in its compact JSON form.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn header(records: &[AcceptedRecord]) -> Vec<&str> {
        let mut header: Vec<&str> = Vec::new();
        for record in records {
            for key in record.fields().keys() {
                if !header.contains(&key.as_str()) {
                    header.push(key.as_str());
                }
            }
        }
        header
    }

    fn cell(value: Option<&Value>) -> String {
        match value {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

impl RecordSink for CsvSink {
    fn write_all(&mut self, records: &[AcceptedRecord]) -> Result<()> {
        let mut writer = csv::Writer::from_path(&self.path)?;
        let header = Self::header(records);
        if !header.is_empty() {
            writer.write_record(&header)?;
        }
        for record in records {
            let row = header.iter().map(|k| Self::cell(record.fields().get(*k)));
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "csv"
    }
}
