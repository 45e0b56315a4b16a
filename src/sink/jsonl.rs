use super::RecordSink;
use crate::types::AcceptedRecord;
use crate::Result;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes accepted records as newline-delimited JSON.
#[derive(Debug, Clone)]
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSink for JsonlSink {
    fn write_all(&mut self, records: &[AcceptedRecord]) -> Result<()> {
        let mut out = BufWriter::new(File::create(&self.path)?);
        for record in records {
            serde_json::to_writer(&mut out, record)?;
            out.write_all(b"\n")?;
        }
        out.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "jsonl"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_one_object_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");
        let mut sink = JsonlSink::new(&path);
        let record = AcceptedRecord::new(json!({"id": "9"}).as_object().cloned().unwrap(), "yes");
        sink.write_all(&[record.clone(), record]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "{\"id\":\"9\",\"classifier_response\":\"yes\"}\n\
             {\"id\":\"9\",\"classifier_response\":\"yes\"}\n"
        );
    }
}
