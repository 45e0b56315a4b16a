//! Post records flowing through the screener.

use serde::Serialize;
use serde_json::Value;

/// A raw post: an arbitrary JSON object with unique keys.
pub type SourceRecord = serde_json::Map<String, Value>;

/// Field holding the post body in records produced by the built-in sources.
pub const TEXT_FIELD: &str = "text";

/// Field under which the raw classifier response is merged into accepted records.
pub const VERDICT_FIELD: &str = "classifier_response";

/// Text to classify, paired with the record it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateText {
    text: String,
    record: SourceRecord,
}

impl CandidateText {
    pub fn new(text: impl Into<String>, record: SourceRecord) -> Self {
        Self {
            text: text.into(),
            record,
        }
    }

    /// Build a candidate from `record[field]`. Returns `None` when the field is
    /// missing or not a string.
    pub fn from_record(record: SourceRecord, field: &str) -> Option<Self> {
        let text = record.get(field)?.as_str()?.to_string();
        Some(Self { text, record })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn record(&self) -> &SourceRecord {
        &self.record
    }

    pub fn into_record(self) -> SourceRecord {
        self.record
    }
}

/// A record that passed classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AcceptedRecord(SourceRecord);

impl AcceptedRecord {
    /// Shallow-merge `raw_text` into `record` under [`VERDICT_FIELD`].
    /// An existing field of that name is overwritten.
    pub fn new(mut record: SourceRecord, raw_text: &str) -> Self {
        record.insert(VERDICT_FIELD.to_string(), Value::String(raw_text.to_string()));
        Self(record)
    }

    pub fn fields(&self) -> &SourceRecord {
        &self.0
    }

    pub fn verdict_text(&self) -> &str {
        self.0
            .get(VERDICT_FIELD)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn into_inner(self) -> SourceRecord {
        self.0
    }
}
