//! 输出模块：将累计的入选记录整体覆盖写出为表格文件。
//!
//! # Record Sink Module
//!
//! Sinks receive the *whole* accumulated list of accepted records on every
//! flush and overwrite their destination; they never append.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`RecordSink`] | Trait for flush destinations |
//! | [`CsvSink`] | Delimited file with a header row |
//! | [`JsonlSink`] | One JSON object per line |
//! | [`MemorySink`] | Keeps every flushed snapshot, for testing |

mod csv;
mod jsonl;

pub use self::csv::CsvSink;
pub use self::jsonl::JsonlSink;

use crate::types::AcceptedRecord;
use crate::Result;
use std::sync::{Arc, Mutex};

pub trait RecordSink: Send {
    /// Replace the destination's contents with `records`.
    fn write_all(&mut self, records: &[AcceptedRecord]) -> Result<()>;

    fn name(&self) -> &str;
}

/// In-memory sink for testing. Clones share the same snapshot list.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    snapshots: Arc<Mutex<Vec<Vec<AcceptedRecord>>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every flushed snapshot, oldest first.
    pub fn snapshots(&self) -> Vec<Vec<AcceptedRecord>> {
        self.snapshots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn latest(&self) -> Option<Vec<AcceptedRecord>> {
        self.snapshots().pop()
    }
}

impl RecordSink for MemorySink {
    fn write_all(&mut self, records: &[AcceptedRecord]) -> Result<()> {
        // a panicking reader cannot corrupt a Vec push; keep recording
        self.snapshots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(records.to_vec());
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
