//! Classification verdicts.

use serde::Serialize;

/// Outcome for exactly one prompt of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub accepted: bool,
    pub raw_text: String,
}

impl Verdict {
    pub fn new(accepted: bool, raw_text: impl Into<String>) -> Self {
        Self {
            accepted,
            raw_text: raw_text.into(),
        }
    }

    /// Verdict for a prompt the service did not answer. Always rejected.
    pub fn missing() -> Self {
        Self::default()
    }

    pub fn is_missing(&self) -> bool {
        self.raw_text.is_empty()
    }
}
