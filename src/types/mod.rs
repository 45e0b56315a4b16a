//! 类型模块：候选文本、判定结果与入选记录等核心数据类型。
//!
//! # Types Module
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SourceRecord`] | Raw post as produced by a post source (JSON object) |
//! | [`CandidateText`] | The text to classify plus its originating record |
//! | [`Verdict`] | Accept/reject outcome and raw model text for one candidate |
//! | [`AcceptedRecord`] | Source record augmented with the verdict text |

pub mod record;
pub mod verdict;

pub use record::{AcceptedRecord, CandidateText, SourceRecord, TEXT_FIELD, VERDICT_FIELD};
pub use verdict::Verdict;
