//! 帖子来源模块：按查询分页拉取原始帖子记录。
//!
//! # Post Source Module
//!
//! A post source yields pages of raw records. The stream is finite and cannot
//! be restarted; the runner consumes each page as soon as it arrives.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`PostSource`] | Page-at-a-time source trait |
//! | [`RecentSearchSource`] | Recent-search HTTP API, one query after another |
//! | [`JsonlSource`] | Newline-delimited JSON records from a file or reader |

mod jsonl;
mod search;

pub use jsonl::JsonlSource;
pub use search::{RecentSearchSource, SearchParams, DEFAULT_SEARCH_URL};

use crate::types::SourceRecord;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait PostSource: Send {
    /// Next page of records, or `None` once the source is exhausted.
    async fn next_page(&mut self) -> Result<Option<Vec<SourceRecord>>>;
}
