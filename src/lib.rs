//! # post-screener
//!
//! 社交媒体帖子筛选器：按查询收集帖子，经限流批量分类后输出入选记录。
//!
//! Collects social-media posts matching a list of queries, asks a text
//! completion model whether each post is relevant, and writes the accepted
//! posts as CSV.
//!
//! ## Overview
//!
//! The heart of the crate is a rate-limited batch classification scheduler.
//! It packs candidate texts into batches that fit a per-minute token budget,
//! submits them one at a time, reconciles out-of-order and partial responses
//! back onto the input order, and replays a batch after a cooldown when the
//! service reports a rate limit.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use post_screener::config::ScreenerConfig;
//! use post_screener::runner::Screener;
//! use post_screener::sink::CsvSink;
//! use post_screener::source::JsonlSource;
//! use post_screener::transport::HttpCompletionService;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> post_screener::Result<()> {
//!     let config = ScreenerConfig::load(None)?;
//!     let service = HttpCompletionService::new(config.classifier.base_url.clone(), None)?;
//!     let scheduler = config.build_scheduler(Arc::new(service))?;
//!
//!     let mut source = JsonlSource::open("posts.jsonl", 100).await?;
//!     let mut screener =
//!         Screener::new(scheduler).with_sink(Box::new(CsvSink::new("accepted.csv")));
//!     let summary = screener.run(&mut source).await?;
//!     println!("accepted {} of {}", summary.accepted, summary.candidates);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`tokens`] | Token cost estimation |
//! | [`batch`] | Prompt rendering and batch sizing |
//! | [`client`] | Classification client, completion service contract, predicates |
//! | [`transport`] | HTTP completion service and credential lookup |
//! | [`resilience`] | Rate-limit cooldown and replay |
//! | [`scheduler`] | Sequential batch loop with inter-batch pacing |
//! | [`reducer`] | Pairs verdicts with records, keeps the accepted ones |
//! | [`source`] | Post sources (recent search, JSONL) |
//! | [`sink`] | Record sinks (CSV, JSONL) |
//! | [`runner`] | End-to-end screening with periodic flushes |
//! | [`config`] | Layered configuration |

pub mod batch;
pub mod client;
pub mod config;
pub mod reducer;
pub mod resilience;
pub mod runner;
pub mod scheduler;
pub mod sink;
pub mod source;
pub mod tokens;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use client::{Classifier, ClassifyOutcome, CompletionService};
pub use config::ScreenerConfig;
pub use runner::{RunSummary, Screener};
pub use scheduler::{Scheduler, SchedulerConfig};
pub use types::{AcceptedRecord, CandidateText, SourceRecord, Verdict};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
