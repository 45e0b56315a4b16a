//! Token 估算模块：以字符数近似 Token 开销，用于批次预算规划。
//!
//! # Token Estimation Module
//!
//! Batch sizing only needs an upper-bound-ish guess of request cost, never the
//! provider's real tokenizer. This module provides that guess.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`TokenCounter`] | Trait for token estimation implementations |
//! | [`CharacterEstimator`] | Character-based approximation (4 chars ≈ 1 token) |
//!
//! ## Example
//!
//! ```rust
//! use post_screener::tokens::{CharacterEstimator, TokenCounter};
//!
//! let counter = CharacterEstimator::new();
//! assert_eq!(counter.count("btc pump"), 2);
//! assert_eq!(counter.count(""), 0);
//! ```

mod counter;

pub use counter::{estimate, CharacterEstimator, TokenCounter};
