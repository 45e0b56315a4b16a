//! 弹性模块：限流拒绝后的冷却与整批重放。
//!
//! # Rate-Limit Recovery Module
//!
//! The completion service enforces its limits over a 60 second budget window.
//! When it rejects a batch for rate reasons, the batch is replayed unchanged
//! after a cooldown that outlasts that window, so the limiter has reset by
//! the time the replay lands.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`RecoveryConfig`] | Cooldown length and optional attempt bound |
//! | [`RateLimitRecovery`] | Cooldown-and-replay wrapper around a classify call |
//!
//! Only [`ClassifyOutcome::RateLimited`](crate::client::ClassifyOutcome) is
//! retried. Every error propagates on first occurrence.
//!
//! ```rust
//! use post_screener::resilience::{RateLimitRecovery, RecoveryConfig};
//! use std::time::Duration;
//!
//! let recovery = RateLimitRecovery::new(RecoveryConfig::new());
//! assert_eq!(recovery.cooldown_for(None), Duration::from_secs(61));
//! assert_eq!(recovery.cooldown_for(Some(Duration::from_secs(90))), Duration::from_secs(90));
//! ```

pub mod recovery;

pub use recovery::{RateLimitRecovery, RecoveryConfig, BUDGET_WINDOW, DEFAULT_COOLDOWN};
