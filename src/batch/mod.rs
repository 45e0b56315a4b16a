//! 批次规划模块：在 Token 预算与单请求提示数上限内确定每批提交的提示数量。
//!
//! # Batch Planning Module
//!
//! Candidate texts are rendered into prompts and packed into batches that fit
//! the per-minute token budget and the service's prompts-per-request cap.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`PromptTemplate`] | Fixed classification template a candidate is embedded into |
//! | [`Prompt`] | A rendered prompt tagged with its original sequence index |
//! | [`Batch`] | One request-sized, ordered group of prompts |
//! | [`BatchPlanner`] | Computes how many remaining prompts fit in the next batch |
//!
//! ## Example
//!
//! ```rust
//! use post_screener::batch::{BatchPlanner, PlannerConfig, Prompt, PromptTemplate};
//! use post_screener::tokens::CharacterEstimator;
//!
//! let counter = CharacterEstimator::new();
//! let template = PromptTemplate::new("Is this post about crypto? Answer yes or no.\n\n{text}");
//! let prompts: Vec<Prompt> = ["btc pump", "nice weather"]
//!     .iter()
//!     .enumerate()
//!     .map(|(i, t)| Prompt::render(i, t, &template, &counter))
//!     .collect();
//!
//! let planner = BatchPlanner::new(PlannerConfig::new().with_token_budget(1_000));
//! assert_eq!(planner.plan(&prompts, template.fixed_cost(&counter)), 2);
//! ```

mod planner;
mod prompt;

pub use planner::{plan_batch_size, BatchPlanner, PlannerConfig};
pub use prompt::{Batch, Prompt, PromptTemplate, TEXT_PLACEHOLDER};
