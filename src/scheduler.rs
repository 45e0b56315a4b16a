//! 调度循环：按预算切分批次、顺序提交并在批次之间等待以满足每分钟请求上限。
//!
//! # Scheduler Loop
//!
//! Drives the [`BatchPlanner`], the [`Classifier`] and [`RateLimitRecovery`]
//! over a whole input sequence. Exactly one batch is in flight at a time; the
//! only suspensions are the inter-batch delay and the rate-limit cooldown.

use crate::batch::{Batch, BatchPlanner, PlannerConfig, Prompt, PromptTemplate};
use crate::client::Classifier;
use crate::resilience::{RateLimitRecovery, BUDGET_WINDOW};
use crate::tokens::{CharacterEstimator, TokenCounter};
use crate::types::{CandidateText, Verdict};
use crate::{Error, ErrorContext, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub template: PromptTemplate,
    pub token_budget: usize,
    pub requests_per_minute: u32,
    pub max_prompts_per_request: usize,
}

impl SchedulerConfig {
    pub fn new(template: PromptTemplate) -> Self {
        let planner = PlannerConfig::default();
        Self {
            template,
            token_budget: planner.token_budget,
            requests_per_minute: 20,
            max_prompts_per_request: planner.max_prompts_per_request,
        }
    }

    pub fn with_token_budget(mut self, b: usize) -> Self {
        self.token_budget = b;
        self
    }

    pub fn with_requests_per_minute(mut self, rpm: u32) -> Self {
        self.requests_per_minute = rpm;
        self
    }

    pub fn with_max_prompts_per_request(mut self, m: usize) -> Self {
        self.max_prompts_per_request = m;
        self
    }

    /// `60s / requests_per_minute`.
    pub fn inter_batch_delay(&self) -> Duration {
        BUDGET_WINDOW / self.requests_per_minute.max(1)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |field: &str, msg: &str| {
            Err(Error::validation_with_context(
                msg.to_string(),
                ErrorContext::new().with_field_path(field.to_string()),
            ))
        };
        if self.token_budget == 0 {
            return invalid("scheduler.token_budget", "token budget must be positive");
        }
        if self.requests_per_minute == 0 {
            return invalid(
                "scheduler.requests_per_minute",
                "requests per minute must be positive",
            );
        }
        if self.max_prompts_per_request == 0 {
            return invalid(
                "scheduler.max_prompts_per_request",
                "max prompts per request must be positive",
            );
        }
        Ok(())
    }

    fn planner_config(&self) -> PlannerConfig {
        PlannerConfig::new()
            .with_token_budget(self.token_budget)
            .with_max_prompts_per_request(self.max_prompts_per_request)
    }
}

pub struct Scheduler {
    config: SchedulerConfig,
    planner: BatchPlanner,
    classifier: Classifier,
    recovery: RateLimitRecovery,
    counter: Arc<dyn TokenCounter>,
}

impl Scheduler {
    pub fn new(
        config: SchedulerConfig,
        classifier: Classifier,
        recovery: RateLimitRecovery,
    ) -> Self {
        let planner = BatchPlanner::new(config.planner_config());
        Self {
            config,
            planner,
            classifier,
            recovery,
            counter: Arc::new(CharacterEstimator::new()),
        }
    }

    pub fn with_counter(mut self, counter: Arc<dyn TokenCounter>) -> Self {
        self.counter = counter;
        self
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Render candidate texts into index-tagged prompts.
    pub fn prepare<'a, I>(&self, texts: I) -> Vec<Prompt>
    where
        I: IntoIterator<Item = &'a str>,
    {
        texts
            .into_iter()
            .enumerate()
            .map(|(i, t)| Prompt::render(i, t, &self.config.template, self.counter.as_ref()))
            .collect()
    }

    /// Classify every candidate, returning verdicts in input order.
    pub async fn run_all(&self, candidates: &[CandidateText]) -> Result<Vec<Verdict>> {
        let prompts = self.prepare(candidates.iter().map(CandidateText::text));
        self.run_prompts(&prompts).await
    }

    /// Cursor loop over prepared prompts: plan, submit (through recovery),
    /// append, advance, and pause between batches.
    pub async fn run_prompts(&self, prompts: &[Prompt]) -> Result<Vec<Verdict>> {
        let fixed_cost = self.config.template.fixed_cost(self.counter.as_ref());
        let delay = self.config.inter_batch_delay();
        let mut verdicts = Vec::with_capacity(prompts.len());
        let mut cursor = 0usize;
        let mut batch_no = 0usize;

        while cursor < prompts.len() {
            let remaining = &prompts[cursor..];
            let count = self.planner.plan(remaining, fixed_cost);
            let batch = Batch::new(&remaining[..count]);
            batch_no += 1;

            info!(
                batch = batch_no,
                first_index = cursor,
                size = batch.len(),
                estimated_tokens = batch.estimated_tokens(fixed_cost),
                remaining = remaining.len(),
                "submitting batch"
            );

            let batch_verdicts = self.recovery.classify(&self.classifier, batch).await?;
            if batch_verdicts.len() != batch.len() {
                return Err(Error::LengthMismatch {
                    records: batch.len(),
                    verdicts: batch_verdicts.len(),
                });
            }
            verdicts.extend(batch_verdicts);
            cursor += batch.len();

            if cursor < prompts.len() {
                debug!(delay_ms = delay.as_millis() as u64, "pausing between batches");
                tokio::time::sleep(delay).await;
            }
        }

        Ok(verdicts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inter_batch_delay() {
        let c = SchedulerConfig::new(PromptTemplate::new("{text}")).with_requests_per_minute(20);
        assert_eq!(c.inter_batch_delay(), Duration::from_secs(3));
        let c = c.with_requests_per_minute(3_500);
        assert!(c.inter_batch_delay() < Duration::from_millis(18));
    }

    #[test]
    fn test_validate() {
        let base = SchedulerConfig::new(PromptTemplate::new("{text}"));
        assert!(base.validate().is_ok());
        assert!(base.clone().with_token_budget(0).validate().is_err());
        assert!(base.clone().with_requests_per_minute(0).validate().is_err());
        let err = base.with_max_prompts_per_request(0).validate().unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("scheduler.max_prompts_per_request")
        );
    }
}
