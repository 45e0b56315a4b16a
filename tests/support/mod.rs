//! Shared fixtures for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use post_screener::batch::PromptTemplate;
use post_screener::client::{
    Choice, Classifier, CompletionOutcome, CompletionRequest, CompletionService,
};
use post_screener::resilience::{RateLimitRecovery, RecoveryConfig};
use post_screener::scheduler::{Scheduler, SchedulerConfig};
use post_screener::Result;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scripted completion service.
///
/// Answers "Yes - on topic" for prompts containing one of its keywords and
/// "No - off topic" otherwise. Choices come back in reverse order so every
/// call exercises index reconciliation.
pub struct KeywordService {
    keywords: Vec<String>,
    pending_rate_limits: Mutex<usize>,
    retry_after: Option<Duration>,
    dropped: Vec<String>,
    calls: Mutex<Vec<CompletionRequest>>,
}

impl KeywordService {
    pub fn new(keywords: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            pending_rate_limits: Mutex::new(0),
            retry_after: None,
            dropped: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Reject the first `n` calls as rate limited.
    pub fn rate_limit_first(self, n: usize) -> Self {
        *self.pending_rate_limits.lock().unwrap() = n;
        self
    }

    pub fn with_retry_after(mut self, d: Duration) -> Self {
        self.retry_after = Some(d);
        self
    }

    /// Leave prompts containing `needle` unanswered.
    pub fn drop_prompts_containing(mut self, needle: &str) -> Self {
        self.dropped.push(needle.to_string());
        self
    }

    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.calls().iter().map(|c| c.prompts.len()).collect()
    }

    fn answer(&self, prompt: &str) -> &'static str {
        if self.keywords.iter().any(|k| prompt.contains(k.as_str())) {
            "Yes - on topic"
        } else {
            "No - off topic"
        }
    }
}

#[async_trait]
impl CompletionService for KeywordService {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionOutcome> {
        self.calls.lock().unwrap().push(request.clone());

        {
            let mut pending = self.pending_rate_limits.lock().unwrap();
            if *pending > 0 {
                *pending -= 1;
                return Ok(CompletionOutcome::RateLimited {
                    retry_after: self.retry_after,
                });
            }
        }

        let choices = request
            .prompts
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, p)| !self.dropped.iter().any(|d| p.contains(d.as_str())))
            .map(|(i, p)| Choice::new(i, self.answer(p)))
            .collect();
        Ok(CompletionOutcome::Choices(choices))
    }
}

/// Scheduler over `service` with a bare `{text}` template, so a prompt costs
/// exactly what its text costs.
pub fn scheduler(service: Arc<KeywordService>, config: SchedulerConfig) -> Scheduler {
    let classifier = Classifier::new(service);
    Scheduler::new(config, classifier, RateLimitRecovery::new(RecoveryConfig::new()))
}

pub fn bare_config() -> SchedulerConfig {
    SchedulerConfig::new(PromptTemplate::new("{text}"))
}
