//! Batch classification against a completion service.

use crate::batch::Batch;
use crate::client::predicate::{AcceptancePredicate, AffirmativeMarker};
use crate::client::service::{
    Choice, CompletionOutcome, CompletionRequest, CompletionService, GenerationParams,
};
use crate::types::Verdict;
use crate::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo-instruct";

/// Outcome of classifying one batch. Rate limiting is a value here, not an
/// error; [`crate::resilience::RateLimitRecovery`] decides what to do with it.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifyOutcome {
    /// One verdict per prompt, in batch order.
    Verdicts(Vec<Verdict>),
    RateLimited { retry_after: Option<Duration> },
}

pub struct Classifier {
    service: Arc<dyn CompletionService>,
    predicate: Arc<dyn AcceptancePredicate>,
    model: String,
    params: GenerationParams,
}

impl Classifier {
    pub fn new(service: Arc<dyn CompletionService>) -> Self {
        Self {
            service,
            predicate: Arc::new(AffirmativeMarker::default()),
            model: DEFAULT_MODEL.to_string(),
            params: GenerationParams::default(),
        }
    }

    pub fn with_predicate(mut self, predicate: Arc<dyn AcceptancePredicate>) -> Self {
        self.predicate = predicate;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Submit every prompt of `batch` as one request and return verdicts
    /// aligned with the batch order.
    pub async fn classify(&self, batch: Batch<'_>) -> Result<ClassifyOutcome> {
        if batch.is_empty() {
            return Ok(ClassifyOutcome::Verdicts(Vec::new()));
        }

        let request = CompletionRequest {
            model: self.model.clone(),
            prompts: batch.texts(),
            params: self.params.clone(),
        };

        match self.service.complete(&request).await? {
            CompletionOutcome::RateLimited { retry_after } => {
                Ok(ClassifyOutcome::RateLimited { retry_after })
            }
            CompletionOutcome::Choices(choices) => {
                debug!(
                    batch_len = batch.len(),
                    choices = choices.len(),
                    "received completion choices"
                );
                let verdicts = reconcile_choices(batch.len(), choices)
                    .into_iter()
                    .map(|text| self.judge(text))
                    .collect();
                Ok(ClassifyOutcome::Verdicts(verdicts))
            }
        }
    }

    /// Empty text means the prompt went unanswered and is rejected regardless
    /// of the predicate.
    pub fn judge(&self, text: String) -> Verdict {
        if text.is_empty() {
            return Verdict::missing();
        }
        let accepted = self.predicate.accepts(&text);
        Verdict::new(accepted, text)
    }
}

/// Place each choice's text at its prompt index in a `batch_len` sequence of
/// empty strings.
///
/// Without per-choice indices, request order is trusted only when the choice
/// count equals `batch_len`; otherwise every slot stays empty.
pub fn reconcile_choices(batch_len: usize, choices: Vec<Choice>) -> Vec<String> {
    let mut slots = vec![String::new(); batch_len];

    if choices.iter().all(|c| c.index.is_none()) {
        if choices.len() == batch_len {
            for (slot, choice) in slots.iter_mut().zip(choices) {
                *slot = choice.text;
            }
        } else if !choices.is_empty() {
            warn!(
                batch_len,
                choices = choices.len(),
                "unindexed response count differs from batch size; discarding response"
            );
        }
        return slots;
    }

    let mut filled = vec![false; batch_len];
    for choice in choices {
        match choice.index {
            Some(i) if i < batch_len => {
                if !filled[i] {
                    filled[i] = true;
                    slots[i] = choice.text;
                } else {
                    warn!(index = i, "duplicate choice index; keeping first");
                }
            }
            Some(i) => warn!(index = i, batch_len, "choice index out of range"),
            None => warn!("unindexed choice in indexed response; dropping"),
        }
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconcile_out_of_order() {
        let slots = reconcile_choices(
            3,
            vec![
                Choice::new(2, "c"),
                Choice::new(0, "a"),
                Choice::new(1, "b"),
            ],
        );
        assert_eq!(slots, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_reconcile_partial_leaves_empty() {
        let slots = reconcile_choices(3, vec![Choice::new(2, "c")]);
        assert_eq!(slots, vec!["", "", "c"]);
    }

    #[test]
    fn test_reconcile_out_of_range_dropped() {
        let slots = reconcile_choices(2, vec![Choice::new(5, "x"), Choice::new(1, "b")]);
        assert_eq!(slots, vec!["", "b"]);
    }

    #[test]
    fn test_reconcile_duplicate_keeps_first() {
        let slots = reconcile_choices(1, vec![Choice::new(0, "first"), Choice::new(0, "second")]);
        assert_eq!(slots, vec!["first"]);
    }

    #[test]
    fn test_reconcile_empty_first_answer_is_not_overwritten() {
        let slots = reconcile_choices(2, vec![Choice::new(0, ""), Choice::new(0, "yes")]);
        assert_eq!(slots, vec!["", ""]);
    }

    #[test]
    fn test_reconcile_unindexed_trusts_order_on_full_count() {
        let slots = reconcile_choices(
            2,
            vec![Choice::unindexed("a"), Choice::unindexed("b")],
        );
        assert_eq!(slots, vec!["a", "b"]);
    }

    #[test]
    fn test_reconcile_unindexed_short_count_fails_closed() {
        let slots = reconcile_choices(3, vec![Choice::unindexed("a")]);
        assert_eq!(slots, vec!["", "", ""]);
    }

    #[test]
    fn test_reconcile_empty_batch() {
        assert!(reconcile_choices(0, vec![]).is_empty());
    }
}
