use crate::batch::Batch;
use crate::client::{Classifier, ClassifyOutcome};
use crate::types::Verdict;
use crate::{Error, ErrorContext, Result};
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// Interval over which the service's token/request ceiling is enforced.
pub const BUDGET_WINDOW: Duration = Duration::from_secs(60);

/// Default cooldown: one second past the budget window.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(61);

#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    /// Pause before replaying a rejected batch. Must exceed [`BUDGET_WINDOW`].
    pub cooldown: Duration,
    /// Total attempts allowed per batch. `None` retries until admitted.
    ///
    /// With a bound, a batch still rejected on its last attempt fails the run
    /// with [`Error::RateLimitExhausted`] and its verdicts are lost.
    pub max_attempts: Option<u32>,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            cooldown: DEFAULT_COOLDOWN,
            max_attempts: None,
        }
    }
}

impl RecoveryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = Some(max.max(1));
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.cooldown <= BUDGET_WINDOW {
            return Err(Error::validation_with_context(
                "rate-limit cooldown must exceed the 60s budget window",
                ErrorContext::new()
                    .with_field_path("recovery.cooldown_secs")
                    .with_details(format!("got {}s", self.cooldown.as_secs_f64())),
            ));
        }
        Ok(())
    }
}

pub struct RateLimitRecovery {
    config: RecoveryConfig,
}

impl RateLimitRecovery {
    pub fn new(config: RecoveryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RecoveryConfig {
        &self.config
    }

    /// Wait before the next replay: the configured cooldown, stretched to the
    /// service's `Retry-After` hint when that is longer.
    pub fn cooldown_for(&self, retry_after: Option<Duration>) -> Duration {
        match retry_after {
            Some(hint) => hint.max(self.config.cooldown),
            None => self.config.cooldown,
        }
    }

    /// Classify `batch`, replaying it after each rate-limit rejection.
    pub async fn classify(
        &self,
        classifier: &Classifier,
        batch: Batch<'_>,
    ) -> Result<Vec<Verdict>> {
        let first_index = batch.first_index().unwrap_or(0);
        self.replay(batch.len(), first_index, move || classifier.classify(batch))
            .await
    }

    /// Drive `attempt` until it yields verdicts. Each call must re-issue the
    /// identical request.
    pub async fn replay<F, Fut>(
        &self,
        batch_len: usize,
        first_index: usize,
        mut attempt: F,
    ) -> Result<Vec<Verdict>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<ClassifyOutcome>>,
    {
        let mut attempts = 0u32;
        loop {
            attempts = attempts.saturating_add(1);
            match attempt().await? {
                ClassifyOutcome::Verdicts(verdicts) => {
                    if attempts > 1 {
                        info!(attempts, batch_len, first_index, "batch admitted after replay");
                    }
                    return Ok(verdicts);
                }
                ClassifyOutcome::RateLimited { retry_after } => {
                    if let Some(max) = self.config.max_attempts {
                        if attempts >= max {
                            return Err(Error::RateLimitExhausted {
                                attempts,
                                batch_len,
                            });
                        }
                    }
                    let wait = self.cooldown_for(retry_after);
                    warn!(
                        attempt = attempts,
                        batch_len,
                        first_index,
                        cooldown_secs = wait.as_secs_f64(),
                        "rate limited; cooling down before replaying batch"
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}
