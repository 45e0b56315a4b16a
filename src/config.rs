//! 配置模块：YAML 文件、环境变量与命令行三层配置。
//!
//! # Configuration
//!
//! [`ScreenerConfig`] is layered: defaults, then an optional YAML file, then
//! `POST_SCREENER_*` environment variables, then CLI flags (applied by the
//! binary). Everything the scheduler needs is passed in explicitly from here;
//! nothing is read from globals afterwards.
//!
//! | Variable | Field |
//! |----------|-------|
//! | `POST_SCREENER_TOKEN_BUDGET` | `scheduler.token_budget` |
//! | `POST_SCREENER_RPM` | `scheduler.requests_per_minute` |
//! | `POST_SCREENER_MAX_PROMPTS` | `scheduler.max_prompts_per_request` |
//! | `POST_SCREENER_COOLDOWN_SECS` | `recovery.cooldown_secs` |
//! | `POST_SCREENER_MODEL` | `classifier.model` |
//! | `POST_SCREENER_COMPLETIONS_URL` | `classifier.base_url` |
//! | `POST_SCREENER_SEARCH_URL` | `search.base_url` |
//! | `POST_SCREENER_MAX_RESULTS` | `search.max_results_per_query` |
//! | `POST_SCREENER_FLUSH_EVERY` | `output.flush_every` |

use crate::batch::PromptTemplate;
use crate::client::{
    AcceptancePredicate, AffirmativeMarker, Classifier, CompletionService, GenerationParams,
    PatternPredicate,
};
use crate::resilience::{RateLimitRecovery, RecoveryConfig};
use crate::scheduler::{Scheduler, SchedulerConfig};
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_TEMPLATE: &str = "Decide whether the following social media post is relevant to the topic. \
Answer \"yes\" or \"no\", then give a short reason.\n\nPost: {text}\n\nAnswer:";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    pub template: String,
    pub affirmative_marker: String,
    /// Regex used instead of the marker when set.
    pub accept_pattern: Option<String>,
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub generation: GenerationParams,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
            affirmative_marker: "yes".to_string(),
            accept_pattern: None,
            model: crate::client::classifier::DEFAULT_MODEL.to_string(),
            base_url: crate::transport::http::DEFAULT_BASE_URL.to_string(),
            api_key: None,
            generation: GenerationParams::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    pub token_budget: usize,
    pub requests_per_minute: u32,
    pub max_prompts_per_request: usize,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            token_budget: 40_000,
            requests_per_minute: 20,
            max_prompts_per_request: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoverySettings {
    pub cooldown_secs: u64,
    pub max_attempts: Option<u32>,
}

impl Default for RecoverySettings {
    fn default() -> Self {
        Self {
            cooldown_secs: crate::resilience::DEFAULT_COOLDOWN.as_secs(),
            max_attempts: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub base_url: String,
    pub bearer_token: Option<String>,
    pub max_results_per_query: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            base_url: crate::source::DEFAULT_SEARCH_URL.to_string(),
            bearer_token: None,
            max_results_per_query: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Overwrite the sinks every time this many new records were accepted.
    /// `0` flushes only at stream end.
    pub flush_every: usize,
    /// Field of each source record that holds the text to classify.
    pub text_field: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            flush_every: 100,
            text_field: crate::types::TEXT_FIELD.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenerConfig {
    pub classifier: ClassifierSettings,
    pub scheduler: SchedulerSettings,
    pub recovery: RecoverySettings,
    pub search: SearchSettings,
    pub output: OutputSettings,
}

impl ScreenerConfig {
    /// Defaults, overlaid with the YAML file at `path` when given, then with
    /// the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_yaml_file(p)?,
            None => Self::default(),
        };
        config.apply_env_from(|k| std::env::var(k).ok())?;
        Ok(config)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration_with_context(
                format!("cannot read config file: {}", e),
                ErrorContext::new()
                    .with_details(path.display().to_string())
                    .with_source("config_loader"),
            )
        })?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Apply `POST_SCREENER_*` overrides using `lookup` to read variables.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = parse_env(&lookup, "POST_SCREENER_TOKEN_BUDGET")? {
            self.scheduler.token_budget = v;
        }
        if let Some(v) = parse_env(&lookup, "POST_SCREENER_RPM")? {
            self.scheduler.requests_per_minute = v;
        }
        if let Some(v) = parse_env(&lookup, "POST_SCREENER_MAX_PROMPTS")? {
            self.scheduler.max_prompts_per_request = v;
        }
        if let Some(v) = parse_env(&lookup, "POST_SCREENER_COOLDOWN_SECS")? {
            self.recovery.cooldown_secs = v;
        }
        if let Some(v) = parse_env(&lookup, "POST_SCREENER_MAX_RESULTS")? {
            self.search.max_results_per_query = v;
        }
        if let Some(v) = parse_env(&lookup, "POST_SCREENER_FLUSH_EVERY")? {
            self.output.flush_every = v;
        }
        if let Some(v) = lookup("POST_SCREENER_MODEL") {
            self.classifier.model = v;
        }
        if let Some(v) = lookup("POST_SCREENER_COMPLETIONS_URL") {
            self.classifier.base_url = v;
        }
        if let Some(v) = lookup("POST_SCREENER_SEARCH_URL") {
            self.search.base_url = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.scheduler_config().validate()?;
        self.recovery_config().validate()?;

        if self.classifier.template.trim().is_empty() {
            return Err(invalid("classifier.template", "prompt template must not be empty"));
        }
        if self.classifier.accept_pattern.is_none()
            && self.classifier.affirmative_marker.trim().is_empty()
        {
            return Err(invalid(
                "classifier.affirmative_marker",
                "affirmative marker must not be empty",
            ));
        }
        // compile once to surface a bad pattern before any request is made
        self.predicate()?;

        for (field, value) in [
            ("classifier.base_url", &self.classifier.base_url),
            ("search.base_url", &self.search.base_url),
        ] {
            url::Url::parse(value).map_err(|e| {
                Error::validation_with_context(
                    format!("invalid URL: {}", e),
                    ErrorContext::new()
                        .with_field_path(field)
                        .with_details(value.clone()),
                )
            })?;
        }
        Ok(())
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig::new(PromptTemplate::new(self.classifier.template.clone()))
            .with_token_budget(self.scheduler.token_budget)
            .with_requests_per_minute(self.scheduler.requests_per_minute)
            .with_max_prompts_per_request(self.scheduler.max_prompts_per_request)
    }

    pub fn recovery_config(&self) -> RecoveryConfig {
        let config =
            RecoveryConfig::new().with_cooldown(Duration::from_secs(self.recovery.cooldown_secs));
        match self.recovery.max_attempts {
            Some(max) => config.with_max_attempts(max),
            None => config,
        }
    }

    pub fn predicate(&self) -> Result<Arc<dyn AcceptancePredicate>> {
        let predicate: Arc<dyn AcceptancePredicate> = match &self.classifier.accept_pattern {
            Some(pattern) => Arc::new(PatternPredicate::new(pattern)?),
            None => Arc::new(AffirmativeMarker::new(&self.classifier.affirmative_marker)),
        };
        Ok(predicate)
    }

    /// Validate and assemble a scheduler around `service`.
    pub fn build_scheduler(&self, service: Arc<dyn CompletionService>) -> Result<Scheduler> {
        self.validate()?;
        let classifier = Classifier::new(service)
            .with_predicate(self.predicate()?)
            .with_model(self.classifier.model.clone())
            .with_params(self.classifier.generation.clone());
        Ok(Scheduler::new(
            self.scheduler_config(),
            classifier,
            RateLimitRecovery::new(self.recovery_config()),
        ))
    }
}

fn invalid(field: &str, msg: &str) -> Error {
    Error::validation_with_context(msg.to_string(), ErrorContext::new().with_field_path(field))
}

fn parse_env<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| {
            Error::configuration_with_context(
                format!("cannot parse {}: {}", key, e),
                ErrorContext::new()
                    .with_details(raw.clone())
                    .with_source("environment"),
            )
        }),
    }
}
