//! Completion service contract.

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fixed generation parameters sent with every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: 60,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        }
    }
}

/// One request: an ordered list of prompt strings.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub prompts: Vec<String>,
    pub params: GenerationParams,
}

/// One generated text. `index` names the prompt it answers; services that do
/// not report it leave it `None`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub index: Option<usize>,
    #[serde(default)]
    pub text: String,
}

impl Choice {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index: Some(index),
            text: text.into(),
        }
    }

    pub fn unindexed(text: impl Into<String>) -> Self {
        Self {
            index: None,
            text: text.into(),
        }
    }
}

/// Result of a single exchange. Choices may be incomplete and in any order.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    Choices(Vec<Choice>),
    /// The service refused the request for rate reasons; no partial data.
    RateLimited { retry_after: Option<Duration> },
}

#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choice_deserializes_openai_shape() {
        let c: Choice = serde_json::from_str(
            r#"{"text": " yes", "index": 2, "logprobs": null, "finish_reason": "stop"}"#,
        )
        .unwrap();
        assert_eq!(c, Choice::new(2, " yes"));
    }

    #[test]
    fn test_choice_without_index() {
        let c: Choice = serde_json::from_str(r#"{"text": "no"}"#).unwrap();
        assert_eq!(c, Choice::unindexed("no"));
    }

    #[test]
    fn test_params_partial_yaml() {
        let p: GenerationParams = serde_yaml::from_str("max_tokens: 5").unwrap();
        assert_eq!(p.max_tokens, 5);
        assert_eq!(p.top_p, 1.0);
    }
}
