//! Prompt rendering.

use crate::tokens::TokenCounter;
use serde::{Deserialize, Serialize};

/// Placeholder replaced by the candidate text.
pub const TEXT_PLACEHOLDER: &str = "{text}";

/// The fixed classification template.
///
/// When the template has no [`TEXT_PLACEHOLDER`], the candidate text is
/// appended after a blank line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    pub fn render(&self, text: &str) -> String {
        if self.template.contains(TEXT_PLACEHOLDER) {
            self.template.replace(TEXT_PLACEHOLDER, text)
        } else {
            format!("{}\n\n{}", self.template, text)
        }
    }

    /// Template text without the candidate, i.e. what every prompt pays.
    pub fn fixed_text(&self) -> String {
        self.render("")
    }

    pub fn fixed_cost(&self, counter: &dyn TokenCounter) -> usize {
        counter.count(&self.fixed_text())
    }
}

/// A rendered prompt tagged with its position in the full input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub index: usize,
    pub text: String,
    /// Estimated cost of the candidate text alone (template excluded).
    pub text_cost: usize,
}

impl Prompt {
    pub fn render(
        index: usize,
        candidate: &str,
        template: &PromptTemplate,
        counter: &dyn TokenCounter,
    ) -> Self {
        Self {
            index,
            text: template.render(candidate),
            text_cost: counter.count(candidate),
        }
    }
}

/// Prompts submitted together in one request. Lives for one exchange and its
/// replays.
#[derive(Debug, Clone, Copy)]
pub struct Batch<'a> {
    prompts: &'a [Prompt],
}

impl<'a> Batch<'a> {
    pub fn new(prompts: &'a [Prompt]) -> Self {
        Self { prompts }
    }

    pub fn prompts(&self) -> &'a [Prompt] {
        self.prompts
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    /// Original sequence index of the first prompt, if any.
    pub fn first_index(&self) -> Option<usize> {
        self.prompts.first().map(|p| p.index)
    }

    pub fn texts(&self) -> Vec<String> {
        self.prompts.iter().map(|p| p.text.clone()).collect()
    }

    pub fn estimated_tokens(&self, per_prompt_fixed_cost: usize) -> usize {
        self.prompts
            .iter()
            .map(|p| p.text_cost + per_prompt_fixed_cost)
            .sum()
    }
}
