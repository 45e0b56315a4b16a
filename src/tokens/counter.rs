//! Token counter implementations.

pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;

    /// Total estimated cost of several texts.
    fn count_all<'a, I>(&self, texts: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
        Self: Sized,
    {
        texts.into_iter().map(|t| self.count(t)).sum()
    }
}

/// Character-ratio estimator. Counts Unicode scalar values, not bytes, and
/// rounds down so an empty string costs nothing.
#[derive(Debug, Clone)]
pub struct CharacterEstimator {
    chars_per_token: usize,
}

impl CharacterEstimator {
    pub fn new() -> Self {
        Self::with_ratio(4)
    }
    pub fn with_ratio(r: usize) -> Self {
        Self {
            chars_per_token: r.max(1),
        }
    }
    pub fn chars_per_token(&self) -> usize {
        self.chars_per_token
    }
}

impl Default for CharacterEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenCounter for CharacterEstimator {
    fn count(&self, text: &str) -> usize {
        text.chars().count() / self.chars_per_token
    }
}

/// Shorthand for the default `len / 4` heuristic.
pub fn estimate(text: &str) -> usize {
    CharacterEstimator::new().count(text)
}
