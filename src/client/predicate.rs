//! Acceptance predicates: turn free-text model output into accept/reject.

use crate::{Error, ErrorContext, Result};
use regex::Regex;

/// Decides whether a raw response text counts as an accept.
pub trait AcceptancePredicate: Send + Sync {
    fn accepts(&self, response: &str) -> bool;
}

impl<F> AcceptancePredicate for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn accepts(&self, response: &str) -> bool {
        self(response)
    }
}

/// Accepts when the lowercased response contains the marker (case-insensitive
/// substring match).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffirmativeMarker {
    marker: String,
}

impl AffirmativeMarker {
    pub fn new(marker: impl AsRef<str>) -> Self {
        Self {
            marker: marker.as_ref().to_lowercase(),
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }
}

impl Default for AffirmativeMarker {
    fn default() -> Self {
        Self::new("yes")
    }
}

impl AcceptancePredicate for AffirmativeMarker {
    fn accepts(&self, response: &str) -> bool {
        !self.marker.is_empty() && response.to_lowercase().contains(&self.marker)
    }
}

/// Accepts when the response matches a regular expression.
#[derive(Debug, Clone)]
pub struct PatternPredicate {
    regex: Regex,
}

impl PatternPredicate {
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid acceptance pattern: {}", e),
                ErrorContext::new()
                    .with_field_path("classifier.accept_pattern")
                    .with_details(pattern.to_string()),
            )
        })?;
        Ok(Self { regex })
    }
}

impl AcceptancePredicate for PatternPredicate {
    fn accepts(&self, response: &str) -> bool {
        self.regex.is_match(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_is_case_insensitive() {
        let p = AffirmativeMarker::default();
        assert!(p.accepts("Yes, this is about crypto."));
        assert!(p.accepts("\nYES"));
        assert!(!p.accepts("No."));
        assert!(!p.accepts(""));
    }

    #[test]
    fn test_custom_marker_is_lowercased() {
        let p = AffirmativeMarker::new("RELEVANT");
        assert_eq!(p.marker(), "relevant");
        assert!(p.accepts("relevant: true"));
    }

    #[test]
    fn test_empty_marker_rejects_everything() {
        let p = AffirmativeMarker::new("");
        assert!(!p.accepts("yes"));
    }

    #[test]
    fn test_pattern_predicate() {
        let p = PatternPredicate::new(r"(?i)^\s*yes\b").unwrap();
        assert!(p.accepts("  Yes - on topic"));
        assert!(!p.accepts("eyes on the market"));
        assert!(PatternPredicate::new("(").is_err());
    }

    #[test]
    fn test_closure_predicate() {
        let p = |s: &str| s.starts_with('1');
        assert!(p.accepts("1"));
        assert!(!AcceptancePredicate::accepts(&p, "0"));
    }
}
