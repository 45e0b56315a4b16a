use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error
    /// (e.g., "scheduler.requests_per_minute")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected range, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "config_loader", "recent_search")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Transport-level failures (connection, TLS, body decoding).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}

/// Unified error type for the screener.
///
/// Rate limiting is deliberately absent: a rate-limited exchange is an outcome
/// handled by [`crate::resilience::RateLimitRecovery`], and only surfaces here as
/// [`Error::RateLimitExhausted`] when an explicit attempt bound is configured.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be read or parsed.
    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    /// A loaded setting is out of range or otherwise unusable.
    #[error("Validation error: {message}{}", format_context(.context))]
    Validation {
        message: String,
        context: ErrorContext,
    },

    #[error("Network transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Remote error: HTTP {status} ({class}): {message}")]
    Remote {
        status: u16,
        class: String,
        message: String,
    },

    /// Source records and verdicts disagree in length. This is a contract
    /// violation and aborts the run.
    #[error("Length mismatch: {records} source records but {verdicts} verdicts")]
    LengthMismatch { records: usize, verdicts: usize },

    #[error("Rate limit persisted after {attempts} attempts; batch of {batch_len} prompts dropped")]
    RateLimitExhausted { attempts: u32, batch_len: usize },

    #[error("Post source error: {message}{}", format_context(.context))]
    Source {
        message: String,
        context: ErrorContext,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Create a new validation error with structured context
    pub fn validation_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Validation {
            message: msg.into(),
            context,
        }
    }

    /// Create a new post source error with structured context
    pub fn source_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Source {
            message: msg.into(),
            context,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. }
            | Error::Validation { context, .. }
            | Error::Source { context, .. } => Some(context),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Transport(TransportError::Http(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_is_rendered_in_display() {
        let err = Error::configuration_with_context(
            "cooldown too short",
            ErrorContext::new()
                .with_field_path("recovery.cooldown_secs")
                .with_source("config"),
        );
        let msg = err.to_string();
        assert!(msg.contains("cooldown too short"));
        assert!(msg.contains("field: recovery.cooldown_secs"));
        assert!(msg.contains("source: config"));
    }

    #[test]
    fn test_empty_context_renders_nothing() {
        let err = Error::validation_with_context("bad", ErrorContext::default());
        assert_eq!(err.to_string(), "Validation error: bad");
    }

    #[test]
    fn test_length_mismatch_message() {
        let err = Error::LengthMismatch {
            records: 3,
            verdicts: 2,
        };
        assert!(err.context().is_none());
        assert_eq!(
            err.to_string(),
            "Length mismatch: 3 source records but 2 verdicts"
        );
    }
}
