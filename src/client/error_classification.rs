//! Error classification logic

/// Map a failed HTTP exchange to a standard error class.
///
/// A provider error code wins over the status: OpenAI-style services answer
/// both "slow down" and "out of credit" with HTTP 429, and only the former
/// clears by waiting.
pub(crate) fn error_class(status: u16, provider_code: Option<&str>) -> &'static str {
    match provider_code {
        Some("insufficient_quota") | Some("billing_hard_limit_reached") => "quota_exhausted",
        Some("rate_limit_exceeded") => "rate_limited",
        Some("context_length_exceeded") => "request_too_large",
        Some("invalid_api_key") => "authentication",
        _ => match status {
            400 => "invalid_request",
            401 => "authentication",
            403 => "permission_denied",
            404 => "not_found",
            413 => "request_too_large",
            429 => "rate_limited",
            503 | 529 => "overloaded",
            500..=599 => "server_error",
            _ => "http_error",
        },
    }
}

/// Only rate limiting is recovered by cooldown-and-replay; every other class
/// propagates to the caller.
pub(crate) fn is_rate_limited_class(error_class: &str) -> bool {
    error_class == "rate_limited"
}

/// Extract the provider error code from an OpenAI-style error body.
pub(crate) fn error_code_from_body(body: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(body).ok()?;
    let error = json.get("error")?;
    error
        .get("code")
        .and_then(|v| v.as_str())
        .or_else(|| error.get("type").and_then(|v| v.as_str()))
        .map(|s| s.to_string())
}
