use crate::client::error_classification::{error_class, error_code_from_body, is_rate_limited_class};
use crate::client::service::{Choice, CompletionOutcome, CompletionRequest, CompletionService};
use crate::transport::credentials::resolve_secret;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Proxy;
use serde::Deserialize;
use std::env;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

/// OpenAI-style legacy `/completions` endpoint, which accepts a list of
/// prompts and tags each choice with the prompt index.
///
/// No request timeout is configured: a hung request hangs the scheduler.
pub struct HttpCompletionService {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpCompletionService {
    /// Build the service. The API key falls back to the OS keyring entry
    /// `post-screener/openai`, then `OPENAI_API_KEY`.
    pub fn new(base_url: impl Into<String>, api_key: Option<&str>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().pool_max_idle_per_host(
            env::var("POST_SCREENER_HTTP_POOL_MAX_IDLE_PER_HOST")
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(4),
        );

        if let Ok(proxy_url) = env::var("POST_SCREENER_PROXY_URL") {
            if let Ok(proxy) = Proxy::all(&proxy_url) {
                builder = builder.proxy(proxy);
            }
        }

        let client = builder
            .build()
            .map_err(|e| Error::Transport(crate::transport::TransportError::Other(e.to_string())))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: resolve_secret(api_key, "openai", "OPENAI_API_KEY"),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request_body(request: &CompletionRequest) -> serde_json::Value {
        serde_json::json!({
            "model": request.model,
            "prompt": request.prompts,
            "temperature": request.params.temperature,
            "max_tokens": request.params.max_tokens,
            "top_p": request.params.top_p,
            "frequency_penalty": request.params.frequency_penalty,
            "presence_penalty": request.params.presence_penalty,
        })
    }

    /// Best-effort parsing of `Retry-After` header (seconds form only).
    fn retry_after(headers: &HeaderMap) -> Option<Duration> {
        let raw = headers.get("retry-after")?.to_str().ok()?.trim();
        let secs: u64 = raw.parse().ok()?;
        Some(Duration::from_secs(secs))
    }
}

#[async_trait]
impl CompletionService for HttpCompletionService {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionOutcome> {
        let url = format!("{}/completions", self.base_url);
        let client_request_id = Uuid::new_v4().to_string();

        let mut req = self
            .client
            .post(&url)
            .json(&Self::request_body(request))
            .header("x-request-id", &client_request_id);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let start = Instant::now();
        let resp = req.send().await?;
        let status = resp.status().as_u16();

        if !resp.status().is_success() {
            let retry_after = Self::retry_after(resp.headers());
            let body = resp.text().await.unwrap_or_default();
            let provider_code = error_code_from_body(&body);
            let class = error_class(status, provider_code.as_deref());

            if is_rate_limited_class(class) {
                warn!(
                    http_status = status,
                    request_id = client_request_id.as_str(),
                    retry_after_secs = retry_after.map(|d| d.as_secs()),
                    "completion request rate limited"
                );
                return Ok(CompletionOutcome::RateLimited { retry_after });
            }

            info!(
                http_status = status,
                error_class = class,
                request_id = client_request_id.as_str(),
                duration_ms = start.elapsed().as_millis() as u64,
                "completion request failed"
            );
            return Err(Error::Remote {
                status,
                class: class.to_string(),
                message: body,
            });
        }

        let parsed: CompletionResponse = resp.json().await?;
        info!(
            http_status = status,
            prompts = request.prompts.len(),
            choices = parsed.choices.len(),
            request_id = client_request_id.as_str(),
            duration_ms = start.elapsed().as_millis() as u64,
            "completion request succeeded"
        );
        Ok(CompletionOutcome::Choices(parsed.choices))
    }
}
