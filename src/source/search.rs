//! Recent-search source.

use super::PostSource;
use crate::resilience::DEFAULT_COOLDOWN;
use crate::transport::credentials::resolve_secret;
use crate::types::SourceRecord;
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_SEARCH_URL: &str = "https://api.twitter.com/2";

/// Epoch second at which the search request window reopens.
const RATE_LIMIT_RESET_HEADER: &str = "x-rate-limit-reset";

/// The API accepts page sizes in this range only.
const MIN_PAGE_SIZE: usize = 10;
const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone)]
pub struct SearchParams {
    pub queries: Vec<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    /// Records kept per query; paging stops once reached.
    pub max_results_per_query: usize,
}

impl SearchParams {
    /// Queries are trimmed; blank ones are dropped.
    pub fn new<I, S>(queries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            queries: queries
                .into_iter()
                .map(|q| q.as_ref().trim().to_string())
                .filter(|q| !q.is_empty())
                .collect(),
            start_time: None,
            end_time: None,
            max_results_per_query: 100,
        }
    }

    pub fn with_time_range(
        mut self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Self {
        self.start_time = start;
        self.end_time = end;
        self
    }

    pub fn with_max_results_per_query(mut self, n: usize) -> Self {
        self.max_results_per_query = n.max(1);
        self
    }

    fn page_size(&self) -> usize {
        self.max_results_per_query.clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE)
    }
}

#[derive(Debug, Default, Deserialize)]
struct SearchPage {
    #[serde(default)]
    data: Vec<SourceRecord>,
    #[serde(default)]
    includes: Includes,
    #[serde(default)]
    meta: Meta,
}

#[derive(Debug, Default, Deserialize)]
struct Includes {
    #[serde(default)]
    users: Vec<SourceRecord>,
}

#[derive(Debug, Default, Deserialize)]
struct Meta {
    next_token: Option<String>,
}

/// Pages through recent-search results for each query in turn.
///
/// Every record is flattened: the author's `username` and `name` from the
/// `includes.users` expansion are merged as `author_username` and
/// `author_name`, and the originating query is added under `query`.
pub struct RecentSearchSource {
    client: reqwest::Client,
    base_url: String,
    bearer_token: Option<String>,
    params: SearchParams,
    rate_limit_cooldown: Duration,
    query_pos: usize,
    next_token: Option<String>,
    kept_for_query: usize,
}

impl RecentSearchSource {
    /// The bearer token falls back to the keyring entry
    /// `post-screener/twitter`, then `TWITTER_BEARER_TOKEN`.
    pub fn new(
        base_url: impl Into<String>,
        bearer_token: Option<&str>,
        params: SearchParams,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Transport(crate::transport::TransportError::Other(e.to_string())))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bearer_token: resolve_secret(bearer_token, "twitter", "TWITTER_BEARER_TOKEN"),
            params,
            rate_limit_cooldown: DEFAULT_COOLDOWN,
            query_pos: 0,
            next_token: None,
            kept_for_query: 0,
        })
    }

    /// Wait used after a 429 that carries no usable reset time.
    pub fn with_rate_limit_cooldown(mut self, cooldown: Duration) -> Self {
        self.rate_limit_cooldown = cooldown;
        self
    }

    fn advance_query(&mut self) {
        self.query_pos += 1;
        self.next_token = None;
        self.kept_for_query = 0;
    }

    async fn fetch(&self, query: &str) -> Result<SearchPage> {
        let url = format!("{}/tweets/search/recent", self.base_url);
        let mut params: Vec<(&str, String)> = vec![
            ("query", query.to_string()),
            ("max_results", self.params.page_size().to_string()),
            ("expansions", "author_id".to_string()),
            ("tweet.fields", "created_at,author_id,lang,conversation_id".to_string()),
            ("user.fields", "username,name".to_string()),
        ];
        if let Some(t) = self.params.start_time {
            params.push(("start_time", t.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }
        if let Some(t) = self.params.end_time {
            params.push(("end_time", t.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }
        if let Some(token) = &self.next_token {
            params.push(("next_token", token.clone()));
        }

        // a 429 replays the same page request once the window reopens
        let resp = loop {
            let mut req = self.client.get(&url).query(&params);
            if let Some(token) = &self.bearer_token {
                req = req.bearer_auth(token);
            }
            let resp = req.send().await?;
            if resp.status() != StatusCode::TOO_MANY_REQUESTS {
                break resp;
            }
            let wait = rate_limit_wait(resp.headers(), Utc::now(), self.rate_limit_cooldown);
            warn!(
                query,
                resume_in_secs = wait.as_secs(),
                "search rate limited; waiting for the window to reset"
            );
            tokio::time::sleep(wait).await;
        };
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::source_with_context(
                format!("search request failed with HTTP {}", status),
                ErrorContext::new()
                    .with_details(body)
                    .with_source("recent_search"),
            ));
        }
        Ok(resp.json::<SearchPage>().await?)
    }

    fn flatten(page: SearchPage, query: &str) -> Vec<SourceRecord> {
        let users: HashMap<&str, &SourceRecord> = page
            .includes
            .users
            .iter()
            .filter_map(|u| Some((u.get("id")?.as_str()?, u)))
            .collect();

        page.data
            .into_iter()
            .map(|mut post| {
                let author = post
                    .get("author_id")
                    .and_then(Value::as_str)
                    .and_then(|id| users.get(id).copied());
                if let Some(user) = author {
                    for (from, to) in [("username", "author_username"), ("name", "author_name")] {
                        if let Some(v) = user.get(from) {
                            post.insert(to.to_string(), v.clone());
                        }
                    }
                }
                post.insert("query".to_string(), Value::String(query.to_string()));
                post
            })
            .collect()
    }
}

/// Time until the `x-rate-limit-reset` epoch second plus one second of slack,
/// or `fallback` when the header is missing or unparsable.
fn rate_limit_wait(headers: &HeaderMap, now: DateTime<Utc>, fallback: Duration) -> Duration {
    let reset = headers
        .get(RATE_LIMIT_RESET_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<i64>().ok())
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single());
    match reset {
        Some(reset) => {
            let until = (reset - now).to_std().unwrap_or(Duration::ZERO);
            until + Duration::from_secs(1)
        }
        None => fallback,
    }
}

#[async_trait]
impl PostSource for RecentSearchSource {
    async fn next_page(&mut self) -> Result<Option<Vec<SourceRecord>>> {
        loop {
            let Some(query) = self.params.queries.get(self.query_pos).cloned() else {
                return Ok(None);
            };
            if self.kept_for_query == 0 && self.next_token.is_none() {
                info!(query = query.as_str(), "searching posts");
            }

            let mut page = self.fetch(&query).await?;
            let next_token = page.meta.next_token.take();
            let mut records = Self::flatten(page, &query);

            let quota = self
                .params
                .max_results_per_query
                .saturating_sub(self.kept_for_query);
            records.truncate(quota);
            self.kept_for_query += records.len();
            debug!(
                query = query.as_str(),
                records = records.len(),
                kept = self.kept_for_query,
                "fetched search page"
            );

            match next_token {
                Some(token) if self.kept_for_query < self.params.max_results_per_query => {
                    self.next_token = Some(token)
                }
                _ => self.advance_query(),
            }

            if !records.is_empty() {
                return Ok(Some(records));
            }
        }
    }
}
