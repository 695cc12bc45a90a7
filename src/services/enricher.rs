// src/services/enricher.rs

//! Profile enrichment for newly discovered stargazers.
//!
//! Each login is looked up independently with its own retry budget. A
//! login whose lookup never succeeds is dropped from the batch and logged.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use reqwest::{Client, StatusCode, header};

use crate::models::{StargazerRecord, UserProfile};
use crate::utils::http::{is_retryable_error, is_retryable_status};
use crate::utils::retry::BackoffPolicy;

/// Failed profile lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// Worth another attempt (timeout, 5xx, rate limit)
    Retryable(String),
    /// Will not succeed on retry (unknown user, bad payload)
    Permanent(String),
}

impl LookupError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable(_))
    }
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retryable(message) => write!(f, "retryable: {message}"),
            Self::Permanent(message) => write!(f, "permanent: {message}"),
        }
    }
}

/// Source of public profile attributes.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn lookup(&self, login: &str) -> Result<UserProfile, LookupError>;
}

/// GitHub REST API profile client.
pub struct GitHubProfileClient {
    client: Client,
    api_base: String,
    token: Option<String>,
}

impl GitHubProfileClient {
    pub fn new(client: Client, api_base: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client,
            api_base: api_base.into(),
            token,
        }
    }

    pub fn profile_url(&self, login: &str) -> String {
        format!("{}/users/{}", self.api_base.trim_end_matches('/'), login)
    }
}

#[async_trait]
impl ProfileSource for GitHubProfileClient {
    async fn lookup(&self, login: &str) -> Result<UserProfile, LookupError> {
        let mut request = self
            .client
            .get(self.profile_url(login))
            .header(header::ACCEPT, "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(classify_error)?;
        let status = response.status();
        if !status.is_success() {
            let message = format!("GET /users/{login} returned {status}");
            return Err(if is_retryable_status(status) || is_rate_limited(&response) {
                LookupError::Retryable(message)
            } else {
                LookupError::Permanent(message)
            });
        }

        // A body cut off mid-read is transient; a body that reads but does not parse is not.
        let body = response
            .bytes()
            .await
            .map_err(|e| LookupError::Retryable(format!("reading /users/{login}: {e}")))?;
        serde_json::from_slice::<UserProfile>(&body)
            .map_err(|e| LookupError::Permanent(format!("bad /users/{login} payload: {e}")))
    }
}

fn classify_error(err: reqwest::Error) -> LookupError {
    if is_retryable_error(&err) {
        LookupError::Retryable(err.to_string())
    } else {
        LookupError::Permanent(err.to_string())
    }
}

/// GitHub reports an exhausted primary rate limit as 403 with zero remaining.
fn is_rate_limited(response: &reqwest::Response) -> bool {
    response.status() == StatusCode::FORBIDDEN
        && response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            == Some("0")
}

/// Records produced by one enrichment batch.
#[derive(Debug, Default)]
pub struct EnrichOutcome {
    /// One record per successful lookup, in input order
    pub records: Vec<StargazerRecord>,
    /// Logins that yielded no record
    pub failures: Vec<String>,
}

/// Bounded-concurrency enricher with per-login retry.
pub struct DetailEnricher<'a> {
    source: &'a dyn ProfileSource,
    policy: BackoffPolicy,
    max_concurrent: usize,
}

impl<'a> DetailEnricher<'a> {
    pub fn new(source: &'a dyn ProfileSource, policy: BackoffPolicy, max_concurrent: usize) -> Self {
        Self {
            source,
            policy,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Look up every login; at most `max_concurrent` lookups are in flight.
    ///
    /// Output order follows input order regardless of completion order.
    pub async fn enrich(&self, logins: &[String], discovered_at: DateTime<Utc>) -> EnrichOutcome {
        let results: Vec<_> = stream::iter(logins)
            .map(|login| async move { (login, self.lookup_with_retry(login).await) })
            .buffered(self.max_concurrent)
            .collect()
            .await;

        let mut outcome = EnrichOutcome::default();
        for (login, result) in results {
            match result {
                Some(profile) => outcome
                    .records
                    .push(StargazerRecord::new(profile, discovered_at)),
                None => outcome.failures.push(login.clone()),
            }
        }

        log::info!(
            "Enriched {} of {} new stargazers",
            outcome.records.len(),
            logins.len()
        );
        outcome
    }

    async fn lookup_with_retry(&self, login: &str) -> Option<UserProfile> {
        for attempt in 0..self.policy.max_attempts {
            match self.source.lookup(login).await {
                Ok(profile) => return Some(profile),
                Err(err) if err.is_retryable() && attempt + 1 < self.policy.max_attempts => {
                    let delay = self.policy.delay_for_attempt(attempt);
                    log::warn!(
                        "Lookup of {} failed (attempt {}/{}): {}; retrying in {:?}",
                        login,
                        attempt + 1,
                        self.policy.max_attempts,
                        err,
                        delay
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(err) => {
                    log::error!("Giving up on {} after {} attempt(s): {}", login, attempt + 1, err);
                    return None;
                }
            }
        }
        None
    }
}
