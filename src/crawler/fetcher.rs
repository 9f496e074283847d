//! HTTP fetcher with layered retry/backoff
//!
//! One fetch = one GET, gated by the run-wide concurrency semaphore and
//! wrapped in two retry policies evaluated outer-to-inner:
//! - outer: broad transient failures (timeouts, truncated/undecodable
//!   bodies), 120 second cumulative budget by default;
//! - inner: connection-establishment failures, 10 second budget, reset
//!   whenever an outer retry starts a fresh attempt.
//!
//! The response body is returned as text for any HTTP status; status-level
//! handling is not this layer's concern.

use crate::config::{HttpConfig, RetryConfig};
use crate::url::is_http_scheme;
use crate::{Result, SitegraphError};
use rand::Rng;
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use url::Url;

/// Exponential backoff with full jitter under a cumulative wall-clock budget
///
/// Testable independently of any I/O: `backoff_delay` yields the next wait
/// and `max_elapsed` bounds the total time a caller may keep retrying.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_elapsed: Duration,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_elapsed: Duration, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_elapsed,
            base_delay,
            max_delay,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.budget(), config.base_delay(), config.max_delay())
    }

    pub fn max_elapsed(&self) -> Duration {
        self.max_elapsed
    }

    /// Upper bound of the backoff interval for a 1-based attempt number
    fn ceiling(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.base_delay
            .checked_mul(1u32 << shift)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Full-jitter delay: uniformly random in [0, ceiling(attempt)]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let cap_ms = self.ceiling(attempt).as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(0..=cap_ms))
    }
}

/// Which retry policy governs a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorClass {
    /// Connection establishment failed (refused, unreachable, TLS setup)
    Connect,
    /// The request started but did not complete cleanly
    Transient,
}

fn classify(error: &reqwest::Error) -> ErrorClass {
    if error.is_connect() {
        ErrorClass::Connect
    } else {
        ErrorClass::Transient
    }
}

/// Builds the per-run HTTP client shared by all fetch tasks
pub fn build_http_client(config: &HttpConfig) -> std::result::Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a single URL's HTML with resilience to transient network failure
///
/// Holds the run-wide connection pool and the counting semaphore bounding
/// simultaneous fetches; both are shared by clone-cheap handles across the
/// fan-out. The pool is released when the run's fetcher is dropped.
pub struct LinkFetcher {
    client: Client,
    limiter: Arc<Semaphore>,
    transient_policy: RetryPolicy,
    connect_policy: RetryPolicy,
}

impl LinkFetcher {
    pub fn new(config: &HttpConfig, concurrency: usize) -> Result<Self> {
        Ok(Self {
            client: build_http_client(config)?,
            limiter: Arc::new(Semaphore::new(concurrency)),
            transient_policy: RetryPolicy::from_config(&config.transient_retry),
            connect_policy: RetryPolicy::from_config(&config.connect_retry),
        })
    }

    /// Performs a GET and returns the decoded body as text
    ///
    /// Fails fast with `InvalidInput` for URLs without a host or with a
    /// non-http(s) scheme; everything else is retried per the layered
    /// policies and surfaces as `FetchFailure` once a budget is exhausted.
    pub async fn get_html(&self, url: &str) -> Result<String> {
        let parsed = Url::parse(url)
            .map_err(|e| SitegraphError::InvalidInput(format!("invalid URL '{url}': {e}")))?;

        if parsed.host_str().is_none() || !is_http_scheme(&parsed) {
            return Err(SitegraphError::InvalidInput(format!("invalid URL: {url}")));
        }

        // Released unconditionally when the guard drops, error paths included
        let _permit =
            self.limiter
                .acquire()
                .await
                .map_err(|_| SitegraphError::FetchFailure {
                    url: parsed.to_string(),
                    message: "concurrency limiter closed".to_string(),
                })?;

        let outer_started = Instant::now();
        let mut inner_started = Instant::now();
        let mut outer_tries: u32 = 0;
        let mut inner_tries: u32 = 0;

        loop {
            let error = match self.request(&parsed).await {
                Ok(body) => return Ok(body),
                Err(e) => e,
            };

            let (policy, started, attempt) = match classify(&error) {
                ErrorClass::Connect => {
                    inner_tries += 1;
                    (&self.connect_policy, inner_started, inner_tries)
                }
                ErrorClass::Transient => {
                    outer_tries += 1;
                    // each outer retry gets a fresh connect budget
                    inner_started = Instant::now();
                    inner_tries = 0;
                    (&self.transient_policy, outer_started, outer_tries)
                }
            };

            let wait = policy.backoff_delay(attempt);
            if started.elapsed() + wait >= policy.max_elapsed() {
                tracing::warn!(
                    url = %parsed,
                    tries = outer_tries + inner_tries,
                    error = %error,
                    "giving up, retry budget exhausted"
                );
                return Err(SitegraphError::FetchFailure {
                    url: parsed.to_string(),
                    message: error.to_string(),
                });
            }

            tracing::debug!(
                url = %parsed,
                attempt,
                wait_ms = wait.as_millis() as u64,
                error = %error,
                "backing off before retry"
            );
            tokio::time::sleep(wait).await;
        }
    }

    async fn request(&self, url: &Url) -> std::result::Result<String, reqwest::Error> {
        let response = self.client.get(url.clone()).send().await?;
        response.text().await
    }
}
