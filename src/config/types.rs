use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Complete configuration for one crawl run
///
/// Assembled in `main` from CLI arguments plus the optional tuning file;
/// the crawl engine receives it fully resolved and has no knowledge of how
/// the values were parsed.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Number of link-expansion levels beyond the seed (0 = seed only)
    pub depth: u32,

    /// Maximum number of simultaneous in-flight fetches
    pub concurrency: usize,

    /// Whether links pointing outside the seed host are followed
    pub allow_external: bool,

    /// Path to the SQLite database file
    pub database_path: PathBuf,

    pub http: HttpConfig,
    pub pipeline: PipelineConfig,
}

impl CrawlConfig {
    pub fn new(
        depth: u32,
        concurrency: usize,
        allow_external: bool,
        database_path: PathBuf,
        tuning: TuningConfig,
    ) -> Self {
        Self {
            depth,
            concurrency,
            allow_external,
            database_path,
            http: tuning.http,
            pipeline: tuning.pipeline,
        }
    }
}

/// Optional TOML tuning file contents
///
/// Every field has a default, so an empty file (or no file at all) yields the
/// stock configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TuningConfig {
    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// HTTP client and retry behavior
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Connection-establishment timeout in seconds
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Retry budget for broad transient failures (timeouts, truncated bodies)
    #[serde(rename = "transient-retry", default = "RetryConfig::transient")]
    pub transient_retry: RetryConfig,

    /// Retry budget for connection-establishment failures
    #[serde(rename = "connect-retry", default = "RetryConfig::connect")]
    pub connect_retry: RetryConfig,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            transient_retry: RetryConfig::transient(),
            connect_retry: RetryConfig::connect(),
        }
    }
}

/// Exponential-backoff retry settings with a cumulative wall-clock budget
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Total wall-clock seconds spent retrying before giving up
    #[serde(rename = "budget-secs")]
    pub budget_secs: u64,

    /// First backoff interval in milliseconds (doubles on every attempt)
    #[serde(rename = "base-delay-ms", default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Cap on a single backoff interval in seconds
    #[serde(rename = "max-delay-secs", default = "default_max_delay_secs")]
    pub max_delay_secs: u64,
}

impl RetryConfig {
    /// Default policy for broad transient I/O failures: 120 second budget
    pub fn transient() -> Self {
        Self {
            budget_secs: 120,
            base_delay_ms: default_base_delay_ms(),
            max_delay_secs: default_max_delay_secs(),
        }
    }

    /// Default policy for connection-establishment failures: 10 second budget
    pub fn connect() -> Self {
        Self {
            budget_secs: 10,
            base_delay_ms: default_base_delay_ms(),
            max_delay_secs: default_max_delay_secs(),
        }
    }

    pub fn budget(&self) -> Duration {
        Duration::from_secs(self.budget_secs)
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_secs(self.max_delay_secs)
    }
}

/// Persistence pipeline tuning
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Bounded queue capacity between the crawl engine and the writer
    #[serde(rename = "queue-capacity", default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Seconds the producer blocks on a full queue before the run fails
    #[serde(rename = "enqueue-timeout-secs", default = "default_enqueue_timeout")]
    pub enqueue_timeout_secs: u64,

    /// Emptiness polls allowed during shutdown drain
    #[serde(rename = "drain-attempts", default = "default_drain_attempts")]
    pub drain_attempts: u32,

    /// Milliseconds between drain polls
    #[serde(rename = "drain-interval-ms", default = "default_drain_interval_ms")]
    pub drain_interval_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            enqueue_timeout_secs: default_enqueue_timeout(),
            drain_attempts: default_drain_attempts(),
            drain_interval_ms: default_drain_interval_ms(),
        }
    }
}

impl PipelineConfig {
    pub fn enqueue_timeout(&self) -> Duration {
        Duration::from_secs(self.enqueue_timeout_secs)
    }

    pub fn drain_interval(&self) -> Duration {
        Duration::from_millis(self.drain_interval_ms)
    }
}

fn default_user_agent() -> String {
    format!("sitegraph/{}", env!("CARGO_PKG_VERSION"))
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_secs() -> u64 {
    60
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_enqueue_timeout() -> u64 {
    120
}

fn default_drain_attempts() -> u32 {
    15
}

fn default_drain_interval_ms() -> u64 {
    500
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_retry_budgets() {
        let http = HttpConfig::default();
        assert_eq!(http.transient_retry.budget(), Duration::from_secs(120));
        assert_eq!(http.connect_retry.budget(), Duration::from_secs(10));
    }

    #[test]
    fn test_default_pipeline_drain_window() {
        let pipeline = PipelineConfig::default();
        // ~7.5s of drain polling by default
        assert_eq!(pipeline.drain_attempts, 15);
        assert_eq!(pipeline.drain_interval(), Duration::from_millis(500));
    }

    #[test]
    fn test_tuning_defaults_from_empty_toml() {
        let tuning: TuningConfig = toml::from_str("").unwrap();
        assert_eq!(tuning.pipeline.queue_capacity, 1024);
        assert_eq!(tuning.http.request_timeout_secs, 30);
    }

    #[test]
    fn test_tuning_partial_override() {
        let tuning: TuningConfig = toml::from_str(
            r#"
            [http]
            request-timeout-secs = 5

            [http.transient-retry]
            budget-secs = 3
            "#,
        )
        .unwrap();
        assert_eq!(tuning.http.request_timeout_secs, 5);
        assert_eq!(tuning.http.transient_retry.budget_secs, 3);
        // Untouched sections keep their defaults
        assert_eq!(tuning.http.connect_retry.budget_secs, 10);
        assert_eq!(tuning.pipeline.enqueue_timeout_secs, 120);
    }
}
