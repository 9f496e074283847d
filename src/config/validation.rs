use crate::config::types::CrawlConfig;
use crate::ConfigError;
use url::Url;

/// Validates a fully assembled crawl configuration
pub fn validate(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 100, got {}",
            config.concurrency
        )));
    }

    if config.http.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.http.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    for (name, retry) in [
        ("transient-retry", &config.http.transient_retry),
        ("connect-retry", &config.http.connect_retry),
    ] {
        if retry.budget_secs == 0 {
            return Err(ConfigError::Validation(format!(
                "{name}: budget-secs must be >= 1"
            )));
        }
        if retry.base_delay_ms == 0 {
            return Err(ConfigError::Validation(format!(
                "{name}: base-delay-ms must be >= 1"
            )));
        }
    }

    if config.pipeline.queue_capacity < 1 {
        return Err(ConfigError::Validation(
            "queue-capacity must be >= 1".to_string(),
        ));
    }

    if config.pipeline.enqueue_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "enqueue-timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates a seed URL string before a crawl starts
///
/// The seed must be absolute, carry a host, and use an http(s) scheme.
pub fn validate_seed_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidUrl(format!("'{raw}': {e}")))?;

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "'{raw}' has no host"
        )));
    }

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "the scheme '{}' is not allowed, use http or https",
            url.scheme()
        )));
    }

    Ok(url)
}
