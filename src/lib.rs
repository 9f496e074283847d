//! Sitegraph: a site map generator
//!
//! This crate crawls a web site starting from a seed URL, discovers hyperlinks
//! up to a configured depth, and persists each visited page's title, raw HTML,
//! and outbound links to SQLite, producing a navigable map of the site's
//! internal link graph.

pub mod config;
pub mod crawler;
pub mod output;
pub mod pipeline;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for sitegraph operations
#[derive(Debug, Error)]
pub enum SitegraphError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch failed for {url}: {message}")]
    FetchFailure { url: String, message: String },

    #[error("Persistence queue is full, enqueue timed out after {timeout_secs}s")]
    PipelineOverflow { timeout_secs: u64 },

    #[error("Pipeline failed to drain: {remaining} page(s) still queued")]
    DrainTimeout { remaining: usize },

    #[error("Persistence pipeline is closed")]
    PipelineClosed,

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,

    #[error("URL is not absolute: {0}")]
    NotAbsolute(String),
}

/// Result type alias for sitegraph operations
pub type Result<T> = std::result::Result<T, SitegraphError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::CrawlConfig;
pub use crawler::{PageInfo, SiteMapGenerator};
pub use pipeline::PersistencePipeline;
pub use storage::{PageStore, SqliteStorage};
