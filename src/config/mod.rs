//! Configuration module for sitegraph
//!
//! Crawl parameters (seed URL, depth, concurrency, external-link policy) come
//! from the CLI; HTTP and pipeline tuning can additionally be overridden with
//! an optional TOML file.

mod parser;
mod types;
mod validation;

pub use parser::load_tuning;
pub use types::{CrawlConfig, HttpConfig, PipelineConfig, RetryConfig, TuningConfig};
pub use validation::{validate, validate_seed_url};
