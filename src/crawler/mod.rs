//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with layered retry/backoff
//! - The HTML parsing contract and its scraper-based implementation
//! - The depth-synchronous BFS crawl engine

mod engine;
mod fetcher;
mod parser;

pub use engine::{PageInfo, SiteMapGenerator};
pub use fetcher::{build_http_client, LinkFetcher, RetryPolicy};
pub use parser::{HtmlPageParser, PageParser, ParsedPage, DEFAULT_TITLE};

use crate::config::CrawlConfig;
use crate::pipeline::PersistencePipeline;
use crate::storage::SqliteStorage;
use crate::Result;

/// Runs a complete crawl of `seed_url` and drains the persistence pipeline
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Open the storage layer
/// 2. Spawn the persistence pipeline consumer
/// 3. Build the HTTP client and fetcher
/// 4. Drive the depth-synchronous BFS
/// 5. Shut the pipeline down, draining remaining pages under the budget
///
/// A per-URL fetch failure is recorded as an error placeholder page and does
/// not fail the run; an invalid seed, a full pipeline queue, or a drain
/// timeout does.
pub async fn generate_site_map(config: &CrawlConfig, seed_url: &str) -> Result<()> {
    let store = SqliteStorage::new(&config.database_path)?;
    let pipeline = PersistencePipeline::spawn(store, &config.pipeline);

    let fetcher = LinkFetcher::new(&config.http, config.concurrency)?;
    let mut generator = SiteMapGenerator::new(
        fetcher,
        HtmlPageParser,
        pipeline.handle(),
        config.allow_external,
    );

    let crawl_result = generator.generate(seed_url, config.depth).await;

    // Drain even when the crawl failed, so already-produced pages are durable
    let drain_result = pipeline.shutdown().await;

    crawl_result?;
    drain_result
}
