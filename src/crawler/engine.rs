//! Depth-synchronous BFS crawl engine
//!
//! For each depth level the engine fans fetch+parse out across the whole
//! frontier concurrently, filters the discovered hrefs through the URL
//! classifier, hands every visited page (success or error placeholder) to the
//! persistence pipeline, and computes the next frontier. Level d+1 never
//! starts fetching before level d's fan-out has fully completed; persistence
//! runs decoupled behind the pipeline queue.

use crate::crawler::fetcher::LinkFetcher;
use crate::crawler::parser::PageParser;
use crate::pipeline::PipelineHandle;
use crate::url::{
    is_fragment_reference, is_http_scheme, is_internal_host, is_relative, resolve_relative,
    site_base_url, DedupCache,
};
use crate::{Result, SitegraphError};
use futures::future::join_all;
use std::collections::HashSet;
use url::Url;

/// One crawled page, owned by whichever stage currently holds it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageInfo {
    pub url: String,
    pub title: String,
    pub html: String,
    /// Accepted outbound links, in discovery order
    pub links: Vec<String>,
}

impl PageInfo {
    /// Placeholder recorded when fetch or parse failed, so failures stay
    /// visible in the output
    pub fn error_placeholder(url: &str, message: &str) -> Self {
        Self {
            url: url.to_string(),
            title: format!("[ERROR]: {message}"),
            html: String::new(),
            links: Vec::new(),
        }
    }
}

/// The crawl engine: drives BFS and guarantees every encountered page is
/// queued for persistence exactly once per run
pub struct SiteMapGenerator<P: PageParser> {
    fetcher: LinkFetcher,
    parser: P,
    pipeline: PipelineHandle,
    cache: DedupCache,
    allow_external: bool,
}

impl<P: PageParser> SiteMapGenerator<P> {
    pub fn new(
        fetcher: LinkFetcher,
        parser: P,
        pipeline: PipelineHandle,
        allow_external: bool,
    ) -> Self {
        Self {
            fetcher,
            parser,
            pipeline,
            cache: DedupCache::new(),
            allow_external,
        }
    }

    /// Crawls `seed_url` for `depth` expansion levels beyond the seed
    ///
    /// Levels 0..=depth are fetched, so the visited set is exactly the BFS
    /// closure up to distance `depth` from the seed; links found at the final
    /// level are recorded on their page but never expanded. Fails fast with
    /// `InvalidInput` for a non-absolute or non-http(s) seed.
    pub async fn generate(&mut self, seed_url: &str, depth: u32) -> Result<()> {
        let seed = Url::parse(seed_url).map_err(|e| {
            SitegraphError::InvalidInput(format!("the seed URL '{seed_url}' is not absolute: {e}"))
        })?;

        let seed_host = seed
            .host_str()
            .ok_or_else(|| {
                SitegraphError::InvalidInput(format!("the seed URL '{seed_url}' has no host"))
            })?
            .to_string();

        if !is_http_scheme(&seed) {
            return Err(SitegraphError::InvalidInput(format!(
                "the seed URL '{seed_url}' must use http or https"
            )));
        }

        let mut frontier = vec![seed.to_string()];

        for level in 0..=depth {
            if frontier.is_empty() {
                tracing::debug!(level, "frontier is empty, stopping early");
                break;
            }

            tracing::debug!(level, urls = frontier.len(), "processing level");
            frontier = self.process_level(frontier, &seed_host).await?;
        }

        tracing::info!(pages = self.cache.len(), "crawl complete");
        Ok(())
    }

    /// Fetches one frontier concurrently and returns the next frontier
    async fn process_level(&mut self, urls: Vec<String>, seed_host: &str) -> Result<Vec<String>> {
        // A URL can re-enter the frontier through a sibling's links before
        // its own fetch registered it in the cache; drop anything already
        // visited so no URL is fetched twice in one run
        let urls: Vec<String> = urls
            .into_iter()
            .filter(|url| !self.cache.contains(url))
            .collect();

        let results = join_all(urls.iter().map(|url| self.fetch_page(url))).await;

        let mut next_frontier: Vec<String> = Vec::new();
        let mut queued: HashSet<String> = HashSet::new();

        for (url, result) in urls.iter().zip(results) {
            let mut page = match result {
                Ok(page) => page,
                Err(e) => {
                    // One URL's failure never aborts its siblings or the run
                    tracing::error!(url = %url, error = %e, "fetch failed");
                    self.submit(PageInfo::error_placeholder(url, &e.to_string()))
                        .await?;
                    continue;
                }
            };

            let page_url = Url::parse(&page.url)?;
            let base = site_base_url(&page_url)?;

            let raw_links = std::mem::take(&mut page.links);
            let mut accepted = Vec::with_capacity(raw_links.len());

            for raw in raw_links {
                let Some(link) = self.classify_link(&raw, &base, seed_host) else {
                    continue;
                };

                if self.cache.contains(&link) {
                    // Still a real outbound link of this page, but cycles must
                    // not re-enter the frontier
                    tracing::debug!(url = %link, "already visited, not re-fetching");
                    accepted.push(link);
                    continue;
                }

                if queued.insert(link.clone()) {
                    next_frontier.push(link.clone());
                }
                accepted.push(link);
            }

            page.links = accepted;
            tracing::info!(url = %page.url, links = page.links.len(), "visited");
            self.submit(page).await?;
        }

        Ok(next_frontier)
    }

    /// Applies the classification chain to one raw href
    ///
    /// Returns the absolute URL string of an accepted link, or None when the
    /// href is a fragment reference, unparseable, non-http(s), or external
    /// while external links are disallowed.
    fn classify_link(&self, raw: &str, base: &Url, seed_host: &str) -> Option<String> {
        if is_fragment_reference(raw) {
            tracing::trace!(href = raw, "skip reference to page element");
            return None;
        }

        let absolute = if is_relative(raw) {
            match resolve_relative(raw, base) {
                Ok(url) => url,
                Err(e) => {
                    tracing::debug!(href = raw, error = %e, "skip unresolvable link");
                    return None;
                }
            }
        } else {
            match Url::parse(raw) {
                Ok(url) => url,
                Err(e) => {
                    tracing::debug!(href = raw, error = %e, "skip unparseable link");
                    return None;
                }
            }
        };

        if !is_http_scheme(&absolute) {
            tracing::debug!(url = %absolute, "skip non-http link");
            return None;
        }

        let host = absolute.host_str()?;
        if !self.allow_external && !is_internal_host(host, seed_host) {
            tracing::debug!(url = %absolute, "skip external link");
            return None;
        }

        Some(absolute.to_string())
    }

    async fn fetch_page(&self, url: &str) -> Result<PageInfo> {
        let html = self.fetcher.get_html(url).await?;
        let parsed = self.parser.parse_html(&html);

        Ok(PageInfo {
            url: url.to_string(),
            title: parsed.title,
            html,
            links: parsed.links,
        })
    }

    /// Registers the page in the dedup cache and enqueues it for persistence
    async fn submit(&mut self, page: PageInfo) -> Result<()> {
        self.cache.insert(&page.url);
        self.pipeline.enqueue(page).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HttpConfig, PipelineConfig};
    use crate::crawler::parser::HtmlPageParser;
    use crate::pipeline::PersistencePipeline;
    use crate::storage::SqliteStorage;

    fn create_generator() -> (SiteMapGenerator<HtmlPageParser>, PersistencePipeline) {
        let store = SqliteStorage::new_in_memory().unwrap();
        let pipeline = PersistencePipeline::spawn(store, &PipelineConfig::default());
        let fetcher = LinkFetcher::new(&HttpConfig::default(), 2).unwrap();
        let generator = SiteMapGenerator::new(fetcher, HtmlPageParser, pipeline.handle(), false);
        (generator, pipeline)
    }

    #[tokio::test]
    async fn test_generate_rejects_relative_seed() {
        let (mut generator, pipeline) = create_generator();
        let result = generator.generate("/about", 1).await;
        assert!(matches!(result, Err(SitegraphError::InvalidInput(_))));
        pipeline.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_generate_rejects_non_http_seed() {
        let (mut generator, pipeline) = create_generator();
        let result = generator.generate("ftp://example.com/", 1).await;
        assert!(matches!(result, Err(SitegraphError::InvalidInput(_))));
        pipeline.shutdown().await.unwrap();
    }

    #[test]
    fn test_error_placeholder_shape() {
        let page = PageInfo::error_placeholder("https://example.com/x", "connection reset");
        assert_eq!(page.title, "[ERROR]: connection reset");
        assert!(page.html.is_empty());
        assert!(page.links.is_empty());
    }

    #[tokio::test]
    async fn test_classify_link_chain() {
        let (generator, _pipeline) = create_generator();
        let base = Url::parse("https://site.example/").unwrap();

        // Fragment dropped
        assert_eq!(generator.classify_link("#section", &base, "site.example"), None);
        // Relative resolved
        assert_eq!(
            generator.classify_link("/about", &base, "site.example"),
            Some("https://site.example/about".to_string())
        );
        // External dropped
        assert_eq!(
            generator.classify_link("https://other.example/", &base, "site.example"),
            None
        );
        // Non-http dropped
        assert_eq!(
            generator.classify_link("mailto:a@site.example", &base, "site.example"),
            None
        );
        // Subdomain accepted
        assert_eq!(
            generator.classify_link("https://blog.site.example/p", &base, "site.example"),
            Some("https://blog.site.example/p".to_string())
        );
    }

    #[tokio::test]
    async fn test_classify_link_allows_external_when_configured() {
        let store = SqliteStorage::new_in_memory().unwrap();
        let pipeline = PersistencePipeline::spawn(store, &PipelineConfig::default());
        let fetcher = LinkFetcher::new(&HttpConfig::default(), 2).unwrap();
        let generator = SiteMapGenerator::new(fetcher, HtmlPageParser, pipeline.handle(), true);

        let base = Url::parse("https://site.example/").unwrap();
        assert_eq!(
            generator.classify_link("https://other.example/page", &base, "site.example"),
            Some("https://other.example/page".to_string())
        );
    }
}
