//! URL handling module for sitegraph
//!
//! Pure classification and resolution functions used by the crawl engine to
//! decide which discovered hrefs survive into the next frontier, plus the
//! run-scoped dedup cache.

mod classify;
mod dedup;

pub use classify::{
    is_fragment_reference, is_http_scheme, is_internal_host, is_relative, resolve_relative,
    site_base_url,
};
pub use dedup::DedupCache;
