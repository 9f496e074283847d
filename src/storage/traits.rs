//! Storage traits and error types
//!
//! The crawl engine never talks to storage directly; it only produces
//! `PageInfo` values that the pipeline consumer writes through this trait.
//! The `observe` read path goes through the same trait.

use crate::crawler::PageInfo;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid page URL '{url}': {message}")]
    InvalidPageUrl { url: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Outcome of an upsert, mostly useful for logging and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The page was new and has been inserted
    Inserted,
    /// Title or HTML changed and the row was rewritten
    Updated,
    /// An identical row already existed; nothing was written
    Unchanged,
}

/// Filter for the read-only observe path
#[derive(Debug, Clone)]
pub struct PageFilter {
    pub scheme: String,

    /// Substring match against the stored hostname
    pub hostname: String,

    /// When set, only pages of sites on exactly this port
    pub port: Option<u16>,

    /// Maximum rows returned; 0 means no limit
    pub limit: u32,
}

/// One row of the observe listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPage {
    pub scheme: String,
    pub hostname: String,
    pub port: u16,
    pub path: String,
    pub title: String,
}

impl StoredPage {
    /// Reassembles the page URL, omitting the scheme's default port
    pub fn url(&self) -> String {
        let default_port = match self.scheme.as_str() {
            "http" => 80,
            "https" => 443,
            _ => 0,
        };

        if self.port == default_port {
            format!("{}://{}{}", self.scheme, self.hostname, self.path)
        } else {
            format!("{}://{}:{}{}", self.scheme, self.hostname, self.port, self.path)
        }
    }
}

/// Full page record including content and outbound links
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub scheme: String,
    pub hostname: String,
    pub port: u16,
    pub path: String,
    pub title: String,
    pub html: String,
    /// Outbound links in discovery order
    pub links: Vec<String>,
    pub first_seen_at: String,
    pub updated_at: String,
}

/// Trait for storage backend implementations
pub trait PageStore {
    /// Durable upsert of one page, keyed by (scheme, hostname, port, path)
    ///
    /// Inserts when the URL is new, updates when title or HTML changed
    /// (rewriting the outbound links), and writes nothing when unchanged.
    fn upsert_page(&mut self, page: &PageInfo) -> StorageResult<UpsertOutcome>;

    /// Looks up one page by its full URL
    fn get_page(&self, url: &str) -> StorageResult<Option<PageRecord>>;

    /// Lists stored pages matching the filter, ordered by site then path
    fn pages_for_host(&self, filter: &PageFilter) -> StorageResult<Vec<StoredPage>>;

    /// Total number of stored pages
    fn count_pages(&self) -> StorageResult<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_page_url_omits_default_port() {
        let page = StoredPage {
            scheme: "https".to_string(),
            hostname: "example.com".to_string(),
            port: 443,
            path: "/about".to_string(),
            title: "About".to_string(),
        };
        assert_eq!(page.url(), "https://example.com/about");
    }

    #[test]
    fn test_stored_page_url_keeps_explicit_port() {
        let page = StoredPage {
            scheme: "http".to_string(),
            hostname: "example.com".to_string(),
            port: 8080,
            path: "/".to_string(),
            title: "Home".to_string(),
        };
        assert_eq!(page.url(), "http://example.com:8080/");
    }
}
