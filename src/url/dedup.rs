use std::collections::HashSet;

/// Run-scoped set of URLs already handed to the persistence pipeline
///
/// Append-only for the duration of one crawl run; a URL registered here is
/// never fetched or saved again within the same run. Mutated only from the
/// engine's control flow between fan-out rounds, so it needs no locking.
#[derive(Debug, Default)]
pub struct DedupCache {
    seen: HashSet<String>,
}

impl DedupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a URL; returns false if it was already present
    pub fn insert(&mut self, url: &str) -> bool {
        self.seen.insert(url.to_string())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_contains() {
        let mut cache = DedupCache::new();
        assert!(!cache.contains("https://example.com/"));
        assert!(cache.insert("https://example.com/"));
        assert!(cache.contains("https://example.com/"));
    }

    #[test]
    fn test_insert_twice_reports_duplicate() {
        let mut cache = DedupCache::new();
        assert!(cache.insert("https://example.com/a"));
        assert!(!cache.insert("https://example.com/a"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_distinct_urls_counted() {
        let mut cache = DedupCache::new();
        cache.insert("https://example.com/a");
        cache.insert("https://example.com/b");
        assert_eq!(cache.len(), 2);
        assert!(!cache.is_empty());
    }
}
