use crate::storage::{PageFilter, PageStore, StorageResult, StoredPage};
use crate::{Result, SitegraphError};
use url::Url;

/// Read-only view over stored crawl data
pub struct Observer<'a, S: PageStore> {
    store: &'a S,
}

impl<'a, S: PageStore> Observer<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Pages of sites matching the filter, ordered by site then path
    pub fn related_pages(&self, filter: &PageFilter) -> StorageResult<Vec<StoredPage>> {
        self.store.pages_for_host(filter)
    }

    /// Convenience form: derive the filter from a URL's scheme/host/port
    pub fn related_pages_for_url(&self, raw_url: &str, limit: u32) -> Result<Vec<StoredPage>> {
        let url = Url::parse(raw_url)
            .map_err(|e| SitegraphError::InvalidInput(format!("invalid URL '{raw_url}': {e}")))?;

        let hostname = url
            .host_str()
            .ok_or_else(|| SitegraphError::InvalidInput(format!("'{raw_url}' has no host")))?
            .to_string();

        let filter = PageFilter {
            scheme: url.scheme().to_string(),
            hostname,
            port: url.port_or_known_default(),
            limit,
        };

        Ok(self.related_pages(&filter)?)
    }
}
