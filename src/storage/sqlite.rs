//! SQLite implementation of the PageStore trait

use crate::crawler::PageInfo;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{
    PageFilter, PageRecord, PageStore, StorageError, StorageResult, StoredPage, UpsertOutcome,
};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::path::Path;
use url::Url;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens (or creates) the database at `path`
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn site_id(tx: &Transaction<'_>, scheme: &str, host: &str, port: u16) -> StorageResult<i64> {
        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM sites WHERE scheme = ?1 AND hostname = ?2 AND port = ?3",
                params![scheme, host, port],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(id) = existing {
            return Ok(id);
        }

        tx.execute(
            "INSERT INTO sites (scheme, hostname, port) VALUES (?1, ?2, ?3)",
            params![scheme, host, port],
        )?;
        Ok(tx.last_insert_rowid())
    }

    fn replace_links(tx: &Transaction<'_>, page_id: i64, links: &[String]) -> StorageResult<()> {
        tx.execute("DELETE FROM page_links WHERE page_id = ?1", params![page_id])?;

        let mut stmt =
            tx.prepare("INSERT INTO page_links (page_id, position, href) VALUES (?1, ?2, ?3)")?;
        for (position, href) in links.iter().enumerate() {
            stmt.execute(params![page_id, position as i64, href])?;
        }
        Ok(())
    }
}

/// Splits a page URL into its storage key parts
fn page_key(raw: &str) -> StorageResult<(Url, String, u16)> {
    let url = Url::parse(raw).map_err(|e| StorageError::InvalidPageUrl {
        url: raw.to_string(),
        message: e.to_string(),
    })?;

    let host = url
        .host_str()
        .ok_or_else(|| StorageError::InvalidPageUrl {
            url: raw.to_string(),
            message: "missing host".to_string(),
        })?
        .to_string();

    let port = url.port_or_known_default().unwrap_or(0);

    Ok((url, host, port))
}

impl PageStore for SqliteStorage {
    fn upsert_page(&mut self, page: &PageInfo) -> StorageResult<UpsertOutcome> {
        let (url, host, port) = page_key(&page.url)?;
        let scheme = url.scheme().to_string();
        let path = url.path().to_string();

        let tx = self.conn.transaction()?;
        let site_id = Self::site_id(&tx, &scheme, &host, port)?;

        let existing: Option<(i64, String, String)> = tx
            .query_row(
                "SELECT id, title, html FROM pages WHERE site_id = ?1 AND path = ?2",
                params![site_id, path],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let now = Utc::now().to_rfc3339();

        let outcome = match existing {
            Some((_, ref title, ref html)) if *title == page.title && *html == page.html => {
                UpsertOutcome::Unchanged
            }
            Some((page_id, _, _)) => {
                tx.execute(
                    "UPDATE pages SET title = ?1, html = ?2, updated_at = ?3 WHERE id = ?4",
                    params![page.title, page.html, now, page_id],
                )?;
                Self::replace_links(&tx, page_id, &page.links)?;
                UpsertOutcome::Updated
            }
            None => {
                tx.execute(
                    "INSERT INTO pages (site_id, path, title, html, first_seen_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![site_id, path, page.title, page.html, now, now],
                )?;
                let page_id = tx.last_insert_rowid();
                Self::replace_links(&tx, page_id, &page.links)?;
                UpsertOutcome::Inserted
            }
        };

        tx.commit()?;
        Ok(outcome)
    }

    fn get_page(&self, raw_url: &str) -> StorageResult<Option<PageRecord>> {
        let (url, host, port) = page_key(raw_url)?;

        let record: Option<(i64, PageRecord)> = self
            .conn
            .query_row(
                "SELECT p.id, s.scheme, s.hostname, s.port, p.path, p.title, p.html,
                        p.first_seen_at, p.updated_at
                 FROM pages p JOIN sites s ON s.id = p.site_id
                 WHERE s.scheme = ?1 AND s.hostname = ?2 AND s.port = ?3 AND p.path = ?4",
                params![url.scheme(), host, port, url.path()],
                |row| {
                    Ok((
                        row.get(0)?,
                        PageRecord {
                            scheme: row.get(1)?,
                            hostname: row.get(2)?,
                            port: row.get(3)?,
                            path: row.get(4)?,
                            title: row.get(5)?,
                            html: row.get(6)?,
                            links: Vec::new(),
                            first_seen_at: row.get(7)?,
                            updated_at: row.get(8)?,
                        },
                    ))
                },
            )
            .optional()?;

        let Some((page_id, mut record)) = record else {
            return Ok(None);
        };

        let mut stmt = self
            .conn
            .prepare("SELECT href FROM page_links WHERE page_id = ?1 ORDER BY position")?;
        record.links = stmt
            .query_map(params![page_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(Some(record))
    }

    fn pages_for_host(&self, filter: &PageFilter) -> StorageResult<Vec<StoredPage>> {
        let limit = if filter.limit == 0 {
            -1i64
        } else {
            filter.limit as i64
        };

        let map_row = |row: &rusqlite::Row<'_>| {
            Ok(StoredPage {
                scheme: row.get(0)?,
                hostname: row.get(1)?,
                port: row.get(2)?,
                path: row.get(3)?,
                title: row.get(4)?,
            })
        };

        let pages = match filter.port {
            Some(port) => {
                let mut stmt = self.conn.prepare(
                    "SELECT s.scheme, s.hostname, s.port, p.path, p.title
                     FROM pages p JOIN sites s ON s.id = p.site_id
                     WHERE s.scheme = ?1 AND s.hostname LIKE '%' || ?2 || '%' AND s.port = ?3
                     ORDER BY s.id, p.path
                     LIMIT ?4",
                )?;
                let rows = stmt
                    .query_map(params![filter.scheme, filter.hostname, port, limit], map_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
            None => {
                let mut stmt = self.conn.prepare(
                    "SELECT s.scheme, s.hostname, s.port, p.path, p.title
                     FROM pages p JOIN sites s ON s.id = p.site_id
                     WHERE s.scheme = ?1 AND s.hostname LIKE '%' || ?2 || '%'
                     ORDER BY s.id, p.path
                     LIMIT ?3",
                )?;
                let rows = stmt
                    .query_map(params![filter.scheme, filter.hostname, limit], map_row)?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            }
        };

        Ok(pages)
    }

    fn count_pages(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(url: &str, title: &str, html: &str, links: &[&str]) -> PageInfo {
        PageInfo {
            url: url.to_string(),
            title: title.to_string(),
            html: html.to_string(),
            links: links.iter().map(|l| l.to_string()).collect(),
        }
    }

    fn filter(hostname: &str) -> PageFilter {
        PageFilter {
            scheme: "https".to_string(),
            hostname: hostname.to_string(),
            port: None,
            limit: 0,
        }
    }

    #[test]
    fn test_insert_new_page() {
        let mut store = SqliteStorage::new_in_memory().unwrap();
        let outcome = store
            .upsert_page(&page("https://example.com/a", "A", "<html>a</html>", &[]))
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Inserted);
        assert_eq!(store.count_pages().unwrap(), 1);
    }

    #[test]
    fn test_upsert_unchanged_is_noop() {
        let mut store = SqliteStorage::new_in_memory().unwrap();
        let p = page("https://example.com/a", "A", "<html>a</html>", &[]);
        store.upsert_page(&p).unwrap();
        let outcome = store.upsert_page(&p).unwrap();
        assert_eq!(outcome, UpsertOutcome::Unchanged);
        assert_eq!(store.count_pages().unwrap(), 1);
    }

    #[test]
    fn test_upsert_changed_updates_in_place() {
        let mut store = SqliteStorage::new_in_memory().unwrap();
        store
            .upsert_page(&page("https://example.com/a", "A", "<html>v1</html>", &[]))
            .unwrap();
        let outcome = store
            .upsert_page(&page("https://example.com/a", "A", "<html>v2</html>", &[]))
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Updated);
        assert_eq!(store.count_pages().unwrap(), 1);

        let record = store.get_page("https://example.com/a").unwrap().unwrap();
        assert_eq!(record.html, "<html>v2</html>");
    }

    #[test]
    fn test_links_stored_in_order() {
        let mut store = SqliteStorage::new_in_memory().unwrap();
        store
            .upsert_page(&page(
                "https://example.com/",
                "Home",
                "<html></html>",
                &["https://example.com/b", "https://example.com/a"],
            ))
            .unwrap();

        let record = store.get_page("https://example.com/").unwrap().unwrap();
        assert_eq!(
            record.links,
            vec!["https://example.com/b", "https://example.com/a"]
        );
    }

    #[test]
    fn test_links_rewritten_on_update() {
        let mut store = SqliteStorage::new_in_memory().unwrap();
        store
            .upsert_page(&page(
                "https://example.com/",
                "Home",
                "<html>v1</html>",
                &["https://example.com/old"],
            ))
            .unwrap();
        store
            .upsert_page(&page(
                "https://example.com/",
                "Home",
                "<html>v2</html>",
                &["https://example.com/new"],
            ))
            .unwrap();

        let record = store.get_page("https://example.com/").unwrap().unwrap();
        assert_eq!(record.links, vec!["https://example.com/new"]);
    }

    #[test]
    fn test_same_path_different_scheme_is_distinct() {
        let mut store = SqliteStorage::new_in_memory().unwrap();
        store
            .upsert_page(&page("https://example.com/a", "S", "<html></html>", &[]))
            .unwrap();
        store
            .upsert_page(&page("http://example.com/a", "P", "<html></html>", &[]))
            .unwrap();
        assert_eq!(store.count_pages().unwrap(), 2);
    }

    #[test]
    fn test_invalid_url_rejected() {
        let mut store = SqliteStorage::new_in_memory().unwrap();
        let result = store.upsert_page(&page("not a url", "X", "", &[]));
        assert!(matches!(
            result,
            Err(StorageError::InvalidPageUrl { .. })
        ));
    }

    #[test]
    fn test_pages_for_host_substring_and_order() {
        let mut store = SqliteStorage::new_in_memory().unwrap();
        store
            .upsert_page(&page("https://example.com/b", "B", "", &[]))
            .unwrap();
        store
            .upsert_page(&page("https://example.com/a", "A", "", &[]))
            .unwrap();
        store
            .upsert_page(&page("https://blog.example.com/z", "Z", "", &[]))
            .unwrap();
        store
            .upsert_page(&page("https://unrelated.net/x", "X", "", &[]))
            .unwrap();

        let pages = store.pages_for_host(&filter("example.com")).unwrap();
        assert_eq!(pages.len(), 3);
        // Ordered by site id, then path within a site
        assert_eq!(pages[0].path, "/a");
        assert_eq!(pages[1].path, "/b");
        assert_eq!(pages[2].path, "/z");
    }

    #[test]
    fn test_pages_for_host_limit() {
        let mut store = SqliteStorage::new_in_memory().unwrap();
        for path in ["/a", "/b", "/c"] {
            store
                .upsert_page(&page(
                    &format!("https://example.com{path}"),
                    "T",
                    "",
                    &[],
                ))
                .unwrap();
        }

        let mut f = filter("example.com");
        f.limit = 2;
        assert_eq!(store.pages_for_host(&f).unwrap().len(), 2);
    }

    #[test]
    fn test_pages_for_host_port_filter() {
        let mut store = SqliteStorage::new_in_memory().unwrap();
        store
            .upsert_page(&page("https://example.com/a", "A", "", &[]))
            .unwrap();
        store
            .upsert_page(&page("https://example.com:8443/b", "B", "", &[]))
            .unwrap();

        let mut f = filter("example.com");
        f.port = Some(8443);
        let pages = store.pages_for_host(&f).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].path, "/b");
    }

    #[test]
    fn test_get_page_missing() {
        let store = SqliteStorage::new_in_memory().unwrap();
        assert!(store.get_page("https://example.com/nope").unwrap().is_none());
    }
}
