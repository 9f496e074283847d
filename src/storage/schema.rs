//! Database schema definitions
//!
//! A site is identified by (scheme, hostname, port); a page by its path
//! within a site. Outbound links live in their own table, position-ordered.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per (scheme, hostname, port) site
CREATE TABLE IF NOT EXISTS sites (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    scheme TEXT NOT NULL,
    hostname TEXT NOT NULL,
    port INTEGER NOT NULL,
    UNIQUE(scheme, hostname, port)
);

CREATE INDEX IF NOT EXISTS idx_sites_hostname ON sites(hostname);

-- One row per page within a site
CREATE TABLE IF NOT EXISTS pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    site_id INTEGER NOT NULL REFERENCES sites(id),
    path TEXT NOT NULL,
    title TEXT NOT NULL,
    html TEXT NOT NULL,
    first_seen_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE(site_id, path)
);

CREATE INDEX IF NOT EXISTS idx_pages_site ON pages(site_id);

-- Outbound links of a page, in discovery order
CREATE TABLE IF NOT EXISTS page_links (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    page_id INTEGER NOT NULL REFERENCES pages(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    href TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_page_links_page ON page_links(page_id);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
