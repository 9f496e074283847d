//! Storage module for persisting crawl data
//!
//! This module handles all database operations for the crawler:
//! - SQLite database initialization and schema management
//! - Upserting pages keyed by (scheme, hostname, port, path)
//! - The read path backing the `observe` command

mod schema;
mod sqlite;
mod traits;

pub use schema::initialize_schema;
pub use sqlite::SqliteStorage;
pub use traits::{
    PageFilter, PageRecord, PageStore, StorageError, StorageResult, StoredPage, UpsertOutcome,
};
