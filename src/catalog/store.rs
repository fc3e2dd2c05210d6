//! SQLite-backed catalog document store.

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use super::models::{ReleaseDocument, ReleaseIndex};
use super::schema::{CATALOG_SCHEMA_SQL, RELEASES_MASTER_PATH};

/// Trait for catalog persistence. The pipeline only creates documents;
/// the storefront and admin workflows own every later mutation.
pub trait CatalogStore: Send + Sync {
    /// Idempotent upsert of a release document keyed by release id.
    fn upsert_release(&self, doc: &ReleaseDocument) -> Result<()>;

    /// Fetch a release document by id.
    fn get_release(&self, id: &str) -> Result<Option<ReleaseDocument>>;

    /// Fetch the denormalized index document, if it exists yet.
    fn get_index(&self) -> Result<Option<ReleaseIndex>>;

    /// Write the whole index document back.
    fn put_index(&self, index: &ReleaseIndex) -> Result<()>;
}

/// SQLite implementation of CatalogStore. Documents are stored as JSON
/// text; the index lives in the singleton system_documents table.
pub struct SqliteCatalogStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCatalogStore {
    /// Open or create a catalog database.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open catalog database: {:?}", path))?;
        conn.execute_batch(CATALOG_SCHEMA_SQL)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory database (tests and tooling).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(CATALOG_SCHEMA_SQL)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

impl CatalogStore for SqliteCatalogStore {
    fn upsert_release(&self, doc: &ReleaseDocument) -> Result<()> {
        let json = serde_json::to_string(doc)?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO releases (id, document, created_at) VALUES (?1, ?2, ?3)",
            params![doc.id, json, doc.created_at],
        )?;
        Ok(())
    }

    fn get_release(&self, id: &str) -> Result<Option<ReleaseDocument>> {
        let conn = self.conn.lock().unwrap();
        let json: Option<String> = conn
            .query_row(
                "SELECT document FROM releases WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn get_index(&self) -> Result<Option<ReleaseIndex>> {
        let conn = self.conn.lock().unwrap();
        let json: Option<String> = conn
            .query_row(
                "SELECT document FROM system_documents WHERE path = ?1",
                params![RELEASES_MASTER_PATH],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn put_index(&self, index: &ReleaseIndex) -> Result<()> {
        let json = serde_json::to_string(index)?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO system_documents (path, document, updated_at) VALUES (?1, ?2, ?3)",
            params![RELEASES_MASTER_PATH, json, index.last_updated],
        )?;
        Ok(())
    }
}
