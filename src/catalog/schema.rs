//! Database schema for the catalog document store.
//!
//! Two tables:
//! - releases: one JSON document per release, keyed by release id
//! - system_documents: singleton documents (the releases-master index)

/// SQL schema for the catalog database.
pub const CATALOG_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS releases (
    id TEXT PRIMARY KEY,
    document TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS system_documents (
    path TEXT PRIMARY KEY,
    document TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_releases_created_at ON releases(created_at);
"#;

/// Document path of the denormalized release index.
pub const RELEASES_MASTER_PATH: &str = "system/releases-master";
