//! Catalog: release documents, the denormalized index, and the writer
//! that persists both.

pub mod ids;
pub mod models;
mod schema;
mod store;
mod writer;

pub use models::{
    ProcessedRelease, ProcessedTrack, ReleaseDefaults, ReleaseDocument, ReleaseIndex,
    ReleaseSummary,
};
pub use schema::{CATALOG_SCHEMA_SQL, RELEASES_MASTER_PATH};
pub use store::{CatalogStore, SqliteCatalogStore};
pub use writer::{CatalogError, CatalogWriter};
