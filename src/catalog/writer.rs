//! Catalog writer: release document upsert and index maintenance.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use super::models::{ProcessedRelease, ReleaseDefaults, ReleaseDocument, ReleaseSummary};
use super::store::CatalogStore;

/// A catalog write failure is fatal for the submission as a whole.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog write failed: {0}")]
    Write(#[from] anyhow::Error),
}

/// Assembles and persists the release document plus its index entry.
pub struct CatalogWriter {
    store: Arc<dyn CatalogStore>,
    defaults: ReleaseDefaults,
}

impl CatalogWriter {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self {
            store,
            defaults: ReleaseDefaults::default(),
        }
    }

    /// Write the release document (idempotent per release id) and then
    /// maintain the index.
    ///
    /// The index update is a read-modify-write on one shared document
    /// with no transactional guarantee: concurrent writers race and the
    /// last write wins. Known limitation, kept by design.
    pub fn write(&self, release: &ProcessedRelease) -> Result<ReleaseDocument, CatalogError> {
        let doc = ReleaseDocument::build(release, &self.defaults);
        self.store.upsert_release(&doc)?;

        let mut index = self.store.get_index()?.unwrap_or_default();
        index.upsert(ReleaseSummary::from_document(&doc));
        index.last_updated = chrono::Utc::now().timestamp();
        self.store.put_index(&index)?;

        info!(
            "Cataloged release {} ({} tracks, {} total releases)",
            doc.id,
            doc.tracks.len(),
            index.total_releases
        );

        Ok(doc)
    }
}
