//! Common test infrastructure
//!
//! Builds a full pipeline against a temp-dir object store, an
//! in-memory catalog store, a stub transcoding engine and a disabled
//! notifier. Tests should only import from this module.

// Not every test binary uses every helper
#![allow(dead_code)]

mod engine;
mod fixtures;

pub use engine::{StubEngine, StubEngineFactory};
#[allow(unused_imports)]
pub use fixtures::{artwork_png, metadata_json, seed_submission};

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use pressroom_ingest_server::catalog::SqliteCatalogStore;
use pressroom_ingest_server::notifier::EmailNotifier;
use pressroom_ingest_server::object_store::FsObjectStore;
use pressroom_ingest_server::pipeline::{PipelineConfig, PipelineManager};

pub const CDN_BASE: &str = "https://cdn.test";
pub const PLACEHOLDER_URL: &str = "https://cdn.test/static/placeholder-artwork.webp";

/// Everything a pipeline test needs, wired together.
pub struct TestHarness {
    _tmp: tempfile::TempDir,
    pub store: Arc<FsObjectStore>,
    pub catalog: Arc<SqliteCatalogStore>,
    pub pipeline: Arc<PipelineManager>,
    /// Number of engine shutdowns observed.
    pub engine_shutdowns: Arc<AtomicUsize>,
    /// Number of engine acquisitions observed.
    pub engine_acquisitions: Arc<AtomicUsize>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_engine_delay(0)
    }

    /// A harness whose stub engine sleeps `delay_ms` per transcode,
    /// for tests that need an invocation to stay in flight.
    pub fn with_engine_delay(delay_ms: u64) -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let store = Arc::new(FsObjectStore::new(tmp.path().join("storage")).unwrap());
        let catalog = Arc::new(SqliteCatalogStore::in_memory().unwrap());

        let factory = StubEngineFactory::new(tmp.path().join("scratch"), delay_ms);
        let engine_shutdowns = factory.shutdowns();
        let engine_acquisitions = factory.acquisitions();

        let pipeline = Arc::new(PipelineManager::new(
            store.clone(),
            catalog.clone(),
            Arc::new(factory),
            Arc::new(EmailNotifier::disabled()),
            PipelineConfig {
                cdn_base_url: CDN_BASE.to_string(),
                placeholder_artwork_url: PLACEHOLDER_URL.to_string(),
            },
        ));

        Self {
            _tmp: tmp,
            store,
            catalog,
            pipeline,
            engine_shutdowns,
            engine_acquisitions,
        }
    }
}
