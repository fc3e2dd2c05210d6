//! Pipeline orchestration.
//!
//! Sequences parser, artwork, audio and catalog stages for one
//! submission, with fatal vs. per-track error handling, explicit
//! transcoding-engine teardown and source cleanup on success.

mod manager;

pub use manager::{PipelineConfig, PipelineManager, ProcessReport};

use thiserror::Error;

use crate::audio::TranscodeError;
use crate::catalog::CatalogError;
use crate::object_store::ObjectStoreError;
use crate::submission::SubmissionError;

/// Fatal pipeline errors. Per-track failures never surface here; they
/// degrade individual tracks inside the loop instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    Submission(#[from] SubmissionError),

    #[error("{0}")]
    Catalog(#[from] CatalogError),

    #[error("Transcoding engine error: {0}")]
    Engine(#[from] TranscodeError),

    #[error("Store error: {0}")]
    Store(#[from] ObjectStoreError),

    #[error("Submission {0} is already being processed")]
    SubmissionBusy(String),
}
