//! Submission discovery and classification.
//!
//! A submission is an ephemeral bundle of objects under
//! `submissions/{id}/`: one metadata document, audio tracks and an
//! optional artwork image. The parser classifies the raw object keys
//! and produces the pipeline's input.

mod models;
mod parser;

pub use models::{SubmissionMetadata, TrackMetadata, VinylOptions};
pub use parser::{ParsedSubmission, SubmissionParser};

use thiserror::Error;

use crate::object_store::ObjectStoreError;

/// Errors raised while discovering and parsing a submission.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("No metadata document found for submission {0}")]
    MissingMetadata(String),

    #[error("Invalid metadata document for submission {0}: {1}")]
    InvalidMetadata(String, serde_json::Error),

    #[error("No audio tracks found for submission {0}")]
    NoTracksFound(String),

    #[error("Store error: {0}")]
    Store(#[from] ObjectStoreError),
}
