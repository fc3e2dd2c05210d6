//! Classifies the objects of a submission by filename heuristics.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use super::models::SubmissionMetadata;
use super::SubmissionError;
use crate::object_store::ObjectStore;

/// Extensions the parser classifies as images.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];

/// Extensions the parser classifies as audio. Broader than what the
/// transcoder supports; unsupported formats fail later at the per-track
/// boundary instead of being silently dropped here.
const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "flac", "aiff", "aif", "m4a", "aac", "ogg"];

/// A classified, parsed submission ready for processing.
#[derive(Debug)]
pub struct ParsedSubmission {
    pub metadata: SubmissionMetadata,
    /// Storage key of the artwork image, if one was found.
    pub artwork_key: Option<String>,
    /// Track file keys in intended track order (lexicographic by key,
    /// which the upload naming convention guarantees).
    pub track_keys: Vec<String>,
}

/// Discovers and classifies the files of a submission.
pub struct SubmissionParser {
    store: Arc<dyn ObjectStore>,
}

impl SubmissionParser {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Parse the submission stored under `submissions/{submission_id}/`.
    pub async fn parse(&self, submission_id: &str) -> Result<ParsedSubmission, SubmissionError> {
        let prefix = format!("submissions/{}", submission_id);
        let keys = self.store.list(&prefix).await?;

        debug!("Submission {} has {} objects", submission_id, keys.len());

        let classified = classify_keys(&prefix, &keys);

        let metadata_key = classified
            .metadata_key
            .ok_or_else(|| SubmissionError::MissingMetadata(submission_id.to_string()))?;

        let raw = self.store.get(&metadata_key).await?;
        let metadata: SubmissionMetadata = serde_json::from_slice(&raw)
            .map_err(|e| SubmissionError::InvalidMetadata(submission_id.to_string(), e))?;

        if classified.track_keys.is_empty() {
            return Err(SubmissionError::NoTracksFound(submission_id.to_string()));
        }

        info!(
            "Parsed submission {}: {} - {} ({} track files, artwork: {})",
            submission_id,
            metadata.artist_name,
            metadata.release_name,
            classified.track_keys.len(),
            classified.artwork_key.is_some(),
        );

        Ok(ParsedSubmission {
            metadata,
            artwork_key: classified.artwork_key,
            track_keys: classified.track_keys,
        })
    }

    /// List the ids of submissions currently present in storage, derived
    /// from the distinct top-level folders under `submissions/`.
    pub async fn list_pending(&self) -> Result<Vec<String>, SubmissionError> {
        let keys = self.store.list("submissions").await?;

        let mut ids = BTreeSet::new();
        for key in keys {
            let rel = key.trim_start_matches("submissions/");
            if let Some((id, _)) = rel.split_once('/') {
                ids.insert(id.to_string());
            }
        }

        Ok(ids.into_iter().collect())
    }
}

struct ClassifiedKeys {
    metadata_key: Option<String>,
    artwork_key: Option<String>,
    track_keys: Vec<String>,
}

/// Classify the object keys of one submission.
fn classify_keys(prefix: &str, keys: &[String]) -> ClassifiedKeys {
    let mut metadata_key = None;
    let mut artwork_key = None;
    let mut root_image_fallback = None;
    let mut track_keys = Vec::new();
    let mut root_audio_fallback = Vec::new();

    for key in keys {
        let rel = key
            .strip_prefix(prefix)
            .map(|r| r.trim_start_matches('/'))
            .unwrap_or(key);
        let at_root = !rel.contains('/');
        let lower = key.to_lowercase();

        match extension(key).as_deref() {
            Some("json") => {
                // Prefer the conventional metadata.json over any other
                // JSON document in the bundle.
                if rel.eq_ignore_ascii_case("metadata.json") || metadata_key.is_none() {
                    metadata_key = Some(key.clone());
                }
            }
            Some(ext) if IMAGE_EXTENSIONS.contains(&ext) => {
                if lower.contains("artwork") || lower.contains("cover") {
                    artwork_key.get_or_insert_with(|| key.clone());
                } else if at_root {
                    root_image_fallback.get_or_insert_with(|| key.clone());
                }
            }
            Some(ext) if AUDIO_EXTENSIONS.contains(&ext) => {
                if key.split('/').any(|seg| seg == "tracks") {
                    track_keys.push(key.clone());
                } else if at_root {
                    root_audio_fallback.push(key.clone());
                }
            }
            _ => {}
        }
    }

    if track_keys.is_empty() {
        track_keys = root_audio_fallback;
    }
    track_keys.sort();

    ClassifiedKeys {
        metadata_key,
        artwork_key: artwork_key.or(root_image_fallback),
        track_keys,
    }
}

fn extension(key: &str) -> Option<String> {
    Path::new(key)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}
