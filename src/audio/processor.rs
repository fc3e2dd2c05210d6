//! Per-track processing: format detection, transcoding, preview cut.
//!
//! Each track is processed independently; any failure is caught at the
//! track boundary and degrades that track to empty URLs instead of
//! aborting the submission.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::engine::{
    preview_spec, TranscodeEngine, TranscodeError, FULL_MP3_BITRATE_KBPS,
};
use crate::catalog::ids::title_slug;
use crate::catalog::models::ProcessedTrack;
use crate::object_store::{public_url, ObjectStore, ObjectStoreError};
use crate::submission::TrackMetadata;

/// Source formats the state machine accepts. Anything else fails the
/// track outright.
const SUPPORTED_SOURCE_FORMATS: &[&str] = &["wav", "mp3", "flac", "aiff", "aif"];

#[derive(Debug, Error)]
pub enum TrackProcessError {
    #[error("Transcode error: {0}")]
    Transcode(#[from] TranscodeError),

    #[error("Store error: {0}")]
    Store(#[from] ObjectStoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Transforms one physical audio file plus its declared metadata into a
/// ProcessedTrack, reusing the invocation's shared engine.
pub struct TrackProcessor<'a> {
    engine: &'a dyn TranscodeEngine,
    store: Arc<dyn ObjectStore>,
    cdn_base_url: String,
}

impl<'a> TrackProcessor<'a> {
    pub fn new(
        engine: &'a dyn TranscodeEngine,
        store: Arc<dyn ObjectStore>,
        cdn_base_url: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            store,
            cdn_base_url: cdn_base_url.into(),
        }
    }

    /// Process one track. Never fails: errors degrade the track to a
    /// ProcessedTrack with empty URL fields.
    pub async fn process(
        &self,
        release_id: &str,
        meta: &TrackMetadata,
        source_key: &str,
    ) -> ProcessedTrack {
        match self.try_process(release_id, meta, source_key).await {
            Ok(track) => {
                info!(
                    "Processed track {:02} \"{}\" for release {}",
                    meta.track_number, meta.title, release_id
                );
                track
            }
            Err(e) => {
                warn!(
                    "Track {:02} \"{}\" failed, keeping degraded entry: {}",
                    meta.track_number, meta.title, e
                );
                ProcessedTrack::degraded(meta)
            }
        }
    }

    async fn try_process(
        &self,
        release_id: &str,
        meta: &TrackMetadata,
        source_key: &str,
    ) -> Result<ProcessedTrack, TrackProcessError> {
        let ext = source_extension(source_key)?;

        let nn = format!("{:02}", meta.track_number);
        let slug = title_slug(&meta.title);
        let scratch = self.engine.scratch_dir();

        // Pull the source down next to the engine
        let source_data = self.store.get(source_key).await?;
        let source_path = scratch.join(format!("{}-source.{}", nn, ext));
        tokio::fs::write(&source_path, &source_data).await?;

        let mp3_path = scratch.join(format!("{}.mp3", nn));
        let wav_path = scratch.join(format!("{}.wav", nn));
        let preview_path = scratch.join(format!("{}-preview.mp3", nn));

        // State machine keyed by source extension: keep the rendition
        // the source already is, derive the other; lossless sources
        // derive both.
        let (mp3_data, wav_data) = match ext.as_str() {
            "wav" => {
                self.engine
                    .transcode_to_mp3(&source_path, &mp3_path, FULL_MP3_BITRATE_KBPS)
                    .await?;
                (tokio::fs::read(&mp3_path).await?, source_data)
            }
            "mp3" => {
                self.engine.transcode_to_wav(&source_path, &wav_path).await?;
                (source_data, tokio::fs::read(&wav_path).await?)
            }
            "flac" | "aiff" | "aif" => {
                self.engine
                    .transcode_to_mp3(&source_path, &mp3_path, FULL_MP3_BITRATE_KBPS)
                    .await?;
                self.engine.transcode_to_wav(&source_path, &wav_path).await?;
                (
                    tokio::fs::read(&mp3_path).await?,
                    tokio::fs::read(&wav_path).await?,
                )
            }
            other => {
                return Err(TranscodeError::UnsupportedFormat(other.to_string()).into());
            }
        };

        // Preview always comes off the MP3 rendition
        let probe = self.engine.probe(&source_path).await?;
        debug!(
            "Probed {}: {:.1}s {} ({}) {:?} Hz",
            source_key, probe.duration_secs, probe.codec, probe.format, probe.sample_rate
        );
        let spec = preview_spec(probe.duration_secs);
        let mp3_rendition_path = if ext == "mp3" { &source_path } else { &mp3_path };
        self.engine
            .extract_preview(mp3_rendition_path, &preview_path, &spec)
            .await?;
        let preview_data = tokio::fs::read(&preview_path).await?;

        let mp3_key = format!("releases/{}/tracks/{}-{}.mp3", release_id, nn, slug);
        let wav_key = format!("releases/{}/tracks/{}-{}.wav", release_id, nn, slug);
        let preview_key = format!("releases/{}/previews/{}-preview.mp3", release_id, nn);

        self.store.put(&mp3_key, &mp3_data).await?;
        self.store.put(&wav_key, &wav_data).await?;
        self.store.put(&preview_key, &preview_data).await?;

        Ok(ProcessedTrack::complete(
            meta,
            public_url(&self.cdn_base_url, &mp3_key),
            public_url(&self.cdn_base_url, &wav_key),
            public_url(&self.cdn_base_url, &preview_key),
        ))
    }
}

fn source_extension(key: &str) -> Result<String, TranscodeError> {
    let ext = Path::new(key)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .ok_or_else(|| TranscodeError::UnsupportedFormat(key.to_string()))?;

    if SUPPORTED_SOURCE_FORMATS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(TranscodeError::UnsupportedFormat(ext))
    }
}
