//! The pipeline manager: one submission in, one cataloged release out.
//!
//! Stage order: Parsing → ArtworkProcessing → TrackProcessing (loop) →
//! CatalogWrite → Notify(success) → Cleanup. Fatal errors branch to
//! Notify(failure) and deliberately skip Cleanup so the source objects
//! stay available for retry or inspection.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tracing::{info, warn};

use super::PipelineError;
use crate::artwork::ArtworkProcessor;
use crate::audio::{TranscodeEngine, TranscodeEngineFactory, TranscodeError, TrackProcessor};
use crate::catalog::ids::release_id;
use crate::catalog::{CatalogStore, CatalogWriter, ProcessedRelease, ProcessedTrack};
use crate::notifier::{EmailNotifier, OutboundEvent};
use crate::object_store::{public_url, ObjectStore};
use crate::server::metrics;
use crate::submission::{ParsedSubmission, SubmissionParser, TrackMetadata};

/// Pipeline tuning that comes from configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Public CDN base URL all derived-media URLs are built from.
    pub cdn_base_url: String,
    /// URL substituted when a submission has no artwork.
    pub placeholder_artwork_url: String,
}

/// Result summary returned to the HTTP caller on success.
#[derive(Debug, Clone)]
pub struct ProcessReport {
    pub release_id: String,
    pub artist: String,
    pub title: String,
    pub track_count: usize,
    pub cover_url: String,
}

/// Orchestrates the whole pipeline for single submissions.
pub struct PipelineManager {
    store: Arc<dyn ObjectStore>,
    parser: SubmissionParser,
    artwork: ArtworkProcessor,
    writer: CatalogWriter,
    engine_factory: Arc<dyn TranscodeEngineFactory>,
    notifier: Arc<EmailNotifier>,
    config: PipelineConfig,
    /// Per-submission lease: ids currently being processed by this
    /// process. Guards against double submission racing on storage
    /// writes; nothing guards cross-process races.
    in_flight: Mutex<HashSet<String>>,
}

impl PipelineManager {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        catalog: Arc<dyn CatalogStore>,
        engine_factory: Arc<dyn TranscodeEngineFactory>,
        notifier: Arc<EmailNotifier>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            parser: SubmissionParser::new(store.clone()),
            artwork: ArtworkProcessor::new(store.clone()),
            writer: CatalogWriter::new(catalog),
            store,
            engine_factory,
            notifier,
            config,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// List submission ids currently present in storage.
    pub async fn list_submissions(&self) -> Result<Vec<String>, PipelineError> {
        Ok(self.parser.list_pending().await?)
    }

    /// Process one submission to completion. Synchronous from the
    /// caller's point of view: returns once the release is cataloged
    /// and the source cleaned up, or with the fatal error.
    pub async fn process(&self, submission_id: &str) -> Result<ProcessReport, PipelineError> {
        let _lease = self.acquire_lease(submission_id)?;
        let started = Instant::now();

        info!("Processing submission {}", submission_id);
        self.notifier
            .notify(&OutboundEvent::SubmissionReceived {
                submission_id: submission_id.to_string(),
            })
            .await;

        // The engine is lazily acquired inside `run` on first use and
        // must be torn down on every exit path, so it lives out here.
        let mut engine: Option<Box<dyn TranscodeEngine>> = None;
        let result = self.run(submission_id, &mut engine).await;

        if let Some(engine) = engine.take() {
            if let Err(e) = engine.shutdown().await {
                warn!("Engine shutdown failed (ignored): {}", e);
            }
        }

        metrics::PIPELINE_DURATION_SECONDS.observe(started.elapsed().as_secs_f64());

        match result {
            Ok(report) => {
                metrics::SUBMISSIONS_PROCESSED_TOTAL.inc();
                info!(
                    "Submission {} processed as release {} in {:.1}s",
                    submission_id,
                    report.release_id,
                    started.elapsed().as_secs_f64()
                );
                Ok(report)
            }
            Err(e) => {
                metrics::SUBMISSIONS_FAILED_TOTAL.inc();
                warn!("Submission {} failed: {}", submission_id, e);
                // Failure email is attempted even though the pipeline is
                // already failing; cleanup is skipped so the source
                // survives for retry.
                self.notifier
                    .notify(&OutboundEvent::ProcessingFailed {
                        submission_id: submission_id.to_string(),
                        error: e.to_string(),
                    })
                    .await;
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        submission_id: &str,
        engine: &mut Option<Box<dyn TranscodeEngine>>,
    ) -> Result<ProcessReport, PipelineError> {
        // Parsing
        let parsed = self.parser.parse(submission_id).await?;
        let created_at = chrono::Utc::now().timestamp();
        let id = release_id(
            &parsed.metadata.artist_name,
            &parsed.metadata.release_name,
            created_at,
        );

        // ArtworkProcessing
        let (cover_url, thumb_url) = self.process_artwork(&id, &parsed).await;

        // TrackProcessing: the engine starts here, shared across every
        // track of this invocation
        if engine.is_none() {
            *engine = Some(self.engine_factory.acquire().await?);
        }
        let Some(engine_ref) = engine.as_deref() else {
            return Err(TranscodeError::EngineUnavailable(
                "engine initialization failed".to_string(),
            )
            .into());
        };

        let processor =
            TrackProcessor::new(engine_ref, self.store.clone(), self.config.cdn_base_url.clone());

        let pairs = pair_tracks(&parsed.metadata.tracks, &parsed.track_keys);
        let mut tracks: Vec<ProcessedTrack> = Vec::with_capacity(pairs.len());
        for (meta, source_key) in &pairs {
            let track = match source_key {
                Some(key) => processor.process(&id, meta, key).await,
                None => {
                    warn!(
                        "Track {:02} \"{}\" has no backing file, keeping degraded entry",
                        meta.track_number, meta.title
                    );
                    ProcessedTrack::degraded(meta)
                }
            };
            if track.is_degraded() {
                metrics::TRACKS_DEGRADED_TOTAL.inc();
            } else {
                metrics::TRACKS_TRANSCODED_TOTAL.inc();
            }
            tracks.push(track);
        }

        let release = ProcessedRelease {
            id: id.clone(),
            metadata: parsed.metadata,
            cover_url,
            thumb_url,
            tracks,
            created_at,
        };

        // CatalogWrite
        let doc = self.writer.write(&release)?;

        // Notify(success)
        self.notifier
            .notify(&OutboundEvent::ReleaseProcessed {
                release: doc.clone(),
            })
            .await;

        // Cleanup: success is destructive; the submission prefix goes
        // away and a re-run will fail fast with MissingMetadata.
        let prefix = format!("submissions/{}", submission_id);
        if let Err(e) = self.store.delete_prefix(&prefix).await {
            warn!("Cleanup of {} failed (release already cataloged): {}", prefix, e);
        }

        Ok(ProcessReport {
            release_id: doc.id,
            artist: doc.artist,
            title: doc.title,
            track_count: doc.tracks.len(),
            cover_url: doc.cover_url,
        })
    }

    /// Produce the cover/thumb URLs: processed renditions when artwork
    /// exists and survives processing, the placeholder otherwise.
    async fn process_artwork(&self, id: &str, parsed: &ParsedSubmission) -> (String, String) {
        let placeholder = || {
            (
                self.config.placeholder_artwork_url.clone(),
                self.config.placeholder_artwork_url.clone(),
            )
        };

        let Some(artwork_key) = &parsed.artwork_key else {
            info!("No artwork in submission, using placeholder");
            return placeholder();
        };

        let data = match self.store.get(artwork_key).await {
            Ok(data) => data,
            Err(e) => {
                warn!("Failed to read artwork {} (using placeholder): {}", artwork_key, e);
                return placeholder();
            }
        };

        match self.artwork.process(id, data).await {
            Ok(output) => (
                public_url(&self.config.cdn_base_url, &output.cover_key),
                public_url(&self.config.cdn_base_url, &output.thumb_key),
            ),
            Err(e) => {
                warn!("Artwork processing failed (using placeholder): {}", e);
                placeholder()
            }
        }
    }

    fn acquire_lease(&self, submission_id: &str) -> Result<Lease<'_>, PipelineError> {
        let mut in_flight = self.in_flight.lock().unwrap();
        if !in_flight.insert(submission_id.to_string()) {
            return Err(PipelineError::SubmissionBusy(submission_id.to_string()));
        }
        Ok(Lease {
            set: &self.in_flight,
            id: submission_id.to_string(),
        })
    }
}

/// Releases the in-flight entry on every exit path.
struct Lease<'a> {
    set: &'a Mutex<HashSet<String>>,
    id: String,
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        self.set.lock().unwrap().remove(&self.id);
    }
}

/// Match declared tracks to physical files by position. Declared
/// metadata is authoritative: entries without a backing file stay (and
/// degrade), surplus files get metadata synthesized from the filename.
fn pair_tracks(
    declared: &[TrackMetadata],
    track_keys: &[String],
) -> Vec<(TrackMetadata, Option<String>)> {
    let count = declared.len().max(track_keys.len());
    let mut pairs = Vec::with_capacity(count);

    for i in 0..count {
        let meta = declared
            .get(i)
            .cloned()
            .unwrap_or_else(|| synthesize_metadata(i, &track_keys[i]));
        pairs.push((meta, track_keys.get(i).cloned()));
    }

    pairs
}

fn synthesize_metadata(position: usize, key: &str) -> TrackMetadata {
    let title = Path::new(key)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Untitled")
        .to_string();

    TrackMetadata {
        track_number: (position + 1) as u32,
        title,
        bpm: None,
        key: None,
        isrc: None,
        featuring: None,
        remixer: None,
        explicit: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(n: u32, title: &str) -> TrackMetadata {
        TrackMetadata {
            track_number: n,
            title: title.to_string(),
            bpm: None,
            key: None,
            isrc: None,
            featuring: None,
            remixer: None,
            explicit: false,
        }
    }

    #[test]
    fn test_pair_tracks_by_position() {
        let declared = vec![meta(1, "A"), meta(2, "B")];
        let keys = vec!["s/tracks/01.wav".to_string(), "s/tracks/02.wav".to_string()];

        let pairs = pair_tracks(&declared, &keys);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].0.title, "A");
        assert_eq!(pairs[0].1.as_deref(), Some("s/tracks/01.wav"));
        assert_eq!(pairs[1].0.title, "B");
    }

    #[test]
    fn test_declared_without_file_is_kept() {
        let declared = vec![meta(1, "A"), meta(2, "B")];
        let keys = vec!["s/tracks/01.wav".to_string()];

        let pairs = pair_tracks(&declared, &keys);
        assert_eq!(pairs.len(), 2);
        assert!(pairs[1].1.is_none());
        assert_eq!(pairs[1].0.title, "B");
    }

    #[test]
    fn test_surplus_file_gets_synthesized_metadata() {
        let declared = vec![meta(1, "A")];
        let keys = vec![
            "s/tracks/01-a.wav".to_string(),
            "s/tracks/02-mystery.wav".to_string(),
        ];

        let pairs = pair_tracks(&declared, &keys);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[1].0.track_number, 2);
        assert_eq!(pairs[1].0.title, "02-mystery");
    }
}
