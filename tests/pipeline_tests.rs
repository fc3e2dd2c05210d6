//! End-to-end pipeline tests against the stub transcoding engine.

mod common;

use common::{artwork_png, metadata_json, seed_submission, TestHarness, CDN_BASE, PLACEHOLDER_URL};
use pressroom_ingest_server::catalog::CatalogStore;
use pressroom_ingest_server::object_store::ObjectStore;
use pressroom_ingest_server::pipeline::PipelineError;
use std::sync::atomic::Ordering;
use std::time::Duration;

#[tokio::test]
async fn test_successful_submission_end_to_end() {
    let h = TestHarness::new();
    seed_submission(
        h.store.as_ref(),
        "sub-1",
        Some(&metadata_json(&["Intro", "Outro"])),
        &[("01-intro.wav", b"RIFFaaaa"), ("02-outro.wav", b"RIFFbbbb")],
        Some(&artwork_png()),
    )
    .await;

    let report = h.pipeline.process("sub-1").await.unwrap();

    assert!(report.release_id.starts_with("dj_test_FE-"));
    assert_eq!(report.artist, "DJ Test");
    assert_eq!(report.title, "First EP");
    assert_eq!(report.track_count, 2);
    assert_eq!(
        report.cover_url,
        format!("{}/releases/{}/artwork/cover.webp", CDN_BASE, report.release_id)
    );

    // Release document: pending, unpublished, both tracks complete
    let doc = h.catalog.get_release(&report.release_id).unwrap().unwrap();
    assert_eq!(doc.status, "pending");
    assert!(!doc.published);
    assert!(!doc.approved);
    assert_eq!(doc.tracks.len(), 2);
    for (i, track) in doc.tracks.iter().enumerate() {
        assert_eq!(track.track_number as usize, i + 1);
        assert!(!track.is_degraded());
        assert!(track.mp3_url.starts_with(CDN_BASE));
        assert!(track.wav_url.ends_with(".wav"));
        assert!(track.preview_url.contains("/previews/"));
    }
    assert_eq!(
        doc.tracks[0].mp3_url,
        format!("{}/releases/{}/tracks/01-intro.mp3", CDN_BASE, report.release_id)
    );

    // Index has exactly one summary
    let index = h.catalog.get_index().unwrap().unwrap();
    assert_eq!(index.total_releases, 1);
    assert_eq!(index.releases[0].id, report.release_id);
    assert_eq!(index.releases[0].track_count, 2);

    // Derived media exists under the release prefix
    let media_keys = h
        .store
        .list(&format!("releases/{}", report.release_id))
        .await
        .unwrap();
    assert!(media_keys.iter().any(|k| k.ends_with("artwork/cover.webp")));
    assert!(media_keys.iter().any(|k| k.ends_with("artwork/thumb.webp")));
    assert!(media_keys.iter().any(|k| k.ends_with("previews/01-preview.mp3")));

    // Cleanup ran: the submission prefix is gone
    assert!(h.store.list("submissions/sub-1").await.unwrap().is_empty());

    // Engine lifecycle: exactly one acquire, one shutdown
    assert_eq!(h.engine_acquisitions.load(Ordering::SeqCst), 1);
    assert_eq!(h.engine_shutdowns.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_partial_failure_keeps_degraded_track_and_cleans_up() {
    let h = TestHarness::new();
    seed_submission(
        h.store.as_ref(),
        "sub-2",
        Some(&metadata_json(&["One", "Two", "Three"])),
        &[
            ("01-one.wav", b"RIFFaaaa"),
            ("02-two.wav", b"CORRUPT bytes"),
            ("03-three.wav", b"RIFFcccc"),
        ],
        None,
    )
    .await;

    let report = h.pipeline.process("sub-2").await.unwrap();
    assert_eq!(report.track_count, 3);

    let doc = h.catalog.get_release(&report.release_id).unwrap().unwrap();
    assert_eq!(doc.tracks.len(), 3);

    assert!(!doc.tracks[0].is_degraded());
    assert!(doc.tracks[1].is_degraded());
    assert_eq!(doc.tracks[1].title, "Two");
    assert_eq!(doc.tracks[1].mp3_url, "");
    assert_eq!(doc.tracks[1].wav_url, "");
    assert_eq!(doc.tracks[1].preview_url, "");
    assert!(!doc.tracks[2].is_degraded());

    // Partial failure is still success: cleanup ran, engine torn down
    assert!(h.store.list("submissions/sub-2").await.unwrap().is_empty());
    assert_eq!(h.engine_shutdowns.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_missing_artwork_uses_placeholder() {
    let h = TestHarness::new();
    seed_submission(
        h.store.as_ref(),
        "sub-3",
        Some(&metadata_json(&["Solo"])),
        &[("01-solo.wav", b"RIFFaaaa")],
        None,
    )
    .await;

    let report = h.pipeline.process("sub-3").await.unwrap();
    assert_eq!(report.cover_url, PLACEHOLDER_URL);

    let doc = h.catalog.get_release(&report.release_id).unwrap().unwrap();
    assert_eq!(doc.cover_url, PLACEHOLDER_URL);
    assert_eq!(doc.thumb_url, PLACEHOLDER_URL);
}

#[tokio::test]
async fn test_missing_metadata_is_fatal_and_preserves_source() {
    let h = TestHarness::new();
    seed_submission(
        h.store.as_ref(),
        "no-meta-id",
        None,
        &[("01-a.wav", b"RIFFaaaa")],
        None,
    )
    .await;

    let err = h.pipeline.process("no-meta-id").await.unwrap_err();
    assert!(err.to_string().to_lowercase().contains("metadata"));

    // Fatal pre-side-effect: nothing written, nothing deleted
    let keys = h.store.list("submissions/no-meta-id").await.unwrap();
    assert_eq!(keys.len(), 1);
    assert!(h.store.list("releases").await.unwrap().is_empty());
    assert!(h.catalog.get_index().unwrap().is_none());

    // The engine was never acquired on this path
    assert_eq!(h.engine_acquisitions.load(Ordering::SeqCst), 0);
    assert_eq!(h.engine_shutdowns.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_no_tracks_is_fatal() {
    let h = TestHarness::new();
    seed_submission(
        h.store.as_ref(),
        "sub-5",
        Some(&metadata_json(&["Ghost"])),
        &[],
        None,
    )
    .await;

    let err = h.pipeline.process("sub-5").await.unwrap_err();
    assert!(matches!(err, PipelineError::Submission(_)));
    assert!(err.to_string().contains("tracks"));

    // Source preserved for retry
    assert!(!h.store.list("submissions/sub-5").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reprocessing_after_success_fails_fast() {
    let h = TestHarness::new();
    seed_submission(
        h.store.as_ref(),
        "sub-6",
        Some(&metadata_json(&["Only"])),
        &[("01-only.wav", b"RIFFaaaa")],
        None,
    )
    .await;

    h.pipeline.process("sub-6").await.unwrap();

    // Cleanup was destructive; the rerun sees no metadata
    let err = h.pipeline.process("sub-6").await.unwrap_err();
    assert!(err.to_string().contains("metadata"));
}

#[tokio::test]
async fn test_concurrent_process_for_same_id_is_rejected() {
    let h = TestHarness::with_engine_delay(300);
    seed_submission(
        h.store.as_ref(),
        "sub-7",
        Some(&metadata_json(&["Long"])),
        &[("01-long.wav", b"RIFFaaaa")],
        None,
    )
    .await;

    let pipeline = h.pipeline.clone();
    let first = tokio::spawn(async move { pipeline.process("sub-7").await });

    // Let the first invocation take the lease
    tokio::time::sleep(Duration::from_millis(100)).await;

    let err = h.pipeline.process("sub-7").await.unwrap_err();
    assert!(matches!(err, PipelineError::SubmissionBusy(_)));

    // The rejected call must not have interfered with the running one
    let report = first.await.unwrap().unwrap();
    assert_eq!(report.track_count, 1);
    assert_eq!(h.engine_acquisitions.load(Ordering::SeqCst), 1);
    assert_eq!(h.engine_shutdowns.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_declared_track_without_file_degrades_but_release_succeeds() {
    let h = TestHarness::new();
    // Three declared tracks, only two files uploaded
    seed_submission(
        h.store.as_ref(),
        "sub-8",
        Some(&metadata_json(&["One", "Two", "Three"])),
        &[("01-one.wav", b"RIFFaaaa"), ("02-two.wav", b"RIFFbbbb")],
        None,
    )
    .await;

    let report = h.pipeline.process("sub-8").await.unwrap();
    assert_eq!(report.track_count, 3);

    let doc = h.catalog.get_release(&report.release_id).unwrap().unwrap();
    assert!(doc.tracks[2].is_degraded());
    assert_eq!(doc.tracks[2].title, "Three");
}
