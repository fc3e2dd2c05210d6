//! Submission fixtures seeded into the test object store.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat};
use serde_json::json;

use pressroom_ingest_server::object_store::ObjectStore;

/// Metadata document for "DJ Test - First EP" with the given tracks.
pub fn metadata_json(track_titles: &[&str]) -> Vec<u8> {
    let tracks: Vec<_> = track_titles
        .iter()
        .enumerate()
        .map(|(i, title)| json!({"trackNumber": i + 1, "title": title}))
        .collect();

    serde_json::to_vec(&json!({
        "artistName": "DJ Test",
        "releaseName": "First EP",
        "genre": "Techno",
        "tracks": tracks,
    }))
    .unwrap()
}

/// A small real PNG the artwork processor can decode.
pub fn artwork_png() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(120, 80, image::Rgb([20, 90, 160]));
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

/// Seed one submission: metadata, track files and optional artwork.
pub async fn seed_submission(
    store: &dyn ObjectStore,
    submission_id: &str,
    metadata: Option<&[u8]>,
    track_files: &[(&str, &[u8])],
    artwork: Option<&[u8]>,
) {
    let prefix = format!("submissions/{}", submission_id);

    if let Some(metadata) = metadata {
        store
            .put(&format!("{}/metadata.json", prefix), metadata)
            .await
            .unwrap();
    }

    for (filename, data) in track_files {
        store
            .put(&format!("{}/tracks/{}", prefix, filename), data)
            .await
            .unwrap();
    }

    if let Some(artwork) = artwork {
        store
            .put(&format!("{}/artwork/cover.png", prefix), artwork)
            .await
            .unwrap();
    }
}
