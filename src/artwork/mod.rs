//! Artwork processing: centered square crop and WebP renditions.
//!
//! Decodes the submitted artwork, crops it to a centered square using
//! `min(width, height)` as the side, resizes to the two fixed rendition
//! sizes and encodes each as WebP. Decode/resize/encode is CPU-bound
//! and runs on the blocking thread pool.

use std::io::Cursor;
use std::sync::Arc;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use thiserror::Error;
use tracing::{debug, info};

use crate::object_store::{ObjectStore, ObjectStoreError};

/// Cover rendition side in pixels.
pub const COVER_SIZE: u32 = 800;
/// Thumbnail rendition side in pixels.
pub const THUMB_SIZE: u32 = 400;

/// Errors that can occur while processing artwork.
#[derive(Debug, Error)]
pub enum ArtworkError {
    #[error("Failed to decode artwork: {0}")]
    Decode(String),

    #[error("Failed to encode artwork: {0}")]
    Encode(String),

    #[error("Artwork task panicked: {0}")]
    TaskPanicked(String),

    #[error("Store error: {0}")]
    Store(#[from] ObjectStoreError),
}

/// Storage keys of the uploaded renditions.
#[derive(Debug, Clone)]
pub struct ArtworkOutput {
    pub cover_key: String,
    pub thumb_key: String,
}

/// Turns one artwork image into the cover and thumbnail renditions.
pub struct ArtworkProcessor {
    store: Arc<dyn ObjectStore>,
}

impl ArtworkProcessor {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Process the artwork bytes and upload both renditions under
    /// `releases/{release_id}/artwork/`.
    pub async fn process(
        &self,
        release_id: &str,
        data: Vec<u8>,
    ) -> Result<ArtworkOutput, ArtworkError> {
        let (cover, thumb) = tokio::task::spawn_blocking(move || render_renditions(&data))
            .await
            .map_err(|e| ArtworkError::TaskPanicked(e.to_string()))??;

        let cover_key = format!("releases/{}/artwork/cover.webp", release_id);
        let thumb_key = format!("releases/{}/artwork/thumb.webp", release_id);

        self.store.put(&cover_key, &cover).await?;
        self.store.put(&thumb_key, &thumb).await?;

        info!(
            "Uploaded artwork for release {} ({} B cover, {} B thumb)",
            release_id,
            cover.len(),
            thumb.len()
        );

        Ok(ArtworkOutput { cover_key, thumb_key })
    }
}

/// Decode, square-crop and produce the (cover, thumb) WebP renditions.
fn render_renditions(data: &[u8]) -> Result<(Vec<u8>, Vec<u8>), ArtworkError> {
    let img = image::load_from_memory(data).map_err(|e| ArtworkError::Decode(e.to_string()))?;

    let (w, h) = (img.width(), img.height());
    let (x, y, side) = square_crop_origin(w, h);
    debug!("Artwork {}x{} cropped to {} at ({}, {})", w, h, side, x, y);

    let square = img.crop_imm(x, y, side, side);

    let cover = encode_webp(&square.resize_exact(COVER_SIZE, COVER_SIZE, FilterType::Lanczos3))?;
    let thumb = encode_webp(&square.resize_exact(THUMB_SIZE, THUMB_SIZE, FilterType::Lanczos3))?;

    Ok((cover, thumb))
}

/// Centered square crop: side is `min(w, h)`, origin centered along the
/// long axis.
fn square_crop_origin(width: u32, height: u32) -> (u32, u32, u32) {
    let side = width.min(height);
    let x = (width - side) / 2;
    let y = (height - side) / 2;
    (x, y, side)
}

fn encode_webp(img: &DynamicImage) -> Result<Vec<u8>, ArtworkError> {
    // The WebP encoder only accepts 8-bit RGB/RGBA buffers.
    let img = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::WebP)
        .map_err(|e| ArtworkError::Encode(e.to_string()))?;
    Ok(buf)
}
