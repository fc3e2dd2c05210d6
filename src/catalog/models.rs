//! Catalog data model: processed tracks/releases, the persisted release
//! document and the denormalized index.
//!
//! Serialized field names are camelCase to match the documents the
//! storefront reads.

use std::collections::BTreeMap;

use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::submission::{SubmissionMetadata, TrackMetadata};

/// Lifecycle status a release is born with. Only the external approval
/// workflow moves it forward.
pub const STATUS_PENDING: &str = "pending";

/// One track after processing. Always carries the declared number and
/// title; URL fields are empty strings when transcoding failed so the
/// entry stays present but visibly degraded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedTrack {
    pub track_number: u32,
    pub title: String,
    pub mp3_url: String,
    pub wav_url: String,
    pub preview_url: String,

    #[serde(default)]
    pub bpm: Option<f32>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub isrc: Option<String>,
    #[serde(default)]
    pub featuring: Option<String>,
    #[serde(default)]
    pub remixer: Option<String>,
    #[serde(default)]
    pub explicit: bool,
}

impl ProcessedTrack {
    /// A fully processed track with all three rendition URLs.
    pub fn complete(
        meta: &TrackMetadata,
        mp3_url: String,
        wav_url: String,
        preview_url: String,
    ) -> Self {
        Self {
            track_number: meta.track_number,
            title: meta.title.clone(),
            mp3_url,
            wav_url,
            preview_url,
            bpm: meta.bpm,
            key: meta.key.clone(),
            isrc: meta.isrc.clone(),
            featuring: meta.featuring.clone(),
            remixer: meta.remixer.clone(),
            explicit: meta.explicit,
        }
    }

    /// A degraded entry: declared metadata kept, URLs empty.
    pub fn degraded(meta: &TrackMetadata) -> Self {
        Self::complete(meta, String::new(), String::new(), String::new())
    }

    pub fn is_degraded(&self) -> bool {
        self.mp3_url.is_empty() || self.wav_url.is_empty() || self.preview_url.is_empty()
    }
}

/// The in-memory aggregate the pipeline assembles before handing off to
/// the catalog writer.
#[derive(Debug, Clone)]
pub struct ProcessedRelease {
    pub id: String,
    pub metadata: SubmissionMetadata,
    pub cover_url: String,
    pub thumb_url: String,
    pub tracks: Vec<ProcessedTrack>,
    /// Unix seconds; also the suffix of `id`.
    pub created_at: i64,
}

/// Engineering defaults for every submitter field the catalog
/// recognizes. Applied once when the release document is built, instead
/// of fallback chains re-resolved at every read.
#[derive(Debug, Clone)]
pub struct ReleaseDefaults {
    pub genre: String,
    pub price: f64,
    pub vinyl_price: f64,
    pub vinyl_pressing: String,
    pub publishing: String,
}

impl Default for ReleaseDefaults {
    fn default() -> Self {
        Self {
            genre: "Electronic".to_string(),
            price: 8.0,
            vinyl_price: 22.0,
            vinyl_pressing: "12\" 140g black".to_string(),
            publishing: "Self-released".to_string(),
        }
    }
}

/// The persisted release document at `releases/{id}`. Written once by
/// the pipeline; status/published/approved and the engagement counters
/// belong to the storefront and admin workflows afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseDocument {
    pub id: String,
    pub artist: String,
    pub title: String,
    pub release_date: Option<String>,
    pub genre: String,
    pub price: f64,
    pub vinyl_enabled: bool,
    pub vinyl_price: f64,
    pub vinyl_pressing: String,
    pub limited_edition: bool,
    pub edition_size: u32,
    pub social_links: BTreeMap<String, String>,
    pub copyright: String,
    pub publishing: String,
    pub explicit: bool,
    pub cover_url: String,
    pub thumb_url: String,
    pub tracks: Vec<ProcessedTrack>,
    pub status: String,
    pub published: bool,
    pub approved: bool,
    pub play_count: u64,
    pub created_at: i64,
}

impl ReleaseDocument {
    /// Flatten a processed release into the storage shape, merging the
    /// submitter-declared fields with the configured defaults.
    pub fn build(release: &ProcessedRelease, defaults: &ReleaseDefaults) -> Self {
        let meta = &release.metadata;
        let vinyl = meta.vinyl.clone().unwrap_or_default();
        let year = Utc
            .timestamp_opt(release.created_at, 0)
            .single()
            .map(|t| t.format("%Y").to_string())
            .unwrap_or_default();

        Self {
            id: release.id.clone(),
            artist: meta.artist_name.clone(),
            title: meta.release_name.clone(),
            release_date: meta.release_date.clone(),
            genre: meta.genre.clone().unwrap_or_else(|| defaults.genre.clone()),
            price: meta.price.unwrap_or(defaults.price),
            vinyl_enabled: vinyl.enabled,
            vinyl_price: vinyl.price.unwrap_or(defaults.vinyl_price),
            vinyl_pressing: vinyl
                .pressing
                .unwrap_or_else(|| defaults.vinyl_pressing.clone()),
            limited_edition: meta.limited_edition,
            edition_size: meta.edition_size.unwrap_or(0),
            social_links: meta.social_links.clone(),
            copyright: meta
                .copyright
                .clone()
                .unwrap_or_else(|| format!("{} {}", year, meta.artist_name)),
            publishing: meta
                .publishing
                .clone()
                .unwrap_or_else(|| defaults.publishing.clone()),
            explicit: meta.explicit,
            cover_url: release.cover_url.clone(),
            thumb_url: release.thumb_url.clone(),
            tracks: release.tracks.clone(),
            status: STATUS_PENDING.to_string(),
            published: false,
            approved: false,
            play_count: 0,
            created_at: release.created_at,
        }
    }
}

/// Lightweight per-release entry in the catalog index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseSummary {
    pub id: String,
    pub artist: String,
    pub title: String,
    pub cover_url: String,
    pub track_count: usize,
    pub status: String,
    pub created_at: i64,
}

impl ReleaseSummary {
    pub fn from_document(doc: &ReleaseDocument) -> Self {
        Self {
            id: doc.id.clone(),
            artist: doc.artist.clone(),
            title: doc.title.clone(),
            cover_url: doc.cover_url.clone(),
            track_count: doc.tracks.len(),
            status: doc.status.clone(),
            created_at: doc.created_at,
        }
    }
}

/// The denormalized index document at `system/releases-master`: every
/// release summarized in one place for cheap listing scans.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseIndex {
    pub releases: Vec<ReleaseSummary>,
    pub total_releases: usize,
    pub last_updated: i64,
}

impl ReleaseIndex {
    /// Replace the summary with the same id or append a new one, then
    /// refresh the count.
    pub fn upsert(&mut self, summary: ReleaseSummary) {
        match self.releases.iter_mut().find(|s| s.id == summary.id) {
            Some(existing) => *existing = summary,
            None => self.releases.push(summary),
        }
        self.total_releases = self.releases.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track_meta(n: u32, title: &str) -> TrackMetadata {
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

    fn minimal_release() -> ProcessedRelease {
        let metadata: SubmissionMetadata = serde_json::from_str(
            r#"{"artistName": "DJ Test", "releaseName": "First EP"}"#,
        )
        .unwrap();

        ProcessedRelease {
            id: "dj_test_FE-1700000000".to_string(),
            metadata,
            cover_url: "https://cdn.test/placeholder.webp".to_string(),
            thumb_url: "https://cdn.test/placeholder.webp".to_string(),
            tracks: vec![ProcessedTrack::degraded(&track_meta(1, "Intro"))],
            created_at: 1700000000,
        }
    }

    #[test]
    fn test_degraded_track_keeps_identity() {
        let t = ProcessedTrack::degraded(&track_meta(2, "Broken"));
        assert_eq!(t.track_number, 2);
        assert_eq!(t.title, "Broken");
        assert_eq!(t.mp3_url, "");
        assert!(t.is_degraded());
    }

    #[test]
    fn test_document_defaults_applied() {
        let doc = ReleaseDocument::build(&minimal_release(), &ReleaseDefaults::default());

        assert_eq!(doc.status, "pending");
        assert!(!doc.published);
        assert!(!doc.approved);
        assert_eq!(doc.genre, "Electronic");
        assert_eq!(doc.price, 8.0);
        assert!(!doc.vinyl_enabled);
        assert_eq!(doc.publishing, "Self-released");
        // 1700000000 is in 2023
        assert_eq!(doc.copyright, "2023 DJ Test");
    }

    #[test]
    fn test_document_keeps_declared_fields() {
        let mut release = minimal_release();
        release.metadata.genre = Some("Dub".to_string());
        release.metadata.price = Some(12.5);
        release.metadata.copyright = Some("2024 DJ Test".to_string());

        let doc = ReleaseDocument::build(&release, &ReleaseDefaults::default());
        assert_eq!(doc.genre, "Dub");
        assert_eq!(doc.price, 12.5);
        assert_eq!(doc.copyright, "2024 DJ Test");
    }

    #[test]
    fn test_document_serializes_camel_case() {
        let doc = ReleaseDocument::build(&minimal_release(), &ReleaseDefaults::default());
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("coverUrl").is_some());
        assert!(json.get("playCount").is_some());
        assert_eq!(json["tracks"][0]["trackNumber"], 1);
    }

    #[test]
    fn test_index_upsert_replaces_by_id() {
        let doc = ReleaseDocument::build(&minimal_release(), &ReleaseDefaults::default());
        let mut index = ReleaseIndex::default();

        index.upsert(ReleaseSummary::from_document(&doc));
        index.upsert(ReleaseSummary::from_document(&doc));

        assert_eq!(index.releases.len(), 1);
        assert_eq!(index.total_releases, 1);
    }
}
