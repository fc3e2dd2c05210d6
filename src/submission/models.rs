//! Submitter-declared metadata, deserialized from `metadata.json`.
//!
//! Field names are camelCase as produced by the storefront uploader.
//! Everything beyond artist/release/tracks is optional; the catalog
//! writer fills engineering defaults for unset fields.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The submission's metadata document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionMetadata {
    pub artist_name: String,
    pub release_name: String,

    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    /// Digital price in the storefront's display currency.
    #[serde(default)]
    pub price: Option<f64>,

    #[serde(default)]
    pub vinyl: Option<VinylOptions>,
    #[serde(default)]
    pub limited_edition: bool,
    #[serde(default)]
    pub edition_size: Option<u32>,

    #[serde(default)]
    pub social_links: BTreeMap<String, String>,
    #[serde(default)]
    pub copyright: Option<String>,
    #[serde(default)]
    pub publishing: Option<String>,
    #[serde(default)]
    pub explicit: bool,

    #[serde(default)]
    pub tracks: Vec<TrackMetadata>,
}

/// Vinyl pressing details declared by the submitter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VinylOptions {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub pressing: Option<String>,
}

/// Per-track declared fields. Authoritative for ordering and display;
/// matched to physical files by position, not by filename.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackMetadata {
    pub track_number: u32,
    pub title: String,

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
