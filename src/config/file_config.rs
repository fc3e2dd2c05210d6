use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub storage_root: Option<String>,
    pub catalog_db: Option<String>,
    pub port: Option<u16>,
    pub cdn_base_url: Option<String>,
    pub placeholder_artwork_url: Option<String>,
    pub content_cache_age_sec: Option<usize>,

    // Feature configs
    pub email: Option<EmailFileConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct EmailFileConfig {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub from_address: Option<String>,
    pub admin_address: Option<String>,
    pub timeout_sec: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
