mod file_config;

pub use file_config::{EmailFileConfig, FileConfig};

use anyhow::{bail, Result};
use std::path::PathBuf;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub storage_root: Option<PathBuf>,
    pub catalog_db: Option<PathBuf>,
    pub port: u16,
    pub cdn_base_url: Option<String>,
    pub placeholder_artwork_url: Option<String>,
    pub content_cache_age_sec: usize,
    pub email_api_url: Option<String>,
    pub email_api_key: Option<String>,
    pub email_from: Option<String>,
    pub email_admin: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub storage_root: PathBuf,
    pub catalog_db: PathBuf,
    pub port: u16,
    pub cdn_base_url: String,
    pub placeholder_artwork_url: String,
    pub content_cache_age_sec: usize,

    // Email delivery (None disables notifications)
    pub email: Option<EmailSettings>,
}

#[derive(Debug, Clone)]
pub struct EmailSettings {
    pub api_url: String,
    pub api_key: String,
    pub from_address: String,
    pub admin_address: String,
    pub timeout_sec: u64,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let storage_root = file
            .storage_root
            .map(PathBuf::from)
            .or_else(|| cli.storage_root.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("storage_root must be specified via --storage-root or in config file")
            })?;

        let catalog_db = file
            .catalog_db
            .map(PathBuf::from)
            .or_else(|| cli.catalog_db.clone())
            .unwrap_or_else(|| storage_root.join("catalog.db"));

        let port = file.port.unwrap_or(cli.port);

        let cdn_base_url = file
            .cdn_base_url
            .or_else(|| cli.cdn_base_url.clone())
            .unwrap_or_else(|| format!("http://localhost:{}/media", port));
        if cdn_base_url.is_empty() {
            bail!("cdn_base_url must not be empty");
        }
        let cdn_base_url = cdn_base_url.trim_end_matches('/').to_string();

        let placeholder_artwork_url = file
            .placeholder_artwork_url
            .or_else(|| cli.placeholder_artwork_url.clone())
            .unwrap_or_else(|| format!("{}/static/placeholder-artwork.webp", cdn_base_url));

        let content_cache_age_sec = file
            .content_cache_age_sec
            .unwrap_or(cli.content_cache_age_sec);

        // Email settings - enabled only when both the API URL and key
        // resolve; the notifier is a no-op otherwise.
        let email_file = file.email.unwrap_or_default();
        let api_url = email_file.api_url.or_else(|| cli.email_api_url.clone());
        let api_key = email_file.api_key.or_else(|| cli.email_api_key.clone());

        let email = match (api_url, api_key) {
            (Some(api_url), Some(api_key)) => Some(EmailSettings {
                api_url,
                api_key,
                from_address: email_file
                    .from_address
                    .or_else(|| cli.email_from.clone())
                    .unwrap_or_else(|| "releases@pressroom.local".to_string()),
                admin_address: email_file
                    .admin_address
                    .or_else(|| cli.email_admin.clone())
                    .unwrap_or_else(|| "admin@pressroom.local".to_string()),
                timeout_sec: email_file.timeout_sec.unwrap_or(30),
            }),
            (None, None) => None,
            _ => bail!("Email delivery needs both api_url and api_key (or neither)"),
        };

        Ok(Self {
            storage_root,
            catalog_db,
            port,
            cdn_base_url,
            placeholder_artwork_url,
            content_cache_age_sec,
            email,
        })
    }
}
