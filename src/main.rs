use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod artwork;
mod audio;
mod catalog;
mod config;
mod notifier;
mod object_store;
mod pipeline;
mod server;
mod submission;

use audio::FfmpegEngineFactory;
use catalog::SqliteCatalogStore;
use config::{AppConfig, CliConfig, FileConfig};
use notifier::{EmailClient, EmailNotifier};
use object_store::FsObjectStore;
use pipeline::{PipelineConfig, PipelineManager};
use server::run_server;

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the storage root (submissions land and releases are
    /// written below this directory).
    #[clap(long, value_parser = parse_path)]
    pub storage_root: Option<PathBuf>,

    /// Path to the SQLite catalog database file. Defaults to
    /// catalog.db inside the storage root.
    #[clap(long, value_parser = parse_path)]
    pub catalog_db: Option<PathBuf>,

    /// Path to a TOML config file; its values override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// Public CDN base URL media URLs are built from. Defaults to this
    /// server's own /media mount.
    #[clap(long)]
    pub cdn_base_url: Option<String>,

    /// URL substituted as cover art when a submission has no artwork.
    #[clap(long)]
    pub placeholder_artwork_url: Option<String>,

    /// Cache max-age in seconds for served media.
    #[clap(long, default_value_t = 31_536_000)]
    pub content_cache_age_sec: usize,

    /// Base URL of the transactional email API. Leaving this unset
    /// disables email notifications.
    #[clap(long)]
    pub email_api_url: Option<String>,

    /// API key for the transactional email API.
    #[clap(long)]
    pub email_api_key: Option<String>,

    /// Sender address for notification emails.
    #[clap(long)]
    pub email_from: Option<String>,

    /// Admin recipient for notification emails.
    #[clap(long)]
    pub email_admin: Option<String>,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            storage_root: self.storage_root.clone(),
            catalog_db: self.catalog_db.clone(),
            port: self.port,
            cdn_base_url: self.cdn_base_url.clone(),
            placeholder_artwork_url: self.placeholder_artwork_url.clone(),
            content_cache_age_sec: self.content_cache_age_sec,
            email_api_url: self.email_api_url.clone(),
            email_api_key: self.email_api_key.clone(),
            email_from: self.email_from.clone(),
            email_admin: self.email_admin.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    info!(
        "pressroom-ingest-server {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH")
    );

    let file_config = cli_args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    info!("Initializing metrics...");
    server::metrics::init_metrics();

    info!("Opening object storage at {:?}...", config.storage_root);
    let store = Arc::new(FsObjectStore::new(&config.storage_root)?);

    info!("Opening SQLite catalog database at {:?}...", config.catalog_db);
    let catalog = Arc::new(SqliteCatalogStore::open(&config.catalog_db)?);

    let email_client = match &config.email {
        Some(settings) => {
            info!("Email notifications enabled via {}", settings.api_url);
            Some(EmailClient::new(
                settings.api_url.clone(),
                settings.api_key.clone(),
                settings.timeout_sec,
            )?)
        }
        None => {
            info!("Email notifications disabled (no API configured)");
            None
        }
    };
    let notifier = match &config.email {
        Some(settings) => Arc::new(EmailNotifier::new(
            email_client,
            settings.from_address.clone(),
            settings.admin_address.clone(),
        )),
        None => Arc::new(EmailNotifier::disabled()),
    };

    let pipeline = Arc::new(PipelineManager::new(
        store,
        catalog,
        Arc::new(FfmpegEngineFactory),
        notifier,
        PipelineConfig {
            cdn_base_url: config.cdn_base_url.clone(),
            placeholder_artwork_url: config.placeholder_artwork_url.clone(),
        },
    ));

    info!("Ready to serve at port {}!", config.port);
    run_server(
        pipeline,
        config.port,
        Some(config.storage_root.clone()),
        config.content_cache_age_sec,
    )
    .await
}
