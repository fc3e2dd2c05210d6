use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue};
use axum::{middleware, Router};
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::info;

use super::requests_logging::log_requests;
use super::routes::pipeline_routes;
use super::state::ServerState;
use crate::pipeline::PipelineManager;

/// Run the HTTP server until the process is stopped.
///
/// When `media_root` is set, the storage root is served at `/media`
/// with a long-lived immutable cache header; derived media keys embed
/// the release id, so cached renditions never go stale.
pub async fn run_server(
    pipeline: Arc<PipelineManager>,
    port: u16,
    media_root: Option<PathBuf>,
    content_cache_age_sec: usize,
) -> Result<()> {
    let state = ServerState { pipeline };

    let mut router = Router::new().merge(pipeline_routes());

    if let Some(media_root) = media_root {
        let cache_header = HeaderValue::from_str(&format!(
            "public, max-age={}, immutable",
            content_cache_age_sec
        ))
        .context("Invalid cache header value")?;

        let media_service = ServiceBuilder::new()
            .layer(SetResponseHeaderLayer::if_not_present(
                header::CACHE_CONTROL,
                cache_header,
            ))
            .service(ServeDir::new(&media_root));

        info!("Serving media from {:?} at /media", media_root);
        router = router.nest_service("/media", media_service);
    }

    let router = router
        .layer(middleware::from_fn(log_requests))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;

    axum::serve(listener, router.into_make_service())
        .await
        .context("Server error")?;

    Ok(())
}
