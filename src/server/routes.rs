//! Pipeline HTTP routes.
//!
//! - GET /health - liveness and version info
//! - GET /submissions - pending submission ids found in storage
//! - POST /process - run the pipeline for one submission, synchronously

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::state::{GuardedPipelineManager, ServerState};

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct SubmissionsResponse {
    pub submissions: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessBody {
    pub submission_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessSuccessResponse {
    pub success: bool,
    pub release_id: String,
    pub artist: String,
    pub title: String,
    /// Number of track entries in the release, degraded entries included.
    pub tracks: usize,
    pub cover_url: String,
}

#[derive(Debug, Serialize)]
pub struct ProcessErrorResponse {
    pub success: bool,
    pub error: String,
}

// =============================================================================
// Handlers
// =============================================================================

async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn list_submissions(State(pipeline): State<GuardedPipelineManager>) -> impl IntoResponse {
    match pipeline.list_submissions().await {
        Ok(submissions) => Json(SubmissionsResponse { submissions }).into_response(),
        Err(e) => {
            warn!("Failed to list submissions: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ProcessErrorResponse {
                    success: false,
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// POST /process - blocks until the whole pipeline completes or fails.
async fn process_submission(
    State(pipeline): State<GuardedPipelineManager>,
    Json(body): Json<ProcessBody>,
) -> impl IntoResponse {
    match pipeline.process(&body.submission_id).await {
        Ok(report) => Json(ProcessSuccessResponse {
            success: true,
            release_id: report.release_id,
            artist: report.artist,
            title: report.title,
            tracks: report.track_count,
            cover_url: report.cover_url,
        })
        .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ProcessErrorResponse {
                success: false,
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

// =============================================================================
// Router Construction
// =============================================================================

pub fn pipeline_routes() -> Router<ServerState> {
    Router::new()
        .route("/health", get(health))
        .route("/submissions", get(list_submissions))
        .route("/process", post(process_submission))
        .route("/metrics", get(super::metrics::metrics_handler))
}
