//! Request logging middleware

use std::time::Instant;

use axum::{body::Body, http::Request, middleware::Next, response::IntoResponse};
use tracing::info;

use super::metrics::record_http_request;

pub async fn log_requests(request: Request<Body>, next: Next) -> impl IntoResponse {
    let start = Instant::now();

    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    info!(">>> {} {}", method, path);

    let response = next.run(request).await;

    let status = response.status().as_u16();
    record_http_request(&method, &path, status);
    info!(
        "<<< {} {} {} ({} ms)",
        method,
        path,
        status,
        start.elapsed().as_millis()
    );

    response
}
