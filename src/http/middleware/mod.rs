pub mod callback_auth;
pub mod upload_auth;

use std::time::Instant;

use axum::{body::Body, http::Request, middleware::Next, response::Response};

use crate::observability::metrics;

pub use callback_auth::callback_auth_middleware;
pub use upload_auth::upload_auth_middleware;

/// Count every request by method and status.
pub async fn track_requests(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let response = next.run(request).await;
    tracing::debug!(
        method = %method,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Request finished"
    );
    metrics::record_request(&method, response.status().as_u16());
    response
}
