//! Upload authentication middleware.
//! Nothing reaches an upload handler without a resolved uploader.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::request::RequestIdExt;
use crate::http::response::rejection_response;
use crate::http::server::AppState;
use crate::identity::Credentials;
use crate::observability::metrics;

pub async fn upload_auth_middleware(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let runtime = state.inner.load_full();

    // 1. Unknown routes are rejected before any identity lookup.
    if runtime.uploads.route().slug != slug {
        return (StatusCode::NOT_FOUND, "No such upload route").into_response();
    }

    // 2. Resolve the uploader through the gate. Anything but a session rejects.
    let credentials = Credentials::from_headers(req.headers());
    match runtime.uploads.authenticate(credentials).await {
        Ok(context) => {
            tracing::debug!(request_id = %req.request_id(), user_id = %context.user_id, "Upload caller authenticated");
            req.extensions_mut().insert(context);
            next.run(req).await
        }
        Err(rejection) => {
            tracing::warn!(request_id = %req.request_id(), reason = %rejection, "Upload rejected");
            metrics::record_upload_authorization(rejection.kind());
            rejection_response(&rejection)
        }
    }
}
