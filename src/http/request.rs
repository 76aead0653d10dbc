//! Request identification and credential extraction.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) for every request
//! - Expose the request ID to handlers and spans
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - An incoming `x-request-id` is kept, not replaced
//! - The ID is echoed back on the response

use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tracing::Span;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestIdLayer;

impl MakeRequestId for RequestIdLayer {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

impl RequestIdLayer {
    /// Layer that assigns the ID on the way in.
    pub fn set() -> SetRequestIdLayer<Self> {
        SetRequestIdLayer::new(X_REQUEST_ID, Self)
    }

    /// Layer that copies the ID onto the response.
    pub fn propagate() -> PropagateRequestIdLayer {
        PropagateRequestIdLayer::new(X_REQUEST_ID)
    }
}

/// Read the request ID assigned by `RequestIdLayer`.
pub trait RequestIdExt {
    fn request_id(&self) -> &str;
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> &str {
        self.headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
    }
}

/// Span for one HTTP request, tagged with its ID.
pub fn make_request_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request.request_id(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generates_uuid_ids() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let mut maker = RequestIdLayer;
        let id = maker.make_request_id(&request).unwrap();
        let id = id.header_value().to_str().unwrap().to_string();
        assert!(uuid::Uuid::parse_str(&id).is_ok());

        let other = maker.make_request_id(&request).unwrap();
        assert_ne!(other.header_value().to_str().unwrap(), id);
    }

    #[test]
    fn test_request_id_ext() {
        let request = Request::builder()
            .uri("/")
            .header("x-request-id", "abc-123")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request.request_id(), "abc-123");

        let bare = Request::builder().uri("/").body(Body::empty()).unwrap();
        assert_eq!(bare.request_id(), "unknown");
    }
}
