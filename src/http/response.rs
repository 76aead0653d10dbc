//! Mapping call-site results to HTTP responses.
//!
//! # Responsibilities
//! - Render every onboarding view (redirect, form, empty, error)
//! - Map upload rejections to status codes
//!
//! # Design Decisions
//! - The onboarding endpoint always answers with a renderable body
//! - Gate timeouts and dependency failures are 503 (retryable), never 500
//! - Upload rejections carry the rejection message in `error`

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde_json::json;

use crate::onboarding::OnboardingView;
use crate::upload::UploadRejection;

pub const FORM_TITLE: &str = "Onboarding";
pub const FORM_SUBTITLE: &str = "Complete your profile now to use Threads";
pub const FORM_BUTTON: &str = "Continue";
pub const ERROR_TITLE: &str = "Connection Error";

pub fn onboarding_response(view: OnboardingView) -> Response {
    match view {
        OnboardingView::RedirectHome { location } => Redirect::to(&location).into_response(),
        OnboardingView::Form(user) => (
            StatusCode::OK,
            Json(json!({
                "state": "form",
                "title": FORM_TITLE,
                "subtitle": FORM_SUBTITLE,
                "button_title": FORM_BUTTON,
                "user": user,
            })),
        )
            .into_response(),
        OnboardingView::Empty => (StatusCode::OK, Json(json!({ "state": "empty" }))).into_response(),
        OnboardingView::Error(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "state": "error",
                "title": ERROR_TITLE,
                "message": err.message,
                "retry": err.retryable,
                "stage": err.stage,
                "kind": err.kind,
            })),
        )
            .into_response(),
    }
}

pub fn rejection_status(rejection: &UploadRejection) -> StatusCode {
    match rejection {
        UploadRejection::Unauthorized => StatusCode::UNAUTHORIZED,
        UploadRejection::AuthenticationTimeout | UploadRejection::AuthenticationFailed(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        UploadRejection::NoFiles | UploadRejection::TooManyFiles { .. } => StatusCode::BAD_REQUEST,
        UploadRejection::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        UploadRejection::UnsupportedType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
    }
}

pub fn rejection_response(rejection: &UploadRejection) -> Response {
    (rejection_status(rejection), Json(json!({ "error": rejection.to_string() }))).into_response()
}
