//! Upload authorization.
//!
//! # Responsibilities
//! - Authenticate the uploader through the deadline gate
//! - Enforce the route's file constraints
//! - Produce the metadata the completion callback receives
//!
//! # Design Decisions
//! - Fail closed: timeout, provider failure, and missing session all reject
//! - Authentication runs before file checks

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::{Credentials, IdentityProvider};
use crate::observability::metrics;
use crate::resilience::{Deadline, DeadlineGate, Outcome};
use crate::upload::route::{FileDescriptor, FileRoute};

pub const AUTH_LABEL: &str = "User fetch";

/// Why an upload was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadRejection {
    #[error("Unauthorized - user not found")]
    Unauthorized,

    #[error("Authentication timeout - please try again")]
    AuthenticationTimeout,

    #[error("Authentication failed - please try again")]
    AuthenticationFailed(String),

    #[error("No files provided")]
    NoFiles,

    #[error("Too many files: at most {max} allowed, got {got}")]
    TooManyFiles { max: usize, got: usize },

    #[error("File {name} is {size} bytes, limit is {max}")]
    FileTooLarge { name: String, size: u64, max: u64 },

    #[error("File {name} has unsupported type {content_type}")]
    UnsupportedType { name: String, content_type: String },
}

impl UploadRejection {
    /// Metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            UploadRejection::Unauthorized => "unauthorized",
            UploadRejection::AuthenticationTimeout => "timeout",
            UploadRejection::AuthenticationFailed(_) => "auth_failed",
            UploadRejection::NoFiles
            | UploadRejection::TooManyFiles { .. }
            | UploadRejection::FileTooLarge { .. }
            | UploadRejection::UnsupportedType { .. } => "invalid_files",
        }
    }
}

/// Metadata handed to the completion callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadContext {
    pub user_id: String,
}

/// A granted upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorization {
    pub authorized: bool,
    pub context: UploadContext,
}

/// The upload route's authorization step.
#[derive(Clone)]
pub struct UploadAuthorizer {
    gate: DeadlineGate,
    identity: Arc<dyn IdentityProvider>,
    deadline: Deadline,
    route: FileRoute,
}

impl UploadAuthorizer {
    pub fn new(gate: DeadlineGate, identity: Arc<dyn IdentityProvider>, route: FileRoute) -> Self {
        Self {
            gate,
            identity,
            deadline: Deadline::from_millis(5000),
            route,
        }
    }

    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn route(&self) -> &FileRoute {
        &self.route
    }

    /// Resolve the uploader's identity. Any result other than a present
    /// session with a user id is a rejection.
    pub async fn authenticate(&self, credentials: Credentials) -> Result<UploadContext, UploadRejection> {
        tracing::debug!(route = %self.route.slug, "Starting user authentication");
        let identity = self.identity.clone();
        let outcome = self
            .gate
            .run(AUTH_LABEL, self.deadline, move || async move {
                identity.current_session(&credentials).await
            })
            .await;

        let result = match outcome {
            Outcome::Completed(Some(session)) if !session.user_id.is_empty() => Ok(UploadContext {
                user_id: session.user_id,
            }),
            Outcome::Completed(_) => Err(UploadRejection::Unauthorized),
            Outcome::TimedOut(_) => Err(UploadRejection::AuthenticationTimeout),
            Outcome::Failed(err) => Err(UploadRejection::AuthenticationFailed(err.to_string())),
        };

        match &result {
            Ok(ctx) => tracing::info!(user_id = %ctx.user_id, "User authenticated successfully"),
            Err(e) => tracing::warn!(route = %self.route.slug, reason = %e, "Upload authentication rejected"),
        }
        result
    }

    /// Full authorization: identity first, then the route's file limits.
    pub async fn authorize(
        &self,
        credentials: Credentials,
        files: &[FileDescriptor],
    ) -> Result<Authorization, UploadRejection> {
        let result = match self.authenticate(credentials).await {
            Ok(context) => self.permit(context, files),
            Err(e) => Err(e),
        };
        metrics::record_upload_authorization(match &result {
            Ok(_) => "authorized",
            Err(e) => e.kind(),
        });
        result
    }

    /// Check files for an already-authenticated uploader.
    pub fn permit(&self, context: UploadContext, files: &[FileDescriptor]) -> Result<Authorization, UploadRejection> {
        self.route.check(files)?;
        Ok(Authorization {
            authorized: true,
            context,
        })
    }
}
