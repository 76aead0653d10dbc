//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (deadlines > 0, limits >= 1)
//! - Check that upstream URLs and bind addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system, on startup and on reload

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::resilience::Deadline;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero (got {value})")]
    NonPositiveDeadline { field: &'static str, value: Deadline },

    #[error("{field} is not a valid URL: {value}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{field} is not a valid socket address: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} must be at least {min}")]
    OutOfRange { field: &'static str, min: u64 },

    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("onboarding.home_path must start with '/' (got {0})")]
    RelativeHomePath(String),

    #[error("timeouts.request_secs ({request_ms}ms) must exceed {path} deadlines ({gated_ms}ms)")]
    RequestTimeoutTooShort {
        path: &'static str,
        request_ms: i64,
        gated_ms: i64,
    },
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_deadline(&mut errors, "identity.page_deadline_ms", config.identity.page_deadline_ms);
    check_deadline(&mut errors, "identity.upload_deadline_ms", config.identity.upload_deadline_ms);
    check_deadline(&mut errors, "profiles.deadline_ms", config.profiles.deadline_ms);

    check_url(&mut errors, "identity.base_url", &config.identity.base_url);
    check_url(&mut errors, "profiles.base_url", &config.profiles.base_url);
    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_address(&mut errors, "observability.metrics_address", &config.observability.metrics_address);
    }

    if config.upload.slug.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "upload.slug" });
    }
    if config.upload.callback_secret.is_empty() {
        errors.push(ValidationError::Empty { field: "upload.callback_secret" });
    }
    if config.upload.max_file_count < 1 {
        errors.push(ValidationError::OutOfRange { field: "upload.max_file_count", min: 1 });
    }
    if config.upload.max_file_size_bytes < 1 {
        errors.push(ValidationError::OutOfRange { field: "upload.max_file_size_bytes", min: 1 });
    }
    if config.timeouts.request_secs < 1 {
        errors.push(ValidationError::OutOfRange { field: "timeouts.request_secs", min: 1 });
    }
    if !config.onboarding.home_path.starts_with('/') {
        errors.push(ValidationError::RelativeHomePath(config.onboarding.home_path.clone()));
    }

    // The outer request timeout must never fire before a gated outcome is rendered.
    let request_ms = i64::try_from(config.timeouts.request_secs.saturating_mul(1000)).unwrap_or(i64::MAX);
    let page_ms = config
        .identity
        .page_deadline_ms
        .as_millis()
        .saturating_add(config.profiles.deadline_ms.as_millis());
    check_request_timeout(&mut errors, "onboarding page", request_ms, page_ms);
    check_request_timeout(&mut errors, "upload", request_ms, config.identity.upload_deadline_ms.as_millis());

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_deadline(errors: &mut Vec<ValidationError>, field: &'static str, value: Deadline) {
    if value.duration().is_none() {
        errors.push(ValidationError::NonPositiveDeadline { field, value });
    }
}

fn check_request_timeout(errors: &mut Vec<ValidationError>, path: &'static str, request_ms: i64, gated_ms: i64) {
    if request_ms <= gated_ms {
        errors.push(ValidationError::RequestTimeoutTooShort {
            path,
            request_ms,
            gated_ms,
        });
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if url::Url::parse(value).is_err() {
        errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        });
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
