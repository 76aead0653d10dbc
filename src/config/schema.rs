//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::resilience::{AbandonPolicy, Deadline};
use crate::upload::MediaKind;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Identity provider session lookup.
    pub identity: IdentityConfig,

    /// User-profile store lookup.
    pub profiles: ProfileConfig,

    /// Deadline gate behavior.
    pub gate: GateConfig,

    /// Onboarding page settings.
    pub onboarding: OnboardingConfig,

    /// Upload route settings.
    pub upload: UploadConfig,

    /// Outer HTTP timeouts.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Identity provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Base URL of the identity provider API.
    pub base_url: String,

    /// Path returning the session for a bearer token.
    pub session_path: String,

    /// Deadline for the session lookup on the onboarding page.
    pub page_deadline_ms: Deadline,

    /// Deadline for the session lookup before an upload.
    pub upload_deadline_ms: Deadline,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:4000".to_string(),
            session_path: "/v1/session".to_string(),
            page_deadline_ms: Deadline::from_millis(4000),
            upload_deadline_ms: Deadline::from_millis(5000),
        }
    }
}

/// Profile store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Base URL of the profile store API.
    pub base_url: String,

    /// Deadline for a profile lookup.
    pub deadline_ms: Deadline,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:4001".to_string(),
            deadline_ms: Deadline::from_millis(5000),
        }
    }
}

/// Deadline gate configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GateConfig {
    /// What to do with an operation that misses its deadline.
    pub on_timeout: AbandonPolicy,
}

/// Onboarding page configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OnboardingConfig {
    /// Where already-onboarded users are sent.
    pub home_path: String,
}

impl Default for OnboardingConfig {
    fn default() -> Self {
        Self {
            home_path: "/".to_string(),
        }
    }
}

/// Upload route configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Route identifier used in the upload URL.
    pub slug: String,

    /// Accepted media kind.
    pub accept: MediaKind,

    /// Maximum size of a single file in bytes.
    pub max_file_size_bytes: u64,

    /// Maximum number of files per upload.
    pub max_file_count: usize,

    /// Bearer secret the upload service presents on completion callbacks.
    pub callback_secret: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            slug: "media".to_string(),
            accept: MediaKind::Image,
            max_file_size_bytes: 4 * 1024 * 1024, // 4MB
            max_file_count: 1,
            // WARNING: This is a placeholder! Change this in production.
            callback_secret: "CHANGE_ME_IN_PRODUCTION".to_string(),
        }
    }
}

/// Outer HTTP timeouts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
