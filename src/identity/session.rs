//! Session types and the identity provider seam.

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Cookie the identity provider's browser SDK stores the session token in.
pub const SESSION_COOKIE: &str = "__session";

/// The identity provider's view of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Provider user id.
    #[serde(alias = "id")]
    pub user_id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            username: None,
            first_name: None,
            image_url: None,
        }
    }
}

/// Request credentials, passed explicitly to the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    token: Option<String>,
}

impl Credentials {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        let token = token.into();
        Self {
            token: (!token.is_empty()).then_some(token),
        }
    }

    /// Extract credentials from an `Authorization: Bearer` header, falling
    /// back to the session cookie.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim);
        if let Some(token) = bearer {
            return Self::bearer(token);
        }

        let cookie = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == SESSION_COOKIE)
            .map(|(_, value)| value.trim());
        match cookie {
            Some(token) => Self::bearer(token),
            None => Self::anonymous(),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

/// Errors reported by an identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Provider could not be reached.
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),

    /// Provider answered with an unexpected status.
    #[error("identity provider returned status {0}")]
    Status(u16),

    /// Provider response could not be decoded.
    #[error("invalid identity provider response: {0}")]
    Decode(String),
}

/// Looks up the session behind a set of credentials.
///
/// `Ok(None)` means there is no signed-in user.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_session(&self, credentials: &Credentials) -> Result<Option<Session>, ProviderError>;
}
