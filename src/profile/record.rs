//! Profile records and the profile store seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A stored user profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    /// Store object id.
    #[serde(rename = "_id")]
    pub object_id: String,
    /// Identity provider user id this profile belongs to.
    #[serde(rename = "id")]
    pub user_id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub onboarded: bool,
}

/// Errors reported by a profile store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("profile store unavailable: {0}")]
    Unavailable(String),

    #[error("profile query failed with status {0}")]
    Status(u16),

    #[error("invalid profile record: {0}")]
    Decode(String),
}

/// Looks up the profile stored for a user.
///
/// `Ok(None)` means the user has no profile yet.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn fetch_profile(&self, user_id: &str) -> Result<Option<ProfileRecord>, StoreError>;
}
