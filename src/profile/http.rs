//! Profile store reached over HTTP.
//!
//! `GET {base_url}/users/{user_id}`: 200 → record JSON, 404 → no profile,
//! anything else → error.

use async_trait::async_trait;
use reqwest::StatusCode;
use url::Url;

use crate::profile::record::{ProfileRecord, ProfileStore, StoreError};

/// HTTP-backed profile store.
#[derive(Debug, Clone)]
pub struct HttpProfileStore {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpProfileStore {
    pub fn new(client: reqwest::Client, base_url: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
        })
    }

    /// URL of one user's profile. The id is percent-encoded as a path segment.
    pub fn profile_url(&self, user_id: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("users").push(user_id);
        }
        url
    }
}

#[async_trait]
impl ProfileStore for HttpProfileStore {
    async fn fetch_profile(&self, user_id: &str) -> Result<Option<ProfileRecord>, StoreError> {
        let response = self
            .client
            .get(self.profile_url(user_id))
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        match response.status() {
            StatusCode::OK => response
                .json::<ProfileRecord>()
                .await
                .map(Some)
                .map_err(|e| StoreError::Decode(e.to_string())),
            StatusCode::NOT_FOUND => Ok(None),
            status => Err(StoreError::Status(status.as_u16())),
        }
    }
}
