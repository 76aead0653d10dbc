//! Identity provider reached over HTTP.
//!
//! `GET {base_url}/{session_path}` (base path kept) with the caller's bearer token:
//! 200 → session JSON, 401/404 → no session, anything else → error.

use async_trait::async_trait;
use reqwest::StatusCode;
use url::Url;

use crate::identity::session::{Credentials, IdentityProvider, ProviderError, Session};

/// HTTP-backed identity provider.
#[derive(Debug, Clone)]
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    session_url: Url,
}

impl HttpIdentityProvider {
    pub fn new(client: reqwest::Client, base_url: &str, session_path: &str) -> Result<Self, url::ParseError> {
        let mut session_url = Url::parse(base_url)?;
        // Appended segment by segment so a base path like `/api` is kept.
        session_url
            .path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(session_path.split('/').filter(|s| !s.is_empty()));
        Ok(Self { client, session_url })
    }

    pub fn session_url(&self) -> &Url {
        &self.session_url
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn current_session(&self, credentials: &Credentials) -> Result<Option<Session>, ProviderError> {
        let Some(token) = credentials.token() else {
            return Ok(None);
        };

        let response = self
            .client
            .get(self.session_url.clone())
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        match response.status() {
            StatusCode::OK => response
                .json::<Session>()
                .await
                .map(Some)
                .map_err(|e| ProviderError::Decode(e.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND => Ok(None),
            status => Err(ProviderError::Status(status.as_u16())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_url_join() {
        let provider =
            HttpIdentityProvider::new(reqwest::Client::new(), "http://idp.internal:4000", "/v1/session").unwrap();
        assert_eq!(provider.session_url().as_str(), "http://idp.internal:4000/v1/session");
    }

    #[test]
    fn test_session_url_keeps_base_path() {
        let provider =
            HttpIdentityProvider::new(reqwest::Client::new(), "http://idp.internal/api", "/v1/session").unwrap();
        assert_eq!(provider.session_url().as_str(), "http://idp.internal/api/v1/session");

        let provider =
            HttpIdentityProvider::new(reqwest::Client::new(), "http://idp.internal/api/", "v1/session").unwrap();
        assert_eq!(provider.session_url().as_str(), "http://idp.internal/api/v1/session");
    }

    #[test]
    fn test_rejects_bad_base_url() {
        assert!(HttpIdentityProvider::new(reqwest::Client::new(), "mailto:ops@idp.internal", "/v1/session").is_err());
        assert!(HttpIdentityProvider::new(reqwest::Client::new(), "::nope", "/v1/session").is_err());
    }

    #[tokio::test]
    async fn test_anonymous_short_circuits_without_network() {
        // Nothing listens on port 9; an anonymous lookup must not try.
        let provider = HttpIdentityProvider::new(reqwest::Client::new(), "http://127.0.0.1:9", "/v1/session").unwrap();
        let session = provider.current_session(&Credentials::anonymous()).await.unwrap();
        assert!(session.is_none());
    }
}
