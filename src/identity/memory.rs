//! In-process identity provider, keyed by token.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::identity::session::{Credentials, IdentityProvider, ProviderError, Session};

/// Token → session map with an optional simulated latency.
#[derive(Clone, Default)]
pub struct MemoryIdentityProvider {
    sessions: Arc<DashMap<String, Session>>,
    latency: Duration,
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every lookup by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn insert(&self, token: impl Into<String>, session: Session) {
        self.sessions.insert(token.into(), session);
    }

    pub fn revoke(&self, token: &str) {
        self.sessions.remove(token);
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn current_session(&self, credentials: &Credentials) -> Result<Option<Session>, ProviderError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(credentials
            .token()
            .and_then(|token| self.sessions.get(token).map(|s| s.value().clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lookup_by_token() {
        let provider = MemoryIdentityProvider::new();
        provider.insert("tok", Session::new("user_1"));

        let found = provider.current_session(&Credentials::bearer("tok")).await.unwrap();
        assert_eq!(found.map(|s| s.user_id), Some("user_1".to_string()));

        assert!(provider.current_session(&Credentials::bearer("other")).await.unwrap().is_none());
        assert!(provider.current_session(&Credentials::anonymous()).await.unwrap().is_none());

        provider.revoke("tok");
        assert!(provider.current_session(&Credentials::bearer("tok")).await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_is_applied() {
        let provider = MemoryIdentityProvider::new().with_latency(Duration::from_millis(100));
        let start = tokio::time::Instant::now();
        provider.current_session(&Credentials::anonymous()).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(100));
    }
}
