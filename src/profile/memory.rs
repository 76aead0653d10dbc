//! In-process profile store, keyed by user id.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::profile::record::{ProfileRecord, ProfileStore, StoreError};

#[derive(Clone, Default)]
pub struct MemoryProfileStore {
    profiles: Arc<DashMap<String, ProfileRecord>>,
    latency: Duration,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every lookup by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn upsert(&self, record: ProfileRecord) {
        self.profiles.insert(record.user_id.clone(), record);
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn fetch_profile(&self, user_id: &str) -> Result<Option<ProfileRecord>, StoreError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(self.profiles.get(user_id).map(|r| r.value().clone()))
    }
}
