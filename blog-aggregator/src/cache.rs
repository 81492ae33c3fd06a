use crate::config::CacheConfig;
use crate::traits::KeyValueStore;
use crate::types::{CachedCollection, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

/// Owns the persisted post collection.
pub struct CacheStore {
    store: Arc<dyn KeyValueStore>,
    config: CacheConfig,
}

impl CacheStore {
    pub fn new(store: Arc<dyn KeyValueStore>, config: CacheConfig) -> Self {
        Self { store, config }
    }

    /// Last persisted collection. A missing, unreadable or corrupt payload is a miss.
    pub async fn read(&self) -> Option<CachedCollection> {
        let payload = match self.store.get(&self.config.storage_key).await {
            Ok(Some(payload)) => payload,
            Ok(None) => {
                debug!("No cached posts under {}", self.config.storage_key);
                return None;
            }
            Err(err) => {
                warn!("Could not read cached posts: {}", err);
                return None;
            }
        };

        match serde_json::from_str::<CachedCollection>(&payload) {
            Ok(collection) => Some(collection),
            Err(err) => {
                warn!("Ignoring corrupt cache payload under {}: {}", self.config.storage_key, err);
                None
            }
        }
    }

    /// Replaces the stored collection with a single write.
    pub async fn write(&self, collection: &CachedCollection) -> Result<()> {
        let payload = serde_json::to_string(collection)?;
        self.store.set(&self.config.storage_key, &payload).await?;
        debug!(
            "Cached {} posts under {}",
            collection.posts.len(),
            self.config.storage_key
        );
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        self.store.remove(&self.config.storage_key).await?;
        Ok(())
    }

    /// Always false when caching is disabled.
    pub fn is_fresh(&self, collection: &CachedCollection, now: DateTime<Utc>) -> bool {
        self.config.enabled && now.signed_duration_since(collection.fetched_at) < self.config.duration
    }
}
