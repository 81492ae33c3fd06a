use crate::types::{FeedSource, FetchError, RawFeedItem, StorageError};
use async_trait::async_trait;

/// Retrieves raw items for one feed source.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    /// Fetch up to the configured item count from `source`.
    ///
    /// Retries, if any, happen inside the implementation; an `Err` is final
    /// for this aggregation cycle.
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<RawFeedItem>, FetchError>;
}

/// Local key-value storage the post cache is persisted in.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replaces the value for `key` in one step.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}
