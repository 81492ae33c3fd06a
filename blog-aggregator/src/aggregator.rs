use crate::cache::CacheStore;
use crate::config::AggregatorConfig;
use crate::merge::merge_posts;
use crate::normalizer::PostNormalizer;
use crate::traits::{FeedFetcher, KeyValueStore};
use crate::types::{
    AggregationError, CachedCollection, Category, FeedSource, FetchError, Post, RawFeedItem,
    Result,
};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::sync::{Arc, RwLock};
use tracing::{debug, error, info, warn};

/// Where the facade is in an aggregation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregatorState {
    Idle,
    CheckingCache,
    Fetching,
    Merging,
    Persisting,
    Fallback,
    /// Holding data, fresh or stale.
    Ready,
    /// Last cycle produced no data at all.
    Failed,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostsResponse {
    pub posts: Vec<Post>,
    pub is_stale: bool,
    pub fetched_at: Option<DateTime<Utc>>,
    /// Display names of sources that failed in this cycle.
    pub failed_sources: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: Category,
    pub count: usize,
}

/// Result of fanning out to every source.
#[derive(Debug, Default)]
pub struct FetchReport {
    pub batches: Vec<(FeedSource, Vec<RawFeedItem>)>,
    pub failures: Vec<FetchError>,
}

impl FetchReport {
    pub fn all_failed(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn failed_sources(&self) -> Vec<String> {
        self.failures
            .iter()
            .map(|failure| failure.source_name.clone())
            .collect()
    }
}

/// View-side selection over a post collection. Archived posts are hidden
/// unless asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostFilter {
    pub category: Option<Category>,
    pub include_archived: bool,
}

impl PostFilter {
    pub fn apply<'a>(&self, posts: &'a [Post]) -> Vec<&'a Post> {
        posts
            .iter()
            .filter(|post| self.include_archived || !post.is_archived)
            .filter(|post| self.category.map_or(true, |category| post.category == category))
            .collect()
    }
}

/// Non-archived post counts for every category, in table order.
pub fn category_counts(posts: &[Post]) -> Vec<CategoryCount> {
    Category::ALL
        .into_iter()
        .map(|category| CategoryCount {
            category,
            count: posts
                .iter()
                .filter(|post| !post.is_archived && post.category == category)
                .count(),
        })
        .collect()
}

/// Single entry point the view layer reads posts through.
pub struct BlogAggregator {
    config: Arc<AggregatorConfig>,
    fetcher: Arc<dyn FeedFetcher>,
    cache: CacheStore,
    normalizer: PostNormalizer,
    state: RwLock<AggregatorState>,
}

impl BlogAggregator {
    pub fn new(
        config: Arc<AggregatorConfig>,
        fetcher: Arc<dyn FeedFetcher>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let cache = CacheStore::new(store, config.cache.clone());
        Self {
            config,
            fetcher,
            cache,
            normalizer: PostNormalizer::default(),
            state: RwLock::new(AggregatorState::Idle),
        }
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn state(&self) -> AggregatorState {
        match self.state.read() {
            Ok(state) => *state,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn transition(&self, next: AggregatorState) {
        let mut state = match self.state.write() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        debug!("Aggregator state {:?} -> {:?}", *state, next);
        *state = next;
    }

    pub async fn get_posts(&self, force_refresh: bool) -> Result<PostsResponse> {
        self.get_posts_at(force_refresh, Utc::now()).await
    }

    /// `get_posts` against an explicit clock.
    pub async fn get_posts_at(&self, force_refresh: bool, now: DateTime<Utc>) -> Result<PostsResponse> {
        self.transition(AggregatorState::CheckingCache);
        let cached = self.cache.read().await;

        if !force_refresh {
            if let Some(collection) = &cached {
                if self.cache.is_fresh(collection, now) {
                    debug!("Serving {} cached posts", collection.posts.len());
                    self.transition(AggregatorState::Ready);
                    return Ok(PostsResponse {
                        posts: collection.posts.clone(),
                        is_stale: false,
                        fetched_at: Some(collection.fetched_at),
                        failed_sources: Vec::new(),
                    });
                }
            }
        }

        self.transition(AggregatorState::Fetching);
        let report = self.fetch_all().await;
        let failed_sources = report.failed_sources();

        if report.all_failed() {
            self.transition(AggregatorState::Fallback);
            return match cached {
                Some(collection) => {
                    warn!(
                        "All {} sources failed; serving {} stale posts from {}",
                        report.failures.len(),
                        collection.posts.len(),
                        collection.fetched_at
                    );
                    self.transition(AggregatorState::Ready);
                    Ok(PostsResponse {
                        posts: collection.posts,
                        is_stale: true,
                        fetched_at: Some(collection.fetched_at),
                        failed_sources,
                    })
                }
                None => {
                    error!("All {} sources failed and nothing is cached", report.failures.len());
                    self.transition(AggregatorState::Failed);
                    Err(AggregationError {
                        failures: report.failures,
                    }
                    .into())
                }
            };
        }

        for failure in &report.failures {
            warn!("Partial failure: {}", failure);
        }

        self.transition(AggregatorState::Merging);
        let fresh: Vec<Post> = report
            .batches
            .into_iter()
            .flat_map(|(source, items)| self.normalizer.normalize_batch(items, &source, now))
            .collect();
        let previous = cached.map(|collection| collection.posts).unwrap_or_default();
        let outcome = merge_posts(&previous, fresh, now);

        self.transition(AggregatorState::Persisting);
        let collection = CachedCollection {
            posts: outcome.posts,
            fetched_at: now,
        };
        if let Err(err) = self.cache.write(&collection).await {
            error!("Failed to persist {} posts: {}", collection.posts.len(), err);
        }

        info!(
            "Aggregated {} posts ({} new, {} updated, {} archived, {} sources failed)",
            collection.posts.len(),
            outcome.stats.added,
            outcome.stats.updated,
            outcome.stats.archived,
            failed_sources.len()
        );
        self.transition(AggregatorState::Ready);

        Ok(PostsResponse {
            posts: collection.posts,
            is_stale: false,
            fetched_at: Some(collection.fetched_at),
            failed_sources,
        })
    }

    /// Fetches every source concurrently, highest priority first in the report.
    pub async fn fetch_all(&self) -> FetchReport {
        let sources = self.config.sources.by_priority();
        info!("Fetching {} sources", sources.len());

        let results = join_all(sources.into_iter().map(|source| {
            let fetcher = Arc::clone(&self.fetcher);
            async move { (source, fetcher.fetch(source).await) }
        }))
        .await;

        let mut report = FetchReport::default();
        for (source, result) in results {
            match result {
                Ok(items) => report.batches.push((source.clone(), items)),
                Err(err) => report.failures.push(err),
            }
        }
        report
    }

    /// Category counts over the cached collection; zeros when nothing is cached.
    pub async fn get_categories(&self) -> Vec<CategoryCount> {
        let posts = self
            .cache
            .read()
            .await
            .map(|collection| collection.posts)
            .unwrap_or_default();
        category_counts(&posts)
    }
}
