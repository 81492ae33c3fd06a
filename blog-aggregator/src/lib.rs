pub mod types;
pub mod config;
pub mod sources;
pub mod traits;
pub mod fetcher;
pub mod classifier;
pub mod normalizer;
pub mod merge;
pub mod store;
pub mod cache;
pub mod aggregator;

pub use types::*;
pub use config::{AggregatorConfig, CacheConfig, ConfigInputs, FetchConfig, Profile};
pub use sources::SourceRegistry;
pub use traits::{FeedFetcher, KeyValueStore};
pub use fetcher::Fetcher;
pub use classifier::Classifier;
pub use normalizer::PostNormalizer;
pub use store::{MemoryStore, SqliteStore};
pub use cache::CacheStore;
pub use aggregator::{AggregatorState, BlogAggregator, CategoryCount, PostFilter, PostsResponse};
