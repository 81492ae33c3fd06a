// Shared fixtures for the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use blog_aggregator::{
    AggregatorConfig, Category, ConfigInputs, FeedFetcher, FeedSource, FetchError, Profile,
    RawFeedItem,
};
use blog_aggregator::types::FetchFailure;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub const ALPHA_URL: &str = "https://alpha.example.com/feed";
pub const BETA_URL: &str = "https://beta.example.com/feed";
pub const GAMMA_URL: &str = "https://gamma.example.com/feed";

pub fn three_sources() -> Vec<FeedSource> {
    vec![
        FeedSource::new(ALPHA_URL, "Alpha", Category::SoftwareEngineering).with_priority(3),
        FeedSource::new(BETA_URL, "Beta", Category::CloudDevops).with_priority(2),
        FeedSource::new(GAMMA_URL, "Gamma", Category::Security).with_priority(1),
    ]
}

/// Development profile with the three test sources and caching as requested.
pub fn config(caching_enabled: bool) -> Arc<AggregatorConfig> {
    let mut inputs = ConfigInputs::new(Profile::Development).with_sources(three_sources());
    inputs.caching_enabled = Some(caching_enabled);
    Arc::new(AggregatorConfig::resolve(inputs).expect("test config must resolve"))
}

pub fn item(link: &str, title: &str, description: &str, published: DateTime<Utc>) -> RawFeedItem {
    RawFeedItem {
        title: title.to_string(),
        description: description.to_string(),
        link: link.to_string(),
        pub_date: published.format("%Y-%m-%d %H:%M:%S").to_string(),
    }
}

/// Fetcher that answers from a per-URL script and counts calls.
#[derive(Default)]
pub struct StubFetcher {
    responses: Mutex<HashMap<String, Option<Vec<RawFeedItem>>>>,
    calls: AtomicUsize,
}

impl StubFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, url: &str, items: Vec<RawFeedItem>) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), Some(items));
    }

    pub fn fail(&self, url: &str) {
        self.responses.lock().unwrap().insert(url.to_string(), None);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedFetcher for StubFetcher {
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<RawFeedItem>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.responses.lock().unwrap().get(&source.url).cloned();
        match scripted {
            Some(Some(items)) => Ok(items),
            _ => Err(FetchError::new(
                source,
                FetchFailure::Status {
                    status: "error".to_string(),
                    message: "scripted failure".to_string(),
                },
            )),
        }
    }
}
