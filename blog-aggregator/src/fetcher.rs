use crate::config::FetchConfig;
use crate::traits::FeedFetcher;
use crate::types::{FeedSource, FetchError, FetchFailure, ParseError, RawFeedItem, Result};
use async_trait::async_trait;
use backoff::backoff::{Backoff, Constant};
use reqwest::Client;
use serde::Deserialize;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use url::Url;

/// Response body of the feed-to-JSON conversion endpoint.
#[derive(Debug, Deserialize)]
struct ConvertedFeed {
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    feed: Option<ConvertedFeedInfo>,
    #[serde(default)]
    items: Vec<RawFeedItem>,
}

#[derive(Debug, Deserialize)]
struct ConvertedFeedInfo {
    #[serde(default)]
    title: Option<String>,
}

/// Fetches feeds through the conversion endpoint.
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()?;

        Ok(Self { client, config })
    }

    pub fn request_url(&self, source: &FeedSource) -> Url {
        let mut url = self.config.api_base_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("rss_url", &source.url);
            if let Some(api_key) = &self.config.api_key {
                query.append_pair("api_key", api_key);
            }
            query.append_pair("count", &self.config.max_count.to_string());
        }
        url
    }

    pub async fn fetch_feed(
        &self,
        source: &FeedSource,
    ) -> std::result::Result<Vec<RawFeedItem>, FetchError> {
        let start_time = Instant::now();
        let url = self.request_url(source);
        let max_attempts = self.config.retry_attempts.saturating_add(1);
        let mut backoff = Constant::new(self.config.retry_delay);
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!("Fetching {} (attempt {}/{})", source.url, attempt, max_attempts);

            match self.fetch_once(url.clone()).await {
                Ok(mut items) => {
                    items.truncate(self.config.max_count as usize);
                    info!(
                        "Fetched {} items from {} in {}ms",
                        items.len(),
                        source.display_name,
                        start_time.elapsed().as_millis()
                    );
                    return Ok(items);
                }
                Err(cause) => {
                    if cause.is_transient() && attempt < max_attempts {
                        if let Some(delay) = backoff.next_backoff() {
                            warn!(
                                "Attempt {} failed for {}: {}, retrying in {:?}",
                                attempt, source.url, cause, delay
                            );
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                    }

                    error!(
                        "Failed to fetch {} after {} attempt(s): {}",
                        source.url, attempt, cause
                    );
                    return Err(FetchError::new(source, cause));
                }
            }
        }
    }

    async fn fetch_once(&self, url: Url) -> std::result::Result<Vec<RawFeedItem>, FetchFailure> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::HttpStatus(status.as_u16()));
        }

        let body = response.text().await?;
        decode_feed_response(&body)
    }
}

#[async_trait]
impl FeedFetcher for Fetcher {
    async fn fetch(&self, source: &FeedSource) -> std::result::Result<Vec<RawFeedItem>, FetchError> {
        self.fetch_feed(source).await
    }
}

/// Decodes a conversion endpoint body; anything but `status: "ok"` is a failure.
pub fn decode_feed_response(body: &str) -> std::result::Result<Vec<RawFeedItem>, FetchFailure> {
    let feed: ConvertedFeed = serde_json::from_str(body).map_err(ParseError::from)?;

    match feed.status.as_deref() {
        None => Err(ParseError::MissingStatus.into()),
        Some("ok") => {
            if let Some(title) = feed.feed.and_then(|info| info.title) {
                debug!("Decoded {} items from feed {:?}", feed.items.len(), title);
            }
            Ok(feed.items)
        }
        Some(other) => Err(FetchFailure::Status {
            status: other.to_string(),
            message: feed.message.unwrap_or_default(),
        }),
    }
}
