use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Topical category a post is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    AiMl,
    WebDevelopment,
    CloudDevops,
    Security,
    DataEngineering,
    SoftwareEngineering,
}

impl Category {
    /// Every category, in keyword-table order.
    pub const ALL: [Category; 6] = [
        Category::AiMl,
        Category::WebDevelopment,
        Category::CloudDevops,
        Category::Security,
        Category::DataEngineering,
        Category::SoftwareEngineering,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::AiMl => "ai-ml",
            Category::WebDevelopment => "web-development",
            Category::CloudDevops => "cloud-devops",
            Category::Security => "security",
            Category::DataEngineering => "data-engineering",
            Category::SoftwareEngineering => "software-engineering",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::AiMl => "AI & Machine Learning",
            Category::WebDevelopment => "Web Development",
            Category::CloudDevops => "Cloud & DevOps",
            Category::Security => "Security",
            Category::DataEngineering => "Data Engineering",
            Category::SoftwareEngineering => "Software Engineering",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == wanted)
            .ok_or_else(|| ConfigurationError::UnknownCategory(s.to_string()))
    }
}

/// A configured external publication to poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    pub url: String,
    pub display_name: String,
    pub category: Category,
    pub priority_weight: i32,
}

impl FeedSource {
    pub fn new(url: impl Into<String>, display_name: impl Into<String>, category: Category) -> Self {
        Self {
            url: url.into(),
            display_name: display_name.into(),
            category,
            priority_weight: 0,
        }
    }

    pub fn with_priority(mut self, priority_weight: i32) -> Self {
        self.priority_weight = priority_weight;
        self
    }
}

/// One item as returned by the feed conversion endpoint. Untrusted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFeedItem {
    #[serde(default, deserialize_with = "string_or_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub description: String,
    #[serde(default, deserialize_with = "string_or_empty")]
    pub link: String,
    #[serde(default, rename = "pubDate", deserialize_with = "string_or_empty")]
    pub pub_date: String,
}

fn string_or_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Canonical post record handed to the view layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    pub description: String,
    pub link: String,
    /// `None` when the feed's date could not be parsed.
    #[serde(rename = "publicationDateIso")]
    pub published_at: Option<DateTime<Utc>>,
    pub source_name: String,
    pub category: Category,
    pub is_archived: bool,
    #[serde(rename = "createdAtIso")]
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Date shown next to the post; unparseable dates fall back to a fixed label.
    pub fn date_label(&self) -> String {
        match self.published_at {
            Some(date) => date.format("%B %-d, %Y").to_string(),
            None => "Unknown date".to_string(),
        }
    }

    /// Timestamp used for ordering: publication date, or first-seen time.
    pub fn sort_date(&self) -> DateTime<Utc> {
        self.published_at.unwrap_or(self.created_at)
    }
}

/// The persisted post collection. Replaced wholesale on every refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedCollection {
    pub posts: Vec<Post>,
    #[serde(rename = "fetchedAtIso")]
    pub fetched_at: DateTime<Utc>,
}

/// Why a single attempt against the conversion endpoint failed.
#[derive(Debug, thiserror::Error)]
pub enum FetchFailure {
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("request timed out")]
    Timeout,

    #[error("unexpected HTTP status {0}")]
    HttpStatus(u16),

    #[error("feed converter reported status {status:?}: {message}")]
    Status { status: String, message: String },

    #[error("malformed response: {0}")]
    Malformed(#[from] ParseError),
}

impl FetchFailure {
    /// Transport errors, timeouts, 429 and 5xx are worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchFailure::Request(_) | FetchFailure::Timeout => true,
            FetchFailure::HttpStatus(code) => *code == 429 || *code >= 500,
            FetchFailure::Status { .. } | FetchFailure::Malformed(_) => false,
        }
    }
}

impl From<reqwest::Error> for FetchFailure {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            FetchFailure::Timeout
        } else {
            FetchFailure::Request(error)
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("failed to fetch {source_name} ({url}): {cause}")]
pub struct FetchError {
    pub source_name: String,
    pub url: String,
    #[source]
    pub cause: FetchFailure,
}

impl FetchError {
    pub fn new(source: &FeedSource, cause: FetchFailure) -> Self {
        Self {
            source_name: source.display_name.clone(),
            url: source.url.clone(),
            cause,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("response has no status field")]
    MissingStatus,

    #[error("item has no link")]
    MissingLink,

    #[error("unrecognized date {0:?}")]
    Date(String),
}

#[derive(Debug, thiserror::Error)]
#[error("all {} feed sources failed and no cached posts are available", .failures.len())]
pub struct AggregationError {
    pub failures: Vec<FetchError>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("an API key is required in the {profile} profile")]
    MissingApiKey { profile: String },

    #[error("max item count {0} is outside 1..=100")]
    MaxCountOutOfRange(u32),

    #[error("timeout {0}ms is outside 1000..=30000")]
    TimeoutOutOfRange(u64),

    #[error("{name} must be a number, got {value:?}")]
    InvalidNumber { name: String, value: String },

    #[error("{name} must be true or false, got {value:?}")]
    InvalidBool { name: String, value: String },

    #[error("unknown profile {0:?}")]
    UnknownProfile(String),

    #[error("unknown category {0:?}")]
    UnknownCategory(String),

    #[error("retry attempts {0} is outside 0..=10")]
    RetryAttemptsOutOfRange(u32),

    #[error("invalid API base URL: {0}")]
    InvalidApiBaseUrl(#[from] url::ParseError),

    #[error("API base URL {0:?} is not an http(s) URL")]
    UnsupportedApiScheme(String),

    #[error("feed URL {0:?} is not an http(s) URL")]
    InvalidFeedUrl(String),

    #[error("feed URL {0:?} is configured more than once")]
    DuplicateFeedUrl(String),

    #[error("no feed sources configured")]
    NoSources,
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum BlogError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Aggregation(#[from] AggregationError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BlogError>;
