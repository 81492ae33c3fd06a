use crate::sources::SourceRegistry;
use crate::types::{ConfigurationError, FeedSource};
use std::collections::HashSet;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "https://api.rss2json.com/v1/api.json";
pub const DEFAULT_STORAGE_KEY: &str = "blog-aggregator:posts";

pub const MAX_COUNT_RANGE: std::ops::RangeInclusive<u32> = 1..=100;
pub const TIMEOUT_MS_RANGE: std::ops::RangeInclusive<u64> = 1_000..=30_000;
pub const RETRY_ATTEMPTS_RANGE: std::ops::RangeInclusive<u32> = 0..=10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Development,
    Production,
    Test,
}

impl Profile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Development => "development",
            Profile::Production => "production",
            Profile::Test => "test",
        }
    }

    fn defaults(&self) -> ProfileDefaults {
        match self {
            Profile::Development => ProfileDefaults {
                timeout_ms: 8_000,
                retry_attempts: 1,
                retry_delay_ms: 500,
                cache_duration_ms: 5 * 60 * 1000,
                caching_enabled: true,
            },
            Profile::Production => ProfileDefaults {
                timeout_ms: 10_000,
                retry_attempts: 3,
                retry_delay_ms: 2_000,
                cache_duration_ms: 30 * 60 * 1000,
                caching_enabled: true,
            },
            Profile::Test => ProfileDefaults {
                timeout_ms: 5_000,
                retry_attempts: 0,
                retry_delay_ms: 0,
                cache_duration_ms: 5 * 60 * 1000,
                caching_enabled: false,
            },
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Profile {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Profile::Development),
            "production" | "prod" => Ok(Profile::Production),
            "test" => Ok(Profile::Test),
            _ => Err(ConfigurationError::UnknownProfile(s.to_string())),
        }
    }
}

struct ProfileDefaults {
    timeout_ms: u64,
    retry_attempts: u32,
    retry_delay_ms: u64,
    cache_duration_ms: u64,
    caching_enabled: bool,
}

/// Explicit inputs a configuration is resolved from. Unset overrides fall back
/// to the profile's defaults.
#[derive(Debug, Clone)]
pub struct ConfigInputs {
    pub profile: Profile,
    pub api_key: Option<String>,
    pub api_base_url: Option<String>,
    pub max_count: Option<u32>,
    pub timeout_ms: Option<u64>,
    pub cache_duration_ms: Option<u64>,
    pub retry_attempts: Option<u32>,
    pub retry_delay_ms: Option<u64>,
    pub caching_enabled: Option<bool>,
    pub sources: Option<Vec<FeedSource>>,
}

impl ConfigInputs {
    pub fn new(profile: Profile) -> Self {
        Self {
            profile,
            api_key: None,
            api_base_url: None,
            max_count: None,
            timeout_ms: None,
            cache_duration_ms: None,
            retry_attempts: None,
            retry_delay_ms: None,
            caching_enabled: None,
            sources: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_sources(mut self, sources: Vec<FeedSource>) -> Self {
        self.sources = Some(sources);
        self
    }

    /// Reads `BLOG_PROFILE`, `RSS2JSON_API_KEY`, `RSS2JSON_API_URL`, `BLOG_MAX_COUNT`,
    /// `BLOG_FETCH_TIMEOUT_MS`, `BLOG_CACHE_DURATION_MS`, `BLOG_RETRY_ATTEMPTS`,
    /// `BLOG_RETRY_DELAY_MS` and `BLOG_CACHE_ENABLED`.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let profile = match lookup("BLOG_PROFILE") {
            Some(value) => value.parse()?,
            None => Profile::Development,
        };

        Ok(Self {
            profile,
            api_key: lookup("RSS2JSON_API_KEY").filter(|key| !key.trim().is_empty()),
            api_base_url: lookup("RSS2JSON_API_URL"),
            max_count: parse_number(&lookup, "BLOG_MAX_COUNT")?,
            timeout_ms: parse_number(&lookup, "BLOG_FETCH_TIMEOUT_MS")?,
            cache_duration_ms: parse_number(&lookup, "BLOG_CACHE_DURATION_MS")?,
            retry_attempts: parse_number(&lookup, "BLOG_RETRY_ATTEMPTS")?,
            retry_delay_ms: parse_number(&lookup, "BLOG_RETRY_DELAY_MS")?,
            caching_enabled: parse_bool(&lookup, "BLOG_CACHE_ENABLED")?,
            sources: None,
        })
    }
}

fn parse_number<F, T>(lookup: &F, name: &str) -> Result<Option<T>, ConfigurationError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigurationError::InvalidNumber {
                name: name.to_string(),
                value,
            }),
    }
}

fn parse_bool<F>(lookup: &F, name: &str) -> Result<Option<bool>, ConfigurationError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigurationError::InvalidBool {
                name: name.to_string(),
                value,
            }),
        },
    }
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub api_base_url: Url,
    pub api_key: Option<String>,
    pub max_count: u32,
    pub timeout: Duration,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub enabled: bool,
    pub duration: chrono::Duration,
    pub storage_key: String,
}

/// Configuration resolved once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    pub profile: Profile,
    pub fetch: FetchConfig,
    pub cache: CacheConfig,
    pub sources: SourceRegistry,
}

impl AggregatorConfig {
    pub fn resolve(inputs: ConfigInputs) -> Result<Self, ConfigurationError> {
        let defaults = inputs.profile.defaults();

        let api_key = inputs.api_key.filter(|key| !key.trim().is_empty());
        if inputs.profile == Profile::Production && api_key.is_none() {
            return Err(ConfigurationError::MissingApiKey {
                profile: inputs.profile.to_string(),
            });
        }

        let max_count = inputs.max_count.unwrap_or(10);
        if !MAX_COUNT_RANGE.contains(&max_count) {
            return Err(ConfigurationError::MaxCountOutOfRange(max_count));
        }

        let timeout_ms = inputs.timeout_ms.unwrap_or(defaults.timeout_ms);
        if !TIMEOUT_MS_RANGE.contains(&timeout_ms) {
            return Err(ConfigurationError::TimeoutOutOfRange(timeout_ms));
        }

        let retry_attempts = inputs.retry_attempts.unwrap_or(defaults.retry_attempts);
        if !RETRY_ATTEMPTS_RANGE.contains(&retry_attempts) {
            return Err(ConfigurationError::RetryAttemptsOutOfRange(retry_attempts));
        }

        let api_base_url = Url::parse(
            inputs
                .api_base_url
                .as_deref()
                .unwrap_or(DEFAULT_API_BASE_URL),
        )?;
        if !matches!(api_base_url.scheme(), "http" | "https") {
            return Err(ConfigurationError::UnsupportedApiScheme(api_base_url.to_string()));
        }

        let sources = SourceRegistry::new(
            inputs
                .sources
                .unwrap_or_else(crate::sources::default_sources),
        )?;

        let cache_duration_ms = inputs.cache_duration_ms.unwrap_or(defaults.cache_duration_ms);

        Ok(Self {
            profile: inputs.profile,
            fetch: FetchConfig {
                user_agent: format!("blog-aggregator/{}", env!("CARGO_PKG_VERSION")),
                api_base_url,
                api_key,
                max_count,
                timeout: Duration::from_millis(timeout_ms),
                retry_attempts,
                retry_delay: Duration::from_millis(
                    inputs.retry_delay_ms.unwrap_or(defaults.retry_delay_ms),
                ),
            },
            cache: CacheConfig {
                enabled: inputs.caching_enabled.unwrap_or(defaults.caching_enabled),
                duration: chrono::Duration::milliseconds(
                    i64::try_from(cache_duration_ms).unwrap_or(i64::MAX),
                ),
                storage_key: DEFAULT_STORAGE_KEY.to_string(),
            },
            sources,
        })
    }

    pub fn for_profile(profile: Profile) -> Result<Self, ConfigurationError> {
        Self::resolve(ConfigInputs::new(profile))
    }
}

/// Rejects duplicate and non-http(s) feed URLs.
pub(crate) fn validate_sources(sources: &[FeedSource]) -> Result<(), ConfigurationError> {
    if sources.is_empty() {
        return Err(ConfigurationError::NoSources);
    }

    let mut seen = HashSet::new();
    for source in sources {
        let valid = Url::parse(&source.url)
            .map(|url| matches!(url.scheme(), "http" | "https"))
            .unwrap_or(false);
        if !valid {
            return Err(ConfigurationError::InvalidFeedUrl(source.url.clone()));
        }
        if !seen.insert(source.url.trim()) {
            return Err(ConfigurationError::DuplicateFeedUrl(source.url.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;
    use std::collections::HashMap;

    fn inputs_with_count(max_count: u32) -> ConfigInputs {
        let mut inputs = ConfigInputs::new(Profile::Development);
        inputs.max_count = Some(max_count);
        inputs
    }

    #[test]
    fn max_count_is_bounded() {
        assert!(matches!(
            AggregatorConfig::resolve(inputs_with_count(150)),
            Err(ConfigurationError::MaxCountOutOfRange(150))
        ));
        assert!(matches!(
            AggregatorConfig::resolve(inputs_with_count(0)),
            Err(ConfigurationError::MaxCountOutOfRange(0))
        ));

        let config = AggregatorConfig::resolve(inputs_with_count(10)).unwrap();
        assert_eq!(config.fetch.max_count, 10);
    }

    #[test]
    fn timeout_is_bounded() {
        let mut inputs = ConfigInputs::new(Profile::Development);
        inputs.timeout_ms = Some(999);
        assert!(matches!(
            AggregatorConfig::resolve(inputs.clone()),
            Err(ConfigurationError::TimeoutOutOfRange(999))
        ));

        inputs.timeout_ms = Some(30_001);
        assert!(AggregatorConfig::resolve(inputs.clone()).is_err());

        inputs.timeout_ms = Some(30_000);
        let config = AggregatorConfig::resolve(inputs).unwrap();
        assert_eq!(config.fetch.timeout, Duration::from_secs(30));
    }

    #[test]
    fn retry_attempts_are_bounded() {
        let mut inputs = ConfigInputs::new(Profile::Development);
        inputs.retry_attempts = Some(u32::MAX);
        assert!(matches!(
            AggregatorConfig::resolve(inputs.clone()),
            Err(ConfigurationError::RetryAttemptsOutOfRange(u32::MAX))
        ));

        inputs.retry_attempts = Some(11);
        assert!(AggregatorConfig::resolve(inputs.clone()).is_err());

        inputs.retry_attempts = Some(10);
        let config = AggregatorConfig::resolve(inputs).unwrap();
        assert_eq!(config.fetch.retry_attempts, 10);

        let from_env = ConfigInputs::from_lookup(|name| {
            (name == "BLOG_RETRY_ATTEMPTS").then(|| "4294967295".to_string())
        })
        .unwrap();
        assert!(matches!(
            AggregatorConfig::resolve(from_env),
            Err(ConfigurationError::RetryAttemptsOutOfRange(_))
        ));
    }

    #[test]
    fn api_base_url_must_be_http() {
        let mut inputs = ConfigInputs::new(Profile::Development);
        inputs.api_base_url = Some("ftp://converter.example.com/v1/api.json".to_string());
        assert!(matches!(
            AggregatorConfig::resolve(inputs.clone()),
            Err(ConfigurationError::UnsupportedApiScheme(_))
        ));

        inputs.api_base_url = Some("not a url".to_string());
        assert!(matches!(
            AggregatorConfig::resolve(inputs),
            Err(ConfigurationError::InvalidApiBaseUrl(_))
        ));
    }

    #[test]
    fn production_requires_api_key() {
        assert!(matches!(
            AggregatorConfig::for_profile(Profile::Production),
            Err(ConfigurationError::MissingApiKey { .. })
        ));
        assert!(matches!(
            AggregatorConfig::resolve(ConfigInputs::new(Profile::Production).with_api_key("  ")),
            Err(ConfigurationError::MissingApiKey { .. })
        ));

        let config =
            AggregatorConfig::resolve(ConfigInputs::new(Profile::Production).with_api_key("secret"))
                .unwrap();
        assert_eq!(config.fetch.api_key.as_deref(), Some("secret"));
        assert_eq!(config.fetch.retry_attempts, 3);
        assert_eq!(config.cache.duration, chrono::Duration::minutes(30));
    }

    #[test]
    fn profiles_differ_in_retry_and_cache_policy() {
        let dev = AggregatorConfig::for_profile(Profile::Development).unwrap();
        let test = AggregatorConfig::for_profile(Profile::Test).unwrap();
        let prod =
            AggregatorConfig::resolve(ConfigInputs::new(Profile::Production).with_api_key("k"))
                .unwrap();

        assert!(prod.fetch.retry_attempts > dev.fetch.retry_attempts);
        assert!(prod.fetch.retry_delay > dev.fetch.retry_delay);
        assert!(prod.cache.duration > dev.cache.duration);
        assert!(dev.cache.enabled);
        assert!(!test.cache.enabled);
        assert_eq!(test.fetch.retry_attempts, 0);
    }

    #[test]
    fn rejects_bad_sources() {
        let inputs = ConfigInputs::new(Profile::Test).with_sources(Vec::new());
        assert!(matches!(
            AggregatorConfig::resolve(inputs),
            Err(ConfigurationError::NoSources)
        ));

        let inputs = ConfigInputs::new(Profile::Test).with_sources(vec![FeedSource::new(
            "ftp://example.com/feed",
            "Ftp",
            Category::Security,
        )]);
        assert!(matches!(
            AggregatorConfig::resolve(inputs),
            Err(ConfigurationError::InvalidFeedUrl(_))
        ));

        let source = FeedSource::new("https://example.com/feed", "A", Category::Security);
        let inputs = ConfigInputs::new(Profile::Test).with_sources(vec![source.clone(), source]);
        assert!(matches!(
            AggregatorConfig::resolve(inputs),
            Err(ConfigurationError::DuplicateFeedUrl(_))
        ));
    }

    #[test]
    fn reads_inputs_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("BLOG_PROFILE", "prod"),
            ("RSS2JSON_API_KEY", "abc"),
            ("BLOG_MAX_COUNT", "25"),
            ("BLOG_CACHE_ENABLED", "off"),
        ]
        .into_iter()
        .collect();

        let inputs = ConfigInputs::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap();
        assert_eq!(inputs.profile, Profile::Production);
        assert_eq!(inputs.api_key.as_deref(), Some("abc"));
        assert_eq!(inputs.max_count, Some(25));
        assert_eq!(inputs.caching_enabled, Some(false));
        assert_eq!(inputs.timeout_ms, None);

        let config = AggregatorConfig::resolve(inputs).unwrap();
        assert!(!config.cache.enabled);
    }

    #[test]
    fn rejects_unparseable_environment_values() {
        let result = ConfigInputs::from_lookup(|name| {
            (name == "BLOG_FETCH_TIMEOUT_MS").then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(ConfigurationError::InvalidNumber { .. })));

        let result =
            ConfigInputs::from_lookup(|name| (name == "BLOG_PROFILE").then(|| "staging".to_string()));
        assert!(matches!(result, Err(ConfigurationError::UnknownProfile(_))));
    }
}
