use crate::types::{Category, FeedSource};

/// Engineering publications shown on the blog page when no sources are configured.
pub fn default_sources() -> Vec<FeedSource> {
    vec![
        FeedSource::new(
            "https://netflixtechblog.com/feed",
            "Netflix Tech Blog",
            Category::SoftwareEngineering,
        )
        .with_priority(8),
        FeedSource::new(
            "https://blog.google/technology/ai/rss/",
            "Google AI Blog",
            Category::AiMl,
        )
        .with_priority(9),
        FeedSource::new(
            "https://aws.amazon.com/blogs/aws/feed/",
            "AWS News Blog",
            Category::CloudDevops,
        )
        .with_priority(7),
        FeedSource::new(
            "https://krebsonsecurity.com/feed/",
            "Krebs on Security",
            Category::Security,
        )
        .with_priority(6),
        FeedSource::new(
            "https://css-tricks.com/feed/",
            "CSS-Tricks",
            Category::WebDevelopment,
        )
        .with_priority(5),
        FeedSource::new(
            "https://www.databricks.com/feed",
            "Databricks Blog",
            Category::DataEngineering,
        )
        .with_priority(5),
    ]
}
