use crate::classifier::Classifier;
use crate::types::{FeedSource, ParseError, Post, RawFeedItem};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::debug;
use uuid::Uuid;

/// Stable post id: UUIDv5 in the URL namespace over the trimmed link.
pub fn derive_post_id(link: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, link.trim().as_bytes()).to_string()
}

/// Parses the date formats seen in converted feeds. Naive timestamps are UTC.
pub fn parse_publication_date(raw: &str) -> Result<DateTime<Utc>, ParseError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ParseError::Date(String::new()));
    }

    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Ok(date.with_timezone(&Utc));
    }
    if let Ok(date) = DateTime::parse_from_rfc2822(raw) {
        return Ok(date.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(date.and_utc());
    }
    if let Some(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(date.and_utc());
    }

    Err(ParseError::Date(raw.to_string()))
}

/// Turns raw feed items into classified posts.
#[derive(Debug, Clone, Default)]
pub struct PostNormalizer {
    classifier: Classifier,
}

impl PostNormalizer {
    pub fn new(classifier: Classifier) -> Self {
        Self { classifier }
    }

    /// `now` becomes the creation time when the publication date is unusable.
    pub fn normalize(
        &self,
        item: RawFeedItem,
        source: &FeedSource,
        now: DateTime<Utc>,
    ) -> Result<Post, ParseError> {
        let link = item.link.trim();
        if link.is_empty() {
            return Err(ParseError::MissingLink);
        }

        let published_at = match parse_publication_date(&item.pub_date) {
            Ok(date) => Some(date),
            Err(err) => {
                debug!("Keeping {} without a date: {}", link, err);
                None
            }
        };

        let category = self
            .classifier
            .classify(&item.title, &item.description, source.category);

        Ok(Post {
            id: derive_post_id(link),
            link: link.to_string(),
            title: item.title,
            description: item.description,
            published_at,
            source_name: source.display_name.clone(),
            category,
            is_archived: false,
            created_at: published_at.unwrap_or(now),
        })
    }

    /// Normalizes a whole batch, skipping items that cannot be identified.
    pub fn normalize_batch(
        &self,
        items: Vec<RawFeedItem>,
        source: &FeedSource,
        now: DateTime<Utc>,
    ) -> Vec<Post> {
        let total = items.len();
        let posts: Vec<Post> = items
            .into_iter()
            .filter_map(|item| match self.normalize(item, source, now) {
                Ok(post) => Some(post),
                Err(err) => {
                    debug!("Skipping item from {}: {}", source.display_name, err);
                    None
                }
            })
            .collect();

        if posts.len() < total {
            debug!(
                "Normalized {}/{} items from {}",
                posts.len(),
                total,
                source.display_name
            );
        }
        posts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;
    use chrono::TimeZone;

    fn source() -> FeedSource {
        FeedSource::new("https://blog.example.com/feed", "Example Blog", Category::WebDevelopment)
    }

    fn item(link: &str, pub_date: &str) -> RawFeedItem {
        RawFeedItem {
            title: "  A title with spacing  ".to_string(),
            description: "<p>Full description that is not truncated at all, however long it may be.</p>".to_string(),
            link: link.to_string(),
            pub_date: pub_date.to_string(),
        }
    }

    #[test]
    fn id_is_stable_and_depends_only_on_link() {
        let normalizer = PostNormalizer::default();
        let now = Utc::now();

        let first = normalizer
            .normalize(item("https://blog.example.com/a", "2026-01-01 00:00:00"), &source(), now)
            .unwrap();
        let mut other = item("  https://blog.example.com/a ", "garbage");
        other.title = "Different title".to_string();
        let second = normalizer.normalize(other, &source(), now).unwrap();
        let third = normalizer
            .normalize(item("https://blog.example.com/b", "2026-01-01 00:00:00"), &source(), now)
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.id, derive_post_id("https://blog.example.com/a"));
        assert_ne!(first.id, third.id);
    }

    #[test]
    fn preserves_text_verbatim() {
        let raw = item("https://blog.example.com/a", "");
        let expected_title = raw.title.clone();
        let expected_description = raw.description.clone();

        let post = PostNormalizer::default()
            .normalize(raw, &source(), Utc::now())
            .unwrap();
        assert_eq!(post.title, expected_title);
        assert_eq!(post.description, expected_description);
        assert_eq!(post.source_name, "Example Blog");
        assert!(!post.is_archived);
    }

    #[test]
    fn parses_supported_date_formats() {
        let expected = Utc.with_ymd_and_hms(2026, 2, 24, 10, 0, 0).unwrap();
        assert_eq!(parse_publication_date("2026-02-24 10:00:00").unwrap(), expected);
        assert_eq!(parse_publication_date("2026-02-24T10:00:00Z").unwrap(), expected);
        assert_eq!(parse_publication_date("2026-02-24T12:00:00+02:00").unwrap(), expected);
        assert_eq!(
            parse_publication_date("Tue, 24 Feb 2026 10:00:00 GMT").unwrap(),
            expected
        );
        assert_eq!(
            parse_publication_date("2026-02-24").unwrap(),
            Utc.with_ymd_and_hms(2026, 2, 24, 0, 0, 0).unwrap()
        );
        assert!(matches!(parse_publication_date("last tuesday"), Err(ParseError::Date(_))));
    }

    #[test]
    fn bad_date_is_flagged_not_fatal() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let post = PostNormalizer::default()
            .normalize(item("https://blog.example.com/a", "not a date"), &source(), now)
            .unwrap();

        assert_eq!(post.published_at, None);
        assert_eq!(post.created_at, now);
        assert_eq!(post.date_label(), "Unknown date");
    }

    #[test]
    fn dated_post_is_created_at_its_publication_date() {
        let post = PostNormalizer::default()
            .normalize(item("https://blog.example.com/a", "2026-02-24 10:00:00"), &source(), Utc::now())
            .unwrap();
        let expected = Utc.with_ymd_and_hms(2026, 2, 24, 10, 0, 0).unwrap();
        assert_eq!(post.published_at, Some(expected));
        assert_eq!(post.created_at, expected);
        assert_eq!(post.date_label(), "February 24, 2026");
    }

    #[test]
    fn batch_skips_items_without_links() {
        let posts = PostNormalizer::default().normalize_batch(
            vec![item("https://blog.example.com/a", ""), item("   ", "")],
            &source(),
            Utc::now(),
        );
        assert_eq!(posts.len(), 1);
    }
}
