use crate::types::Post;
use chrono::{DateTime, Duration, Months, Utc};
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Posts older than this sort after recent ones.
pub const RECENT_WEEKS: i64 = 3;
/// Posts older than this are archived.
pub const ARCHIVE_MONTHS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AgeTier {
    Recent,
    Aging,
    Archived,
}

/// Tier of a post by its creation time.
pub fn age_tier(post: &Post, now: DateTime<Utc>) -> AgeTier {
    let archive_cutoff = now
        .checked_sub_months(Months::new(ARCHIVE_MONTHS))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let recent_cutoff = now - Duration::weeks(RECENT_WEEKS);

    if post.created_at < archive_cutoff {
        AgeTier::Archived
    } else if post.created_at <= recent_cutoff {
        AgeTier::Aging
    } else {
        AgeTier::Recent
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub added: usize,
    pub updated: usize,
    pub carried_over: usize,
    pub archived: usize,
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub posts: Vec<Post>,
    pub stats: MergeStats,
}

/// Merges a fresh batch into the previous collection.
///
/// The batch is expected in source-priority order; the first copy of an id
/// wins. Previously cached posts are never dropped.
pub fn merge_posts(previous: &[Post], fresh: Vec<Post>, now: DateTime<Utc>) -> MergeOutcome {
    let previous_by_id: HashMap<&str, &Post> =
        previous.iter().map(|post| (post.id.as_str(), post)).collect();
    let mut seen: HashSet<String> = HashSet::with_capacity(previous.len() + fresh.len());
    let mut merged = Vec::with_capacity(previous.len() + fresh.len());
    let mut stats = MergeStats::default();

    for mut post in fresh {
        if !seen.insert(post.id.clone()) {
            debug!("Dropping duplicate post {} ({})", post.title, post.link);
            continue;
        }

        match previous_by_id.get(post.id.as_str()) {
            Some(old) => {
                post.created_at = old.created_at;
                if post.published_at.is_none() {
                    post.published_at = old.published_at;
                }
                post.is_archived = old.is_archived;
                stats.updated += 1;
            }
            None => stats.added += 1,
        }
        merged.push(post);
    }

    for old in previous {
        if seen.insert(old.id.clone()) {
            merged.push(old.clone());
            stats.carried_over += 1;
        }
    }

    for post in merged.iter_mut() {
        if !post.is_archived && age_tier(post, now) == AgeTier::Archived {
            post.is_archived = true;
            stats.archived += 1;
        }
    }

    sort_posts(&mut merged, now);

    debug!(
        "Merged posts: {} added, {} updated, {} carried over, {} newly archived",
        stats.added, stats.updated, stats.carried_over, stats.archived
    );

    MergeOutcome {
        posts: merged,
        stats,
    }
}

/// Non-archived first, recent before aging, then newest first.
pub fn sort_posts(posts: &mut [Post], now: DateTime<Utc>) {
    posts.sort_by_key(|post| {
        let tier = if post.is_archived {
            AgeTier::Archived
        } else {
            age_tier(post, now).min(AgeTier::Aging)
        };
        (post.is_archived, tier, Reverse(post.sort_date()))
    });
}
