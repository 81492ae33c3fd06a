use anyhow::Context;
use blog_aggregator::{
    AggregatorConfig, BlogAggregator, Category, ConfigInputs, Fetcher, PostFilter, Profile,
    SqliteStore,
};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "blog-aggregator", about = "Fetch, categorize and cache the blog feed")]
struct Cli {
    /// development, production or test; overrides BLOG_PROFILE
    #[arg(long)]
    profile: Option<Profile>,

    /// Ignore a fresh cache and fetch every source
    #[arg(long)]
    force_refresh: bool,

    #[arg(long, default_value = "sqlite://blog-cache.db")]
    database_url: String,

    /// Only show posts in this category
    #[arg(long)]
    category: Option<Category>,

    #[arg(long)]
    include_archived: bool,

    /// Print post counts per category instead of posts
    #[arg(long)]
    categories: bool,

    #[arg(long)]
    json: bool,

    /// Drop cached posts before aggregating
    #[arg(long)]
    clear_cache: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let mut inputs = ConfigInputs::from_env()?;
    if let Some(profile) = cli.profile {
        inputs.profile = profile;
    }
    let config = Arc::new(AggregatorConfig::resolve(inputs)?);
    info!(
        "Starting blog aggregator ({} profile, {} sources)",
        config.profile,
        config.sources.len()
    );

    let store = Arc::new(
        SqliteStore::connect(&cli.database_url)
            .await
            .with_context(|| format!("failed to open cache database {}", cli.database_url))?,
    );
    let fetcher = Arc::new(Fetcher::new(config.fetch.clone())?);
    let aggregator = BlogAggregator::new(config.clone(), fetcher, store.clone());

    if cli.clear_cache {
        aggregator.cache().clear().await?;
        info!("Cleared cached posts");
    }

    let response = aggregator.get_posts(cli.force_refresh).await?;
    if response.is_stale {
        warn!(
            "Every source failed; showing posts cached at {:?}",
            response.fetched_at
        );
    } else if !response.failed_sources.is_empty() {
        warn!("Sources skipped this run: {}", response.failed_sources.join(", "));
    }

    if cli.categories {
        let counts = aggregator.get_categories().await;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&counts)?);
        } else {
            for entry in counts {
                println!("{:<24} {}", entry.category.label(), entry.count);
            }
        }
    } else {
        let filter = PostFilter {
            category: cli.category,
            include_archived: cli.include_archived,
        };
        let posts = filter.apply(&response.posts);
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&posts)?);
        } else {
            for post in posts {
                let marker = if post.is_archived { " (archived)" } else { "" };
                println!("{} [{}] {}{}", post.date_label(), post.category, post.title, marker);
                println!("    {} via {}", post.link, post.source_name);
            }
        }
    }

    store.close().await;
    Ok(())
}
