pub mod defaults;

pub use defaults::default_sources;

use crate::config::validate_sources;
use crate::types::{ConfigurationError, FeedSource};

/// Validated, immutable list of feed sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRegistry {
    sources: Vec<FeedSource>,
}

impl SourceRegistry {
    pub fn new(sources: Vec<FeedSource>) -> Result<Self, ConfigurationError> {
        validate_sources(&sources)?;
        Ok(Self { sources })
    }

    pub fn sources(&self) -> &[FeedSource] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Highest priority first; equal weights keep their configured order.
    pub fn by_priority(&self) -> Vec<&FeedSource> {
        let mut ordered: Vec<&FeedSource> = self.sources.iter().collect();
        ordered.sort_by(|a, b| b.priority_weight.cmp(&a.priority_weight));
        ordered
    }
}
