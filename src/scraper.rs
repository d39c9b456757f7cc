//! Scraper contract
//!
//! Plugins implement [`Scraper`] and hand out [`ScraperFactory`] values in
//! their hook. This module only defines the seam; concrete site scraping lives
//! in the plugins themselves.

use crate::config::Config;
use crate::http_client::HttpClient;
use crate::media::{EpisodeCounts, EpisodeSelector, Media, Metadata};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Error type scrapers return from any of their operations
pub type ScraperError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Lazily produced search results
pub type SearchResults<'a> = Box<dyn Iterator<Item = Metadata> + 'a>;

/// Value of a scraper option passed on the command line or in the config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Flag(bool),
    Number(i64),
    Text(String),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Flag(value) => write!(f, "{}", value),
            OptionValue::Number(value) => write!(f, "{}", value),
            OptionValue::Text(value) => f.write_str(value),
        }
    }
}

/// Options bound to a scraper instance
pub type ScraperOptions = BTreeMap<String, OptionValue>;

/// Everything a scraper gets handed when it is constructed
#[derive(Clone)]
pub struct ScraperContext {
    pub config: Arc<Config>,
    pub http_client: HttpClient,
    pub options: ScraperOptions,
}

/// Constructor capability for a scraper implementation
///
/// Factories are compared by pointer identity, so a plugin must hand out
/// one `Arc` per concrete scraper and reuse it for its default aliases.
pub type ScraperFactory =
    Arc<dyn Fn(&ScraperContext) -> Result<Box<dyn Scraper>, ScraperError> + Send + Sync>;

/// Convenience for building a factory from a closure
pub fn factory<F>(constructor: F) -> ScraperFactory
where
    F: Fn(&ScraperContext) -> Result<Box<dyn Scraper>, ScraperError> + Send + Sync + 'static,
{
    Arc::new(constructor)
}

/// Returns true if both factories are the same constructor
pub(crate) fn same_factory(a: &ScraperFactory, b: &ScraperFactory) -> bool {
    Arc::ptr_eq(a, b)
}

/// A scraper capable of searching a content source and resolving a
/// streamable url for a chosen result.
pub trait Scraper {
    /// Searches the source. The returned iterator may be lazy and unbounded,
    /// callers are expected to only pull as much as they need.
    fn search<'a>(
        &'a self,
        query: &str,
        limit: Option<usize>,
    ) -> Result<SearchResults<'a>, ScraperError>;

    /// Resolves the media for a search result.
    ///
    /// `Ok(None)` means the scraper simply doesn't have this title or episode.
    fn scrape(
        &self,
        metadata: &Metadata,
        episode: EpisodeSelector,
    ) -> Result<Option<Media>, ScraperError>;

    /// Returns how many episodes each season of a result has.
    fn scrape_episode_count(&self, _metadata: &Metadata) -> Result<EpisodeCounts, ScraperError> {
        Ok(EpisodeCounts::from([(1, 1)]))
    }
}
