//! Scraper sessions
//!
//! A session is one constructed scraper together with what it was built from.
//! Sessions are never modified; falling back to another scraper builds a new
//! one from scratch.

use crate::config::Config;
use crate::http_client::HttpClient;
use crate::resolver::SelectedScraper;
use crate::scraper::{Scraper, ScraperContext, ScraperError};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// The scraper operation a fault happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultStage {
    Construct,
    Search,
    Scrape,
    EpisodeCount,
}

impl fmt::Display for FaultStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            FaultStage::Construct => "construction",
            FaultStage::Search => "search",
            FaultStage::Scrape => "scrape",
            FaultStage::EpisodeCount => "episode count lookup",
        };
        f.write_str(stage)
    }
}

/// An error raised from inside a plugin's scraper
///
/// These are bugs or outages of the plugin, not of playscout, and the message
/// says so.
#[derive(Debug, Error)]
#[error(
    "The scraper '{scraper_id}' failed during {stage}: {source}\n\
     This is an error inside the plugin, please report it to the plugin's \
     developers, not to playscout."
)]
pub struct PluginFault {
    pub scraper_id: String,
    pub stage: FaultStage,
    #[source]
    pub source: ScraperError,
}

impl PluginFault {
    pub fn new(scraper_id: impl Into<String>, stage: FaultStage, source: ScraperError) -> Self {
        Self {
            scraper_id: scraper_id.into(),
            stage,
            source,
        }
    }
}

/// A constructed scraper, ready to search and scrape
pub struct ScraperSession {
    pub selected: SelectedScraper,
    pub scraper: Box<dyn Scraper>,
    pub context: ScraperContext,
}

impl ScraperSession {
    /// Constructs the selected scraper
    ///
    /// # Arguments
    ///
    /// * `selected` - The resolved scraper, including its bound options
    /// * `config` - The configuration shared by all scrapers of this run
    /// * `http_client` - The HTTP client handed to the scraper
    ///
    /// # Returns
    ///
    /// The session, or a [`PluginFault`] if the plugin's constructor failed
    pub fn instantiate(
        selected: SelectedScraper,
        config: Arc<Config>,
        http_client: HttpClient,
    ) -> Result<Self, PluginFault> {
        info!("Using '{}' scraper...", selected.id);

        let context = ScraperContext {
            config,
            http_client,
            options: selected.options.clone(),
        };

        let scraper = (selected.factory)(&context)
            .map_err(|e| PluginFault::new(&selected.id, FaultStage::Construct, e))?;

        Ok(Self {
            selected,
            scraper,
            context,
        })
    }

    /// Canonical id of the scraper this session wraps
    pub fn id(&self) -> &str {
        &self.selected.id
    }

    /// Wraps a scraper error of this session into a [`PluginFault`]
    pub fn fault(&self, stage: FaultStage, source: ScraperError) -> PluginFault {
        PluginFault::new(self.id(), stage, source)
    }
}

impl fmt::Debug for ScraperSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScraperSession")
            .field("selected", &self.selected)
            .finish_non_exhaustive()
    }
}
