//! Continue watching
//!
//! Remembers the last episode played per scraper and search result, so
//! `--continue` can pick up where the user left off.

use crate::cache::{CacheError, CacheStorage};
use crate::media::{EpisodeSelector, Metadata};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What is remembered about a watched result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchedEntry {
    pub title: String,
    pub episode: EpisodeSelector,
}

/// Last watched episodes, persisted in the cache directory
pub struct WatchHistory {
    cache: CacheStorage<WatchedEntry>,
}

impl WatchHistory {
    /// Opens the history in the user's cache directory
    pub fn open() -> Result<Self, CacheError> {
        Ok(Self {
            cache: CacheStorage::open("history", None)?,
        })
    }

    /// Opens a history stored in `dir`
    pub fn open_in(dir: &Path) -> Result<Self, CacheError> {
        Ok(Self {
            cache: CacheStorage::open_in(dir, None)?,
        })
    }

    /// The episode last played for `metadata` with the given scraper
    pub fn last_episode(
        &self,
        scraper_id: &str,
        metadata: &Metadata,
    ) -> Result<Option<EpisodeSelector>, CacheError> {
        Ok(self
            .cache
            .load(&key(scraper_id, metadata))?
            .map(|entry| entry.episode))
    }

    /// Remembers `episode` as the last one played
    pub fn record(
        &self,
        scraper_id: &str,
        metadata: &Metadata,
        episode: EpisodeSelector,
    ) -> Result<(), CacheError> {
        let entry = WatchedEntry {
            title: metadata.title.clone(),
            episode,
        };

        self.cache.store(&key(scraper_id, metadata), &entry)
    }

    /// Forgets everything, returning how many entries were removed
    pub fn clear(&self) -> Result<usize, CacheError> {
        self.cache.clear()
    }
}

fn key(scraper_id: &str, metadata: &Metadata) -> String {
    format!("{}-{}", scraper_id, metadata.id)
}
