//! Season and episode selection

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of episodes per season, keyed by season number
pub type EpisodeCounts = BTreeMap<u32, u32>;

/// Errors from parsing an `{episode}:{season}` string
#[derive(Debug, Error, PartialEq)]
pub enum EpisodeParseError {
    #[error("Incorrect episode format '{0}'! Expected {{episode}}:{{season}}, e.g. 26:3")]
    InvalidFormat(String),

    #[error("Episode and season numbers start at 1, got '{0}'")]
    ZeroIndex(String),
}

/// Which episode of which season to scrape
///
/// Defaults to episode 1 of season 1. Only explicit user navigation
/// changes it after it has been chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeSelector {
    pub episode: u32,
    pub season: u32,
}

impl Default for EpisodeSelector {
    fn default() -> Self {
        Self {
            episode: 1,
            season: 1,
        }
    }
}

impl EpisodeSelector {
    pub fn new(episode: u32, season: u32) -> Self {
        Self { episode, season }
    }

    /// Moves to the next episode, crossing into the next season when the
    /// current one is finished.
    ///
    /// Returns false and leaves the selector untouched if there is no
    /// next episode.
    pub fn next(&mut self, counts: &EpisodeCounts) -> bool {
        let Some(&in_season) = counts.get(&self.season) else {
            return false;
        };

        if self.episode < in_season {
            self.episode += 1;
            return true;
        }

        match self.season.checked_add(1) {
            Some(season) if counts.contains_key(&season) => {
                self.season = season;
                self.episode = 1;
                true
            }
            _ => false,
        }
    }

    /// Moves to the previous episode, falling back to the last episode of
    /// the previous season when at the start of a season.
    ///
    /// Returns false and leaves the selector untouched if there is no
    /// previous episode.
    pub fn previous(&mut self, counts: &EpisodeCounts) -> bool {
        if self.episode > 1 {
            self.episode -= 1;
            return true;
        }

        if self.season <= 1 {
            return false;
        }

        match counts.get(&(self.season - 1)) {
            Some(&last) => {
                self.season -= 1;
                self.episode = last.max(1);
                true
            }
            None => false,
        }
    }
}

impl FromStr for EpisodeSelector {
    type Err = EpisodeParseError;

    /// Parses `26:3` (episode 26 of season 3) or a bare `26` (season 1)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EpisodeParseError::InvalidFormat(s.to_string());
        let mut parts = s.trim().split(':');

        let episode = parts
            .next()
            .and_then(|e| e.trim().parse::<u32>().ok())
            .ok_or_else(invalid)?;

        let season = match parts.next() {
            Some(season) => season.trim().parse::<u32>().map_err(|_| invalid())?,
            None => 1,
        };

        if parts.next().is_some() {
            return Err(invalid());
        }

        if episode == 0 || season == 0 {
            return Err(EpisodeParseError::ZeroIndex(s.to_string()));
        }

        Ok(Self { episode, season })
    }
}

impl fmt::Display for EpisodeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "episode {} of season {}", self.episode, self.season)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(table: &[(u32, u32)]) -> EpisodeCounts {
        table.iter().copied().collect()
    }

    #[test]
    fn test_parse_episode_and_season() {
        assert_eq!("26:3".parse(), Ok(EpisodeSelector::new(26, 3)));
        assert_eq!("7".parse(), Ok(EpisodeSelector::new(7, 1)));
        assert_eq!(" 2 : 4 ".parse(), Ok(EpisodeSelector::new(2, 4)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<EpisodeSelector>().is_err());
        assert!("a:b".parse::<EpisodeSelector>().is_err());
        assert!("1:2:3".parse::<EpisodeSelector>().is_err());
        assert_eq!(
            "0:1".parse::<EpisodeSelector>(),
            Err(EpisodeParseError::ZeroIndex("0:1".to_string()))
        );
    }

    #[test]
    fn test_next_within_and_across_seasons() {
        let table = counts(&[(1, 2), (2, 3)]);
        let mut selector = EpisodeSelector::default();

        assert!(selector.next(&table));
        assert_eq!(selector, EpisodeSelector::new(2, 1));

        assert!(selector.next(&table));
        assert_eq!(selector, EpisodeSelector::new(1, 2));

        selector = EpisodeSelector::new(3, 2);
        assert!(!selector.next(&table));
        assert_eq!(selector, EpisodeSelector::new(3, 2));
    }

    #[test]
    fn test_next_stops_at_the_highest_season_number() {
        let table = counts(&[(u32::MAX, 1)]);
        let mut selector = EpisodeSelector::new(1, u32::MAX);

        assert!(!selector.next(&table));
        assert_eq!(selector, EpisodeSelector::new(1, u32::MAX));
    }

    #[test]
    fn test_previous_within_and_across_seasons() {
        let table = counts(&[(1, 12), (2, 3)]);
        let mut selector = EpisodeSelector::new(2, 2);

        assert!(selector.previous(&table));
        assert_eq!(selector, EpisodeSelector::new(1, 2));

        assert!(selector.previous(&table));
        assert_eq!(selector, EpisodeSelector::new(12, 1));

        selector = EpisodeSelector::default();
        assert!(!selector.previous(&table));
        assert_eq!(selector, EpisodeSelector::default());
    }
}
