//! Search, episode selection and scraping
//!
//! Each step runs against one [`ScraperSession`]. Errors from inside the
//! scraper come back as [`PluginFault`]s; "found nothing" is a normal value so
//! the caller can tell the two apart.

use crate::media::{EpisodeCounts, EpisodeSelector, Media, Metadata, MetadataType};
use crate::session::{FaultStage, PluginFault, ScraperSession};
use crate::ui::Chooser;
use tracing::{debug, info};

/// Result of the search step
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Selected(Metadata),
    /// The scraper found nothing, or the requested choice doesn't exist
    NoResults,
    /// The user dismissed the prompt
    Cancelled,
}

/// Searches with the session's scraper and picks one result
///
/// A single result is picked without asking. To find out whether there is
/// more than one, at most two results are pulled from the scraper before
/// deciding; the full list is only collected when the user has to choose.
///
/// # Arguments
///
/// * `query` - The search query
/// * `session` - The scraper to search with
/// * `limit` - Maximum number of results the scraper should return
/// * `auto_select` - Pick the n-th result (1-based) instead of prompting
/// * `chooser` - Asks the user to pick a result
pub fn search<C: Chooser + ?Sized>(
    query: &str,
    session: &ScraperSession,
    limit: Option<usize>,
    auto_select: Option<usize>,
    chooser: &C,
) -> Result<SearchOutcome, PluginFault> {
    info!("Searching for '{}'...", query);

    let mut results = session
        .scraper
        .search(query, limit)
        .map_err(|e| session.fault(FaultStage::Search, e))?;

    if let Some(choice) = auto_select {
        debug!("Auto selecting result {}", choice);
        let selected = choice.checked_sub(1).and_then(|index| results.nth(index));

        return Ok(match selected {
            Some(metadata) => SearchOutcome::Selected(metadata),
            None => SearchOutcome::NoResults,
        });
    }

    let Some(first) = results.next() else {
        return Ok(SearchOutcome::NoResults);
    };

    let Some(second) = results.next() else {
        debug!("Only one result, selecting '{}'", first.title);
        return Ok(SearchOutcome::Selected(first));
    };

    let candidates: Vec<Metadata> = [first, second].into_iter().chain(results).collect();
    let labels: Vec<String> = candidates.iter().map(Metadata::display_name).collect();

    match chooser.choose("Choose Result", &labels) {
        Some(index) => Ok(candidates
            .into_iter()
            .nth(index)
            .map_or(SearchOutcome::Cancelled, SearchOutcome::Selected)),
        None => Ok(SearchOutcome::Cancelled),
    }
}

/// Works out which episode to scrape
///
/// Returns `Ok(None)` if the user dismissed a prompt.
///
/// # Arguments
///
/// * `requested` - Episode given on the command line or from continue-watching
/// * `session` - The scraper to ask for episode counts
/// * `metadata` - The selected search result
/// * `chooser` - Asks the user to pick a season and an episode
pub fn select_episode<C: Chooser + ?Sized>(
    requested: Option<EpisodeSelector>,
    session: &ScraperSession,
    metadata: &Metadata,
    chooser: &C,
) -> Result<Option<EpisodeSelector>, PluginFault> {
    if metadata.kind == MetadataType::Single {
        return Ok(Some(EpisodeSelector::default()));
    }

    if let Some(episode) = requested {
        return Ok(Some(episode));
    }

    info!("Scraping episodes for '{}'...", metadata.title);
    let counts = episode_counts(session, metadata)?;

    Ok(prompt_episode(&counts, chooser))
}

/// Fetches the season table of a multi-episode result
pub fn episode_counts(
    session: &ScraperSession,
    metadata: &Metadata,
) -> Result<EpisodeCounts, PluginFault> {
    session
        .scraper
        .scrape_episode_count(metadata)
        .map_err(|e| session.fault(FaultStage::EpisodeCount, e))
}

/// Prompts for a season, then for an episode of it
///
/// A table with a single season holding a single episode needs no prompt.
pub fn prompt_episode<C: Chooser + ?Sized>(
    counts: &EpisodeCounts,
    chooser: &C,
) -> Option<EpisodeSelector> {
    let seasons: Vec<(u32, u32)> = counts
        .iter()
        .filter(|(_, episodes)| **episodes > 0)
        .map(|(season, episodes)| (*season, *episodes))
        .collect();

    match seasons.as_slice() {
        [] => return Some(EpisodeSelector::default()),
        [(season, 1)] => return Some(EpisodeSelector::new(1, *season)),
        _ => {}
    }

    let season_labels: Vec<String> = seasons
        .iter()
        .map(|(season, _)| format!("Season {}", season))
        .collect();
    let (season, episodes) = *seasons.get(chooser.choose("Select Season", &season_labels)?)?;

    let episode_labels: Vec<String> = (1..=episodes)
        .map(|episode| format!("Episode {}", episode))
        .collect();
    let episode = chooser.choose("Select Episode", &episode_labels)?;

    u32::try_from(episode + 1)
        .ok()
        .filter(|episode| *episode <= episodes)
        .map(|episode| EpisodeSelector::new(episode, season))
}

/// Resolves the stream of the selected result
///
/// `Ok(None)` means the scraper doesn't have this title or episode.
pub fn scrape(
    metadata: &Metadata,
    episode: EpisodeSelector,
    session: &ScraperSession,
) -> Result<Option<Media>, PluginFault> {
    info!("Scraping '{}'...", metadata.title);

    session
        .scraper
        .scrape(metadata, episode)
        .map_err(|e| session.fault(FaultStage::Scrape, e))
}
