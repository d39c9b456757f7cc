//! Auto try next scraper
//!
//! When a scraper finds nothing or fails, the controller moves on to the next
//! scraper declared by the same plugin and retries from the step that failed.
//! The chain only ever moves forward through the plugin's catalog, so it ends
//! after at most as many attempts as the plugin has scrapers.

use crate::ProgressEvent;
use crate::config::Config;
use crate::history::WatchHistory;
use crate::http_client::HttpClient;
use crate::media::{EpisodeSelector, Media, Metadata, MetadataType};
use crate::pipeline::{self, SearchOutcome};
use crate::plugins::PluginRegistry;
use crate::resolver::SelectedScraper;
use crate::session::{FaultStage, PluginFault, ScraperSession};
use crate::ui::Chooser;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What the user asked for
#[derive(Debug, Clone, Default)]
pub struct ContentRequest {
    pub query: String,
    /// Pick the n-th search result (1-based) instead of prompting
    pub auto_select: Option<usize>,
    /// Episode to scrape instead of prompting
    pub episode: Option<EpisodeSelector>,
    /// Resume at the last watched episode when there is one
    pub continue_watching: bool,
}

/// Why the controller gave up on a scraper
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// The search returned nothing
    NoSearchResults,
    /// The scraper doesn't have the selected title or episode
    MediaNotFound,
    /// The scraper raised an error
    Fault(FaultStage),
}

impl FallbackReason {
    /// Faults are hard failures, empty results are soft ones
    pub fn is_hard(&self) -> bool {
        matches!(self, FallbackReason::Fault(_))
    }
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::NoSearchResults => f.write_str("Query not found"),
            FallbackReason::MediaNotFound => f.write_str("Media not found"),
            FallbackReason::Fault(FaultStage::Construct) => {
                f.write_str("Error occurred while starting the scraper")
            }
            FallbackReason::Fault(FaultStage::Search) => {
                f.write_str("Error occurred while searching")
            }
            FallbackReason::Fault(FaultStage::Scrape) => f.write_str("Error occurred while scraping"),
            FallbackReason::Fault(FaultStage::EpisodeCount) => {
                f.write_str("Error occurred while fetching episodes")
            }
        }
    }
}

/// Why a run ended without content
#[derive(Debug, Clone, PartialEq)]
pub enum NoResultsReason {
    /// The search found nothing or the requested choice doesn't exist
    NothingFound { scraper_id: String },
    /// The scraper doesn't have the selected title or episode
    MediaNotFound {
        scraper_id: String,
        title: String,
        episode: Option<EpisodeSelector>,
    },
    /// Every scraper of the plugin was tried
    Exhausted { last_scraper: String },
}

impl fmt::Display for NoResultsReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoResultsReason::NothingFound { scraper_id } => {
                write!(f, "There were no results with '{}'.", scraper_id)
            }
            NoResultsReason::MediaNotFound {
                scraper_id,
                title,
                episode,
            } => {
                write!(f, "The scraper '{}' couldn't find ", scraper_id)?;
                if let Some(episode) = episode {
                    write!(f, "ep {} season {} of ", episode.episode, episode.season)?;
                }
                write!(
                    f,
                    "'{}'! Don't report this to playscout, report this to the plugin itself.",
                    title
                )
            }
            NoResultsReason::Exhausted { last_scraper } => write!(
                f,
                "No more scrapers to try after '{}', there were no results.",
                last_scraper
            ),
        }
    }
}

/// A successful run
#[derive(Debug)]
pub struct GrabbedContent {
    pub media: Media,
    pub metadata: Metadata,
    pub episode: EpisodeSelector,
    pub scraper_id: String,
    /// The session that produced the media, for scraping further episodes
    pub session: ScraperSession,
}

/// How a run ended
#[derive(Debug)]
pub enum Outcome {
    Found(GrabbedContent),
    NoResults(NoResultsReason),
    /// The user dismissed a prompt
    Cancelled,
}

/// The scrapers left to try, in catalog order
pub struct FallbackChain {
    pending: VecDeque<SelectedScraper>,
}

impl FallbackChain {
    /// Builds the chain of concrete scrapers declared after `current` in its
    /// own plugin, all bound to `current`'s options
    ///
    /// A default alias counts as the scraper it points at.
    pub fn new(current: &SelectedScraper, plugins: &PluginRegistry) -> Self {
        let pending = match plugins.get(&current.namespace) {
            Some(plugin) => plugin
                .catalog
                .next_after(&current.key)
                .into_iter()
                .map(|entry| SelectedScraper {
                    id: plugin.scraper_id(&entry.key),
                    namespace: plugin.namespace.clone(),
                    key: entry.key.clone(),
                    factory: entry.factory.clone(),
                    options: current.options.clone(),
                })
                .collect(),
            None => VecDeque::new(),
        };

        Self { pending }
    }

    /// Moves on to the next scraper, `None` once the plugin is exhausted
    pub fn advance(&mut self) -> Option<SelectedScraper> {
        self.pending.pop_front()
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

enum State {
    Trying(SelectedScraper),
    Exhausted { last_scraper: String },
    Succeeded(GrabbedContent),
}

enum Attempt {
    Succeeded(GrabbedContent),
    Empty(FallbackReason),
    Cancelled,
}

/// Runs search, episode selection and scrape, falling back to the next
/// scraper of the plugin on failure
pub struct FallbackController<'p> {
    plugins: &'p PluginRegistry,
    config: Arc<Config>,
    http_client: HttpClient,
    history: Option<&'p WatchHistory>,
}

impl<'p> FallbackController<'p> {
    pub fn new(plugins: &'p PluginRegistry, config: Arc<Config>, http_client: HttpClient) -> Self {
        Self {
            plugins,
            config,
            http_client,
            history: None,
        }
    }

    /// Looks up resume points for `continue_watching` requests in `history`
    pub fn with_history(mut self, history: &'p WatchHistory) -> Self {
        self.history = Some(history);
        self
    }

    /// Grabs content for `request`, starting with `selected`
    ///
    /// With `auto_try_next_scraper` disabled the first failure ends the run:
    /// plugin faults are returned as errors, empty results as
    /// [`Outcome::NoResults`]. A dismissed prompt always ends the run.
    ///
    /// # Arguments
    ///
    /// * `selected` - The scraper to start with
    /// * `request` - Query, choice and episode
    /// * `chooser` - Asks the user to pick results and episodes
    /// * `progress_callback` - Called with a [`ProgressEvent`] on every fallback
    pub fn run<C, F>(
        &self,
        selected: SelectedScraper,
        request: &ContentRequest,
        chooser: &C,
        mut progress_callback: F,
    ) -> Result<Outcome, PluginFault>
    where
        C: Chooser + ?Sized,
        F: FnMut(ProgressEvent),
    {
        let enabled = self.config.auto_try_next_scraper;
        let mut chain = FallbackChain::new(&selected, self.plugins);
        let mut found: Option<(Metadata, EpisodeSelector)> = None;
        let mut state = State::Trying(selected);

        loop {
            state = match state {
                State::Succeeded(content) => return Ok(Outcome::Found(content)),
                State::Exhausted { last_scraper } => {
                    info!("[ATNS] No more scrapers left to try.");
                    return Ok(Outcome::NoResults(NoResultsReason::Exhausted {
                        last_scraper,
                    }));
                }
                State::Trying(selected) => {
                    let scraper_id = selected.id.clone();

                    match self.attempt(selected, request, &mut found, chooser) {
                        Ok(Attempt::Succeeded(content)) => State::Succeeded(content),
                        Ok(Attempt::Cancelled) => return Ok(Outcome::Cancelled),
                        Ok(Attempt::Empty(reason)) if !enabled => {
                            return Ok(Outcome::NoResults(no_results(reason, scraper_id, &found)));
                        }
                        Err(fault) if !enabled => return Err(fault),
                        Ok(Attempt::Empty(reason)) => {
                            info!(
                                "[ATNS] {} with '{}'! Trying the next scraper...",
                                reason, scraper_id
                            );
                            fall_back(&mut chain, scraper_id, reason, &mut progress_callback)
                        }
                        Err(fault) => {
                            debug!("{}", fault);
                            let reason = FallbackReason::Fault(fault.stage);
                            info!(
                                "[ATNS] {} with '{}'! Trying the next scraper...",
                                reason, scraper_id
                            );
                            fall_back(&mut chain, scraper_id, reason, &mut progress_callback)
                        }
                    }
                }
            };
        }
    }

    /// One pass of the pipeline with a fresh session
    ///
    /// Search and episode selection are skipped when `found` already holds
    /// their result from an earlier scraper.
    fn attempt<C: Chooser + ?Sized>(
        &self,
        selected: SelectedScraper,
        request: &ContentRequest,
        found: &mut Option<(Metadata, EpisodeSelector)>,
        chooser: &C,
    ) -> Result<Attempt, PluginFault> {
        let session =
            ScraperSession::instantiate(selected, self.config.clone(), self.http_client.clone())?;

        if found.is_none() {
            let metadata = match pipeline::search(
                &request.query,
                &session,
                self.config.ui.limit,
                request.auto_select,
                chooser,
            )? {
                SearchOutcome::Selected(metadata) => metadata,
                SearchOutcome::NoResults => {
                    return Ok(Attempt::Empty(FallbackReason::NoSearchResults));
                }
                SearchOutcome::Cancelled => return Ok(Attempt::Cancelled),
            };

            let requested = request
                .episode
                .or_else(|| self.resume_point(request, session.id(), &metadata));

            let Some(episode) = pipeline::select_episode(requested, &session, &metadata, chooser)?
            else {
                return Ok(Attempt::Cancelled);
            };

            *found = Some((metadata, episode));
        }

        let Some((metadata, episode)) = found.as_ref() else {
            return Ok(Attempt::Empty(FallbackReason::NoSearchResults));
        };

        match pipeline::scrape(metadata, *episode, &session)? {
            Some(media) => Ok(Attempt::Succeeded(GrabbedContent {
                media,
                metadata: metadata.clone(),
                episode: *episode,
                scraper_id: session.id().to_string(),
                session,
            })),
            None => Ok(Attempt::Empty(FallbackReason::MediaNotFound)),
        }
    }
}

impl FallbackController<'_> {
    fn resume_point(
        &self,
        request: &ContentRequest,
        scraper_id: &str,
        metadata: &Metadata,
    ) -> Option<EpisodeSelector> {
        if !request.continue_watching {
            return None;
        }

        match self.history?.last_episode(scraper_id, metadata) {
            Ok(episode) => {
                if let Some(episode) = episode {
                    info!("Continuing '{}' at {}", metadata.title, episode);
                }
                episode
            }
            Err(e) => {
                warn!("Failed to read the watch history: {}", e);
                None
            }
        }
    }
}

/// Reports the failed scraper and moves the chain forward
fn fall_back<F: FnMut(ProgressEvent)>(
    chain: &mut FallbackChain,
    scraper_id: String,
    reason: FallbackReason,
    progress_callback: &mut F,
) -> State {
    progress_callback(ProgressEvent::TryingNextScraper {
        scraper_id: scraper_id.clone(),
        reason,
        remaining: chain.remaining(),
    });

    match chain.advance() {
        Some(next) => State::Trying(next),
        None => State::Exhausted {
            last_scraper: scraper_id,
        },
    }
}

fn no_results(
    reason: FallbackReason,
    scraper_id: String,
    found: &Option<(Metadata, EpisodeSelector)>,
) -> NoResultsReason {
    match (reason, found) {
        (FallbackReason::MediaNotFound, Some((metadata, episode))) => {
            NoResultsReason::MediaNotFound {
                scraper_id,
                title: metadata.title.clone(),
                episode: (metadata.kind == MetadataType::Multi).then_some(*episode),
            }
        }
        _ => NoResultsReason::NothingFound { scraper_id },
    }
}
