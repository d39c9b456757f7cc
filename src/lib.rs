//! playscout - Look up media through scraper plugins and hand it to a player
//!
//! This library resolves scraper identifiers against the installed plugins,
//! drives search, episode selection and scraping, and falls back to the next
//! scraper of a plugin when one comes back empty or fails.

mod cache;
pub mod config;
pub mod download;
pub mod fallback;
pub mod history;
pub mod http_client;
pub mod logging;
pub mod media;
pub mod pipeline;
pub mod platform;
pub mod players;
pub mod plugins;
pub mod resolver;
pub mod scraper;
pub mod scraper_args;
pub mod session;
pub mod ui;

use std::io;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

// Re-export error types
pub use cache::CacheError;
pub use config::ConfigError;
pub use download::DownloadError;
pub use http_client::HttpError;
pub use players::PlayerError;
pub use plugins::PluginLoadError;
pub use session::PluginFault;
pub use ui::ChooserError;

pub use config::Config;
pub use fallback::{ContentRequest, FallbackReason, GrabbedContent, NoResultsReason, Outcome};
pub use http_client::HttpClient;
pub use platform::Platform;
pub use plugins::PluginRegistry;
pub use resolver::ResolutionMiss;

use history::WatchHistory;
use resolver::{Resolution, SelectedScraper};
use ui::Chooser;

/// Progress event emitted while grabbing content
///
/// These events allow library users to show which scraper is in use and why
/// the next one is being tried.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A scraper was resolved and is about to be used
    ScraperSelected {
        scraper_id: String,
        /// Number of scraper options bound from config and command line
        option_count: usize,
    },

    /// The current scraper failed and the next one of its plugin is tried
    TryingNextScraper {
        scraper_id: String,
        reason: FallbackReason,
        /// Scrapers still left after this one
        remaining: usize,
    },
}

/// Top-level error type for playscout operations
#[derive(Debug, Error)]
pub enum PlayscoutError {
    /// Error while reading the configuration
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Error during cache operations
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Error while setting up the HTTP client
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    /// A scraper raised an error
    #[error(transparent)]
    Plugin(#[from] PluginFault),

    /// Error while launching the player
    #[error(transparent)]
    Player(#[from] PlayerError),

    /// Error while starting a download
    #[error("Download error: {0}")]
    Download(#[from] DownloadError),

    /// No plugin could be loaded at all
    #[error("No plugins are installed. Add one to the [playscout.plugins] table of your config.")]
    NoPlugins,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result of [`grab_content`]
#[derive(Debug)]
pub enum Lookup {
    /// The fallback run ended, with content or without
    Finished(Outcome),
    /// The scraper identifier matched nothing
    UnknownScraper(ResolutionMiss),
}

/// Everything a lookup needs apart from the request itself
pub struct LookupContext<'a> {
    pub plugins: &'a PluginRegistry,
    pub config: Arc<Config>,
    pub http_client: HttpClient,
    /// Watch history used by `--continue`
    pub history: Option<&'a WatchHistory>,
    pub platform: Platform,
}

/// Looks up and scrapes content for a query
///
/// The scraper is taken from the config's `default` entry (which `--scraper`
/// overrides); without one the user picks a plugin and scraper interactively.
/// Arguments the chosen plugin declares are removed from `query_words` and
/// bound as scraper options; the remaining words become the search query.
///
/// # Arguments
///
/// * `query_words` - The query as passed on the command line
/// * `request` - Choice, episode and continue flag; its `query` is replaced
/// * `context` - Plugins, config, HTTP client and watch history
/// * `chooser` - Asks the user to pick scrapers, results and episodes
/// * `progress_callback` - Closure called with progress events (can be empty for silent operation)
///
/// # Returns
///
/// [`Lookup::UnknownScraper`] when the configured scraper doesn't exist,
/// otherwise the outcome of the fallback run
///
/// # Examples
///
/// ```no_run
/// use playscout::plugins::StaticPluginLoader;
/// use playscout::ui::DialoguerChooser;
/// use playscout::{
///     Config, ContentRequest, HttpClient, Lookup, LookupContext, Outcome, Platform,
///     PluginRegistry, grab_content,
/// };
/// use std::sync::Arc;
///
/// let config = Arc::new(Config::default());
/// let plugins = PluginRegistry::load_all(&StaticPluginLoader::with_builtins(), &config.plugins);
/// let context = LookupContext {
///     plugins: &plugins,
///     http_client: HttpClient::new(&config.http, config.hide_ip).unwrap(),
///     config,
///     history: None,
///     platform: Platform::current(),
/// };
///
/// let lookup = grab_content(
///     vec!["sintel".to_string()],
///     ContentRequest::default(),
///     &context,
///     &DialoguerChooser::new(None),
///     |event| println!("{:?}", event),
/// )
/// .unwrap();
///
/// if let Lookup::Finished(Outcome::Found(content)) = lookup {
///     println!("Streaming {}", content.media.url);
/// }
/// ```
pub fn grab_content<C, F>(
    mut query_words: Vec<String>,
    mut request: ContentRequest,
    context: &LookupContext<'_>,
    chooser: &C,
    mut progress_callback: F,
) -> Result<Lookup, PlayscoutError>
where
    C: Chooser + ?Sized,
    F: FnMut(ProgressEvent),
{
    if context.plugins.is_empty() {
        return Err(PlayscoutError::NoPlugins);
    }

    let selected = match context.config.default_scraper() {
        Some(identifier) => match resolver::resolve(
            identifier,
            context.plugins,
            &context.config.scraper_overrides(),
            context.platform,
        ) {
            Resolution::Found(selected) => selected,
            Resolution::Miss(miss) => return Ok(Lookup::UnknownScraper(miss)),
        },
        None => {
            debug!("No default scraper configured, asking the user...");
            match resolver::select_interactively(context.plugins, context.platform, chooser) {
                Some(selected) => selected,
                None => return Ok(Lookup::Finished(Outcome::Cancelled)),
            }
        }
    };

    let selected = bind_scraper_args(selected, &mut query_words, context.plugins);
    request.query = query_words.join(" ");

    if request.query.trim().is_empty() {
        warn!("The search query is empty, every result of the scraper will be listed.");
    }

    progress_callback(ProgressEvent::ScraperSelected {
        scraper_id: selected.id.clone(),
        option_count: selected.options.len(),
    });

    let mut controller = fallback::FallbackController::new(
        context.plugins,
        context.config.clone(),
        context.http_client.clone(),
    );
    if let Some(history) = context.history {
        controller = controller.with_history(history);
    }

    let outcome = controller.run(selected, &request, chooser, progress_callback)?;
    Ok(Lookup::Finished(outcome))
}

/// Moves the plugin's declared arguments out of the query and into the
/// scraper options. Command line values win over config options.
fn bind_scraper_args(
    mut selected: SelectedScraper,
    query_words: &mut Vec<String>,
    plugins: &PluginRegistry,
) -> SelectedScraper {
    let Some(plugin) = plugins.get(&selected.namespace) else {
        return selected;
    };

    let stolen = scraper_args::steal_scraper_args(query_words, &plugin.args);
    selected.options.extend(stolen);
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScraperEntry;
    use crate::plugins::StaticPluginLoader;
    use crate::scraper::OptionValue;
    use crate::ui::tests::ScriptedChooser;

    fn words(query: &str) -> Vec<String> {
        query.split_whitespace().map(str::to_string).collect()
    }

    fn lookup(config: Config, query: &str, chooser: &ScriptedChooser) -> (Lookup, Vec<ProgressEvent>) {
        let config = Arc::new(config);
        let plugins = PluginRegistry::load_all(&StaticPluginLoader::with_builtins(), &config.plugins);
        let context = LookupContext {
            plugins: &plugins,
            http_client: HttpClient::new(&config.http, true).unwrap(),
            config,
            history: None,
            platform: Platform::Linux,
        };

        let mut events = Vec::new();
        let lookup = grab_content(
            words(query),
            ContentRequest::default(),
            &context,
            chooser,
            |event| events.push(event),
        )
        .unwrap();

        (lookup, events)
    }

    fn config_with_default(scraper: &str) -> Config {
        let mut config = Config::default();
        config.scrapers = vec![(
            "default".to_string(),
            ScraperEntry::Target(scraper.to_string()),
        )];
        config
    }

    #[test]
    fn test_grab_content_with_configured_scraper() {
        let chooser = ScriptedChooser::new(Vec::new());
        let (lookup, events) = lookup(config_with_default("test"), "sintel", &chooser);

        let Lookup::Finished(Outcome::Found(content)) = lookup else {
            panic!("expected content, got {:?}", lookup);
        };
        assert_eq!(content.scraper_id, "test.DEFAULT");
        assert_eq!(content.media.title, "Sintel");
        assert!(chooser.prompts().is_empty());

        assert!(matches!(
            events.as_slice(),
            [ProgressEvent::ScraperSelected { scraper_id, option_count: 0 }] if scraper_id == "test.DEFAULT"
        ));
    }

    #[test]
    fn test_grab_content_steals_plugin_args() {
        let chooser = ScriptedChooser::new(Vec::new());
        let (lookup, events) = lookup(config_with_default("test"), "bunny --year 2008", &chooser);

        let Lookup::Finished(Outcome::Found(content)) = lookup else {
            panic!("expected content, got {:?}", lookup);
        };
        assert_eq!(content.media.title, "Big Buck Bunny");
        assert_eq!(
            content.session.context.options.get("year"),
            Some(&OptionValue::Number(2008))
        );
        assert!(matches!(
            events.as_slice(),
            [ProgressEvent::ScraperSelected { option_count: 1, .. }]
        ));
    }

    #[test]
    fn test_grab_content_unknown_scraper() {
        let chooser = ScriptedChooser::new(Vec::new());
        let (lookup, events) = lookup(config_with_default("test.open_movie"), "sintel", &chooser);

        let Lookup::UnknownScraper(miss) = lookup else {
            panic!("expected a miss, got {:?}", lookup);
        };
        assert_eq!(miss.suggestion(), Some("test.open_movies"));
        assert!(events.is_empty());
    }

    #[test]
    fn test_grab_content_interactive_selection() {
        // Plugin "test", then its only concrete scraper
        let chooser = ScriptedChooser::new(vec![Some(0), Some(0)]);
        let (lookup, _) = lookup(Config::default(), "tears", &chooser);

        assert!(matches!(lookup, Lookup::Finished(Outcome::Found(_))));
        let prompts: Vec<String> = chooser.prompts().into_iter().map(|(prompt, _)| prompt).collect();
        assert_eq!(prompts, vec!["Select a plugin", "Select a scraper"]);
    }

    #[test]
    fn test_grab_content_interactive_selection_cancelled() {
        let chooser = ScriptedChooser::new(vec![None]);
        let (lookup, _) = lookup(Config::default(), "tears", &chooser);

        assert!(matches!(lookup, Lookup::Finished(Outcome::Cancelled)));
    }

    #[test]
    fn test_grab_content_without_plugins() {
        let config = Arc::new(Config::default());
        let plugins = PluginRegistry::default();
        let context = LookupContext {
            plugins: &plugins,
            http_client: HttpClient::new(&config.http, true).unwrap(),
            config,
            history: None,
            platform: Platform::Linux,
        };

        let result = grab_content(
            words("sintel"),
            ContentRequest::default(),
            &context,
            &ScriptedChooser::new(Vec::new()),
            |_| {},
        );

        assert!(matches!(result, Err(PlayscoutError::NoPlugins)));
    }
}
