use clap::Parser;
use playscout::config::{self, ConfigOverrides};
use playscout::download::Downloader;
use playscout::history::WatchHistory;
use playscout::http_client::hide_ip;
use playscout::logging::{LogHandle, init_logging};
use playscout::media::{EpisodeSelector, MetadataType};
use playscout::pipeline;
use playscout::players::{Player, player_for};
use playscout::plugins::{ArgKind, EntryKind, StaticPluginLoader};
use playscout::ui::{self, Chooser};
use playscout::{
    Config, ContentRequest, GrabbedContent, HttpClient, Lookup, LookupContext, NoResultsReason,
    Outcome, Platform, PlayscoutError, PluginRegistry, ProgressEvent, grab_content,
};
use std::process::{Child, Command, ExitCode};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Look up media through scraper plugins and stream or download it
#[derive(Debug, Parser)]
#[command(name = "playscout", version)]
struct Cli {
    /// What to search for. Arguments the scraper's plugin declares
    /// (e.g. `--year 2010`) may follow the query.
    #[arg(
        trailing_var_arg = true,
        allow_hyphen_values = true,
        required_unless_present_any = ["list_plugins", "clear_cache", "edit"]
    )]
    query: Vec<String>,

    /// Scraper to use, e.g. `test` or `test.open_movies`
    #[arg(short, long)]
    scraper: Option<String>,

    /// Player to stream with: mpv, vlc or any other command
    #[arg(short, long)]
    player: Option<String>,

    /// Episode to play, `EPISODE[:SEASON]`
    #[arg(short, long)]
    episode: Option<EpisodeSelector>,

    /// Pick the n-th search result without prompting
    #[arg(short, long)]
    choice: Option<usize>,

    /// Maximum number of search results
    #[arg(short, long)]
    limit: Option<usize>,

    /// Download instead of streaming
    #[arg(short, long)]
    download: bool,

    /// Resume at the last watched episode
    #[arg(long = "continue")]
    continue_watching: bool,

    /// List installed plugins and their scrapers
    #[arg(long)]
    list_plugins: bool,

    /// Forget the watch history
    #[arg(long)]
    clear_cache: bool,

    /// Open the config file in your editor
    #[arg(long)]
    edit: bool,

    /// Use fzf for prompts
    #[arg(long, overrides_with = "no_fzf")]
    fzf: bool,

    /// Use the built-in prompt even if fzf is installed
    #[arg(long)]
    no_fzf: bool,

    /// Show debug output
    #[arg(long)]
    debug: bool,

    /// Stop at the first scraper instead of trying the next one on failure
    #[arg(long, visible_alias = "no-atns")]
    no_auto_try_next_scraper: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        let fzf = match (self.fzf, self.no_fzf) {
            (true, _) => Some(true),
            (false, true) => Some(false),
            (false, false) => None,
        };

        ConfigOverrides {
            debug: self.debug.then_some(true),
            player: self.player.clone(),
            scraper: self.scraper.clone(),
            fzf,
            limit: self.limit,
            auto_try_next_scraper: self.no_auto_try_next_scraper.then_some(false),
        }
    }
}

/// What to do after an episode started playing
#[derive(Debug, Clone, Copy)]
enum WatchAction {
    Next,
    Previous,
    Select,
    Quit,
}

const WATCH_ACTIONS: [(WatchAction, &str); 4] = [
    (WatchAction::Next, "Next"),
    (WatchAction::Previous, "Previous"),
    (WatchAction::Select, "Select"),
    (WatchAction::Quit, "Quit"),
];

/// Handles progress events and prints formatted output to stdout
fn handle_progress_event(event: ProgressEvent) {
    if let Some(message) = progress_message(event) {
        println!("{}", message);
    }
}

/// Text shown to the user for a progress event
///
/// Fallback steps only go to the debug log; the user hears about fallback
/// once every scraper is exhausted.
fn progress_message(event: ProgressEvent) -> Option<String> {
    match event {
        ProgressEvent::ScraperSelected {
            scraper_id,
            option_count,
        } => {
            if option_count == 0 {
                Some(format!("Searching with '{}'...", scraper_id))
            } else {
                Some(format!(
                    "Searching with '{}' ({} scraper option(s))...",
                    scraper_id, option_count
                ))
            }
        }
        ProgressEvent::TryingNextScraper {
            scraper_id,
            reason,
            remaining,
        } => {
            let failure = if reason.is_hard() { "failed" } else { "came up empty" };
            debug!(
                "'{}' {} ({}), {} scraper(s) left to try",
                scraper_id, failure, reason, remaining
            );
            None
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let log = init_logging(cli.debug);

    match run(cli, &log) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("\nError: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, log: &LogHandle) -> Result<ExitCode, PlayscoutError> {
    let mut config = Config::load_or_default();
    config.apply_overrides(cli.overrides());
    log.set_debug(config.debug);

    if cli.edit {
        return open_editor(&config);
    }

    if cli.clear_cache {
        let removed = WatchHistory::open()?.clear()?;
        println!("Cleared {} watch history entries.", removed);
        return Ok(ExitCode::SUCCESS);
    }

    let platform = Platform::current();
    let plugins = PluginRegistry::load_all(&StaticPluginLoader::with_builtins(), &config.plugins);

    if cli.list_plugins {
        print_plugins(&plugins, platform);
        return Ok(ExitCode::SUCCESS);
    }

    let config = Arc::new(config);
    let http_client = HttpClient::new(&config.http, config.hide_ip)?;
    let chooser = ui::chooser_for(config.ui.fzf, Some(log.clone()));

    let history = match WatchHistory::open() {
        Ok(history) => Some(history),
        Err(e) => {
            warn!("Watch history is unavailable: {}", e);
            None
        }
    };

    let context = LookupContext {
        plugins: &plugins,
        config: config.clone(),
        http_client,
        history: history.as_ref(),
        platform,
    };

    let request = ContentRequest {
        auto_select: cli.choice,
        episode: cli.episode,
        continue_watching: cli.continue_watching,
        ..ContentRequest::default()
    };

    let lookup = grab_content(
        cli.query,
        request,
        &context,
        chooser.as_ref(),
        handle_progress_event,
    )?;

    let content = match lookup {
        Lookup::UnknownScraper(miss) => {
            error!("Wasn't able to find a scraper called '{}'.", miss.identifier);
            if let Some(suggestion) = miss.suggestion() {
                println!("Did you mean '{}'?", suggestion);
            }
            return Ok(ExitCode::FAILURE);
        }
        Lookup::Finished(Outcome::NoResults(reason)) => {
            error!("{}", reason);
            return Ok(ExitCode::FAILURE);
        }
        Lookup::Finished(Outcome::Cancelled) => return Ok(ExitCode::SUCCESS),
        Lookup::Finished(Outcome::Found(content)) => content,
    };

    if cli.download {
        download(&content, &config)?;
        remember(history.as_ref(), &content);
        return Ok(ExitCode::SUCCESS);
    }

    let player = player_for(&config.player, platform, config.debug);
    watch(content, player.as_ref(), &config, chooser.as_ref(), history.as_ref())?;

    Ok(ExitCode::SUCCESS)
}

/// Plays the content, then offers the watch menu for multi-episode media
/// until the user quits or runs out of episodes
fn watch(
    mut content: GrabbedContent,
    player: &dyn Player,
    config: &Config,
    chooser: &dyn Chooser,
    history: Option<&WatchHistory>,
) -> Result<(), PlayscoutError> {
    loop {
        let is_multi = content.metadata.kind == MetadataType::Multi;

        if is_multi {
            info!(
                "Playing {} of '{}' with {}...",
                content.episode,
                content.media.title,
                player.display_name()
            );
        } else {
            info!(
                "Playing '{}' with {}...",
                content.media.title,
                player.display_name()
            );
        }
        debug!(
            "Streaming with this url -> '{}'",
            hide_ip(&content.media.url, config.hide_ip)
        );

        let child = player.play(&content.media)?;
        remember(history, &content);

        if !is_multi {
            return wait_for(child);
        }

        let labels: Vec<String> = WATCH_ACTIONS.iter().map(|(_, label)| label.to_string()).collect();
        let action = chooser
            .choose("Watch options", &labels)
            .and_then(|index| WATCH_ACTIONS.get(index))
            .map_or(WatchAction::Quit, |(action, _)| *action);

        let episode = match action {
            WatchAction::Quit => return wait_for(child),
            WatchAction::Next | WatchAction::Previous => {
                stop(child);
                let counts = pipeline::episode_counts(&content.session, &content.metadata)?;
                let mut episode = content.episode;

                let moved = match action {
                    WatchAction::Next => episode.next(&counts),
                    _ => episode.previous(&counts),
                };
                if !moved {
                    info!("No more episodes :(");
                    return Ok(());
                }
                episode
            }
            WatchAction::Select => {
                stop(child);
                let counts = pipeline::episode_counts(&content.session, &content.metadata)?;
                match pipeline::prompt_episode(&counts, chooser) {
                    Some(episode) => episode,
                    None => return Ok(()),
                }
            }
        };

        match pipeline::scrape(&content.metadata, episode, &content.session)? {
            Some(media) => {
                content.media = media;
                content.episode = episode;
            }
            None => {
                error!(
                    "{}",
                    NoResultsReason::MediaNotFound {
                        scraper_id: content.scraper_id.clone(),
                        title: content.metadata.title.clone(),
                        episode: Some(episode),
                    }
                );
                return Ok(());
            }
        }
    }
}

fn download(content: &GrabbedContent, config: &Config) -> Result<(), PlayscoutError> {
    let downloader = Downloader::new(
        config.download_location(),
        config.downloads.yt_dlp,
        config.debug,
    );

    let mut child = downloader.download(&content.media)?;
    let status = child.wait()?;

    if status.success() {
        println!(
            "Downloaded '{}' to {}",
            content.media.display_name(),
            downloader.target_path(&content.media).display()
        );
    } else {
        error!("The download exited with {}.", status);
    }

    Ok(())
}

/// Records the played episode, failures only cost the resume point
fn remember(history: Option<&WatchHistory>, content: &GrabbedContent) {
    let Some(history) = history else {
        return;
    };

    if let Err(e) = history.record(&content.scraper_id, &content.metadata, content.episode) {
        warn!("Failed to update the watch history: {}", e);
    }
}

fn wait_for(child: Option<Child>) -> Result<(), PlayscoutError> {
    if let Some(mut child) = child {
        child.wait()?;
    }
    Ok(())
}

fn stop(child: Option<Child>) {
    if let Some(mut child) = child {
        if let Err(e) = child.kill() {
            debug!("Player already exited: {}", e);
        }
        let _ = child.wait();
    }
}

fn print_plugins(plugins: &PluginRegistry, platform: Platform) {
    if plugins.is_empty() {
        println!("No plugins installed.");
        return;
    }

    for plugin in plugins.plugins() {
        println!("{} ({})", plugin.namespace, plugin.package_name);

        let default = plugin.catalog.default_scraper(platform);
        for entry in plugin.catalog.scrapers() {
            let is_default = default.is_some_and(|d| {
                matches!(&d.kind, EntryKind::Default { alias_of: Some(key) } if *key == entry.key)
            });
            let marker = if is_default { " [DEFAULT]" } else { "" };
            println!("  - {}{}", plugin.scraper_id(&entry.key), marker);
        }

        for (name, kind) in &plugin.args {
            let value = match kind {
                ArgKind::Flag => "",
                ArgKind::Text => " <text>",
                ArgKind::Number => " <number>",
            };
            println!("    --{}{}", name.replace('_', "-"), value);
        }
    }
}

/// Opens `config.toml` in the configured editor, `$VISUAL` or `$EDITOR`
fn open_editor(config: &Config) -> Result<ExitCode, PlayscoutError> {
    let path = config::config_path()?;

    let editor = config
        .editor
        .clone()
        .or_else(|| std::env::var("VISUAL").ok())
        .or_else(|| std::env::var("EDITOR").ok())
        .unwrap_or_else(|| {
            if cfg!(target_os = "windows") {
                "notepad".to_string()
            } else {
                "nano".to_string()
            }
        });

    let mut parts = editor.split_whitespace();
    let Some(program) = parts.next() else {
        error!("The configured editor is empty.");
        return Ok(ExitCode::FAILURE);
    };

    debug!("Opening '{}' with '{}'...", path.display(), editor);
    let status = Command::new(program).args(parts).arg(&path).status()?;

    if status.success() {
        Ok(ExitCode::SUCCESS)
    } else {
        error!("The editor exited with {}.", status);
        Ok(ExitCode::FAILURE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playscout::FallbackReason;

    #[test]
    fn test_scraper_selection_is_printed() {
        let message = progress_message(ProgressEvent::ScraperSelected {
            scraper_id: "test.open_movies".to_string(),
            option_count: 1,
        });

        assert_eq!(
            message.as_deref(),
            Some("Searching with 'test.open_movies' (1 scraper option(s))...")
        );
    }

    #[test]
    fn test_fallback_steps_stay_off_stdout() {
        let message = progress_message(ProgressEvent::TryingNextScraper {
            scraper_id: "test.open_movies".to_string(),
            reason: FallbackReason::NoSearchResults,
            remaining: 2,
        });

        assert_eq!(message, None);
    }
}
