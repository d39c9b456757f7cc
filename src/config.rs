//! Configuration module
//!
//! Reads `config.toml` from the system's standard config directory. Every key
//! is optional; anything missing falls back to a default, and a file that
//! fails to parse is reported and ignored rather than aborting the run.

use crate::resolver::ScraperOverride;
use crate::scraper::ScraperOptions;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info};

/// Template written on first run
const CONFIG_TEMPLATE: &str = include_str!("config.template.toml");

/// Errors that can occur while locating or reading the config file
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to determine config directory location
    #[error("Failed to determine config directory location")]
    ConfigDirectoryNotFound,

    /// Failed to create the config directory or template
    #[error("Failed to create config file at {path}: {source}")]
    CreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to read the config file
    #[error("Failed to read config file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The config file is not valid TOML or has wrongly typed values
    #[error("Failed to parse config: {0}")]
    ParseFailed(#[from] toml::de::Error),
}

/// `[playscout.ui]`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Use fzf for prompts. Unset means "use it if it is installed".
    pub fzf: Option<bool>,
    /// Maximum number of search results requested from scrapers
    pub limit: Option<usize>,
}

/// `[playscout.http]`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub headers: BTreeMap<String, String>,
    #[serde(rename = "timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        let headers = [
            (
                "User-Agent",
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/117.0",
            ),
            ("Accept-Language", "en-US,en;q=0.5"),
            (
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
            ),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();

        Self {
            headers,
            timeout_secs: 15,
        }
    }
}

/// `[playscout.downloads]`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DownloadsConfig {
    /// Directory downloads are saved to, defaults to the working directory
    pub save_path: Option<PathBuf>,
    /// Prefer yt-dlp over ffmpeg when it is installed
    pub yt_dlp: bool,
}

impl Default for DownloadsConfig {
    fn default() -> Self {
        Self {
            save_path: None,
            yt_dlp: true,
        }
    }
}

/// An entry of the `[playscout.scrapers]` table
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScraperEntry {
    /// `alias = "namespace.scraper"`
    Target(String),
    /// `alias = { namespace = "namespace.scraper", options = { ... } }`
    Detailed {
        namespace: String,
        #[serde(default)]
        options: ScraperOptions,
    },
}

/// The `[playscout]` table of `config.toml`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub debug: bool,
    /// `mpv`, `vlc` or any other command to launch
    pub player: String,
    pub editor: Option<String>,
    /// Strip IP addresses from logged urls
    pub hide_ip: bool,
    pub auto_try_next_scraper: bool,
    pub ui: UiConfig,
    pub http: HttpConfig,
    pub downloads: DownloadsConfig,
    /// Plugin namespace to module name, in declaration order
    #[serde(deserialize_with = "ordered_table")]
    pub plugins: Vec<(String, String)>,
    /// `default` plus user defined scraper aliases, in declaration order
    #[serde(deserialize_with = "ordered_table")]
    pub scrapers: Vec<(String, ScraperEntry)>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            player: "mpv".to_string(),
            editor: None,
            hide_ip: true,
            auto_try_next_scraper: true,
            ui: UiConfig::default(),
            http: HttpConfig::default(),
            downloads: DownloadsConfig::default(),
            plugins: vec![("test".to_string(), "playscout-test".to_string())],
            scrapers: Vec::new(),
        }
    }
}

/// Values passed on the command line that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub debug: Option<bool>,
    pub player: Option<String>,
    pub scraper: Option<String>,
    pub fzf: Option<bool>,
    pub limit: Option<usize>,
    pub auto_try_next_scraper: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    playscout: Config,
}

impl Config {
    /// Parses the contents of a `config.toml`
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        Ok(file.playscout)
    }

    /// Reads and parses the config file at `path`
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::from_toml_str(&content)
    }

    /// Loads the user's config, creating it from the template on first run
    ///
    /// Never fails: problems are logged and the defaults are used instead.
    pub fn load_or_default() -> Self {
        let path = match ensure_config_file() {
            Ok(path) => path,
            Err(e) => {
                error!("{}. All values will fall back to default.", e);
                return Self::default();
            }
        };

        match Self::from_path(&path) {
            Ok(config) => config,
            Err(e) => {
                error!(
                    "Failed to read config.toml! Please check you haven't made any mistakes in the config. \
                     All values will fall back to default. Error: {}",
                    e
                );
                Self::default()
            }
        }
    }

    /// Applies command line values on top of the file values
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(debug) = overrides.debug {
            self.debug = debug;
        }
        if let Some(player) = overrides.player {
            self.player = player;
        }
        if let Some(scraper) = overrides.scraper {
            self.scrapers.retain(|(name, _)| name != "default");
            self.scrapers
                .insert(0, ("default".to_string(), ScraperEntry::Target(scraper)));
        }
        if let Some(fzf) = overrides.fzf {
            self.ui.fzf = Some(fzf);
        }
        if let Some(limit) = overrides.limit {
            self.ui.limit = Some(limit);
        }
        if let Some(auto_try_next_scraper) = overrides.auto_try_next_scraper {
            self.auto_try_next_scraper = auto_try_next_scraper;
        }
    }

    /// The scraper id to use when none is picked interactively
    pub fn default_scraper(&self) -> Option<&str> {
        self.scrapers.iter().find_map(|(name, entry)| match entry {
            ScraperEntry::Target(target) if name == "default" => Some(target.as_str()),
            _ => None,
        })
    }

    /// User defined scraper aliases
    pub fn scraper_overrides(&self) -> Vec<ScraperOverride> {
        self.scrapers
            .iter()
            .filter(|(name, _)| name != "default")
            .map(|(alias, entry)| match entry {
                ScraperEntry::Target(target) => ScraperOverride {
                    alias: alias.clone(),
                    target: target.clone(),
                    options: ScraperOptions::new(),
                },
                ScraperEntry::Detailed { namespace, options } => ScraperOverride {
                    alias: alias.clone(),
                    target: namespace.clone(),
                    options: options.clone(),
                },
            })
            .collect()
    }

    /// Directory downloads are written to
    pub fn download_location(&self) -> PathBuf {
        self.downloads
            .save_path
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Returns the path of the user's `config.toml`
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let proj_dirs = directories::ProjectDirs::from("de", "westhoffswelt", "playscout")
        .ok_or(ConfigError::ConfigDirectoryNotFound)?;

    Ok(proj_dirs.config_dir().join("config.toml"))
}

/// Makes sure `config.toml` exists, writing the template if it doesn't
fn ensure_config_file() -> Result<PathBuf, ConfigError> {
    let path = config_path()?;

    if path.exists() {
        return Ok(path);
    }

    debug!("The 'config.toml' file doesn't exist so we're creating it...");

    let creation_failed = |e| ConfigError::CreationFailed {
        path: path.clone(),
        source: e,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(creation_failed)?;
    }
    fs::write(&path, CONFIG_TEMPLATE).map_err(creation_failed)?;

    info!("Config created at '{}'.", path.display());
    Ok(path)
}

/// Deserializes a TOML table into a vector of pairs, keeping the order the
/// entries were declared in.
fn ordered_table<'de, D, T>(deserializer: D) -> Result<Vec<(String, T)>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    struct OrderedTable<T>(PhantomData<T>);

    impl<'de, T: Deserialize<'de>> Visitor<'de> for OrderedTable<T> {
        type Value = Vec<(String, T)>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a table")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((key, value)) = map.next_entry::<String, T>()? {
                if entries.iter().any(|(existing, _)| existing == &key) {
                    return Err(de::Error::custom(format!("duplicate key '{}'", key)));
                }
                entries.push((key, value));
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(OrderedTable(PhantomData))
}
