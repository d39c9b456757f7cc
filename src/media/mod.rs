/// Data structures describing search results and playable media.
///
/// `Metadata` is what a scraper returns when searching, `Media` is what it
/// returns once a result has been scraped into something a player can open.
mod episode;

pub use episode::{EpisodeCounts, EpisodeParseError, EpisodeSelector};

use serde::{Deserialize, Serialize};

/// Whether a search result has seasons and episodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetadataType {
    /// A single release, like a film or a short video
    Single,
    /// Media with multiple seasons and episodes
    Multi,
}

/// Airing state of a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiringType {
    Done,
    Ongoing,
    NotReleased,
}

/// A search result produced by a scraper, before anything has been scraped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Scraper-specific unique identifier of the content
    pub id: String,
    /// Title shown in the selection prompt
    pub title: String,
    /// Single release or multi episode
    pub kind: MetadataType,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub alternate_titles: Vec<String>,
    pub cast: Vec<String>,
    pub genres: Vec<String>,
    pub airing: Option<AiringType>,
    /// Year the content was released, if known
    pub release_year: Option<u16>,
}

impl Metadata {
    /// Creates metadata with only the required fields set
    pub fn new(id: impl Into<String>, title: impl Into<String>, kind: MetadataType) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind,
            description: None,
            image_url: None,
            alternate_titles: Vec::new(),
            cast: Vec::new(),
            genres: Vec::new(),
            airing: None,
            release_year: None,
        }
    }

    /// Sets the release year
    pub fn with_release_year(mut self, year: u16) -> Self {
        self.release_year = Some(year);
        self
    }

    /// Sets the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// How the result is rendered in selection prompts
    pub fn display_name(&self) -> String {
        match self.release_year {
            Some(year) => format!("{} ({})", self.title, year),
            None => self.title.clone(),
        }
    }
}

/// A subtitle track that can be passed to the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtitle {
    pub url: String,
    pub language: Option<String>,
}

/// Distinguishes single releases from a specific episode of a series
#[derive(Debug, Clone, PartialEq)]
pub enum MediaKind {
    Single { year: Option<u16> },
    Multi { episode: EpisodeSelector },
}

/// A resolved, streamable or downloadable piece of media
#[derive(Debug, Clone, PartialEq)]
pub struct Media {
    /// The streamable url
    pub url: String,
    pub title: String,
    /// Separate audio stream, for sources that split audio and video
    pub audio_url: Option<String>,
    /// Referrer the source requires when streaming
    pub referrer: Option<String>,
    pub subtitles: Vec<Subtitle>,
    pub kind: MediaKind,
}

impl Media {
    /// Creates a single release (film, video)
    pub fn single(url: impl Into<String>, title: impl Into<String>, year: Option<u16>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            audio_url: None,
            referrer: None,
            subtitles: Vec::new(),
            kind: MediaKind::Single { year },
        }
    }

    /// Creates one episode of a series
    pub fn multi(url: impl Into<String>, title: impl Into<String>, episode: EpisodeSelector) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            audio_url: None,
            referrer: None,
            subtitles: Vec::new(),
            kind: MediaKind::Multi { episode },
        }
    }

    /// Sets the referrer header required by the source
    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referrer = Some(referrer.into());
        self
    }

    /// Title the player window should show
    pub fn display_name(&self) -> String {
        match &self.kind {
            MediaKind::Multi { episode } => {
                format!("{} - S{} EP{}", self.title, episode.season, episode.episode)
            }
            MediaKind::Single { year: Some(year) } => format!("{} ({})", self.title, year),
            MediaKind::Single { year: None } => self.title.clone(),
        }
    }
}
