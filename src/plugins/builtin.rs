//! Plugins compiled into playscout
//!
//! `playscout-test` serves the Blender open movies, so a fresh install has
//! something to search for before any third-party plugin is configured.

use super::{ArgKind, PluginHook, SUPPORTED_HOOK_VERSION};
use crate::media::{EpisodeCounts, EpisodeSelector, Media, Metadata, MetadataType};
use crate::scraper::{
    OptionValue, Scraper, ScraperContext, ScraperError, SearchResults, factory,
};
use tracing::debug;

struct OpenMovie {
    title: &'static str,
    year: u16,
    url: &'static str,
}

const OPEN_MOVIES: &[OpenMovie] = &[
    OpenMovie {
        title: "Elephants Dream",
        year: 2006,
        url: "https://archive.org/download/ElephantsDream/ed_1024_512kb.mp4",
    },
    OpenMovie {
        title: "Big Buck Bunny",
        year: 2008,
        url: "https://download.blender.org/peach/bigbuckbunny_movies/BigBuckBunny_320x180.mp4",
    },
    OpenMovie {
        title: "Sintel",
        year: 2010,
        url: "https://download.blender.org/durian/movies/Sintel.2010.720p.mkv",
    },
    OpenMovie {
        title: "Tears of Steel",
        year: 2012,
        url: "https://download.blender.org/demo/movies/ToS/tears_of_steel_720p.mov",
    },
];

const COLLECTION_ID: &str = "blender-open-movies";
const COLLECTION_TITLE: &str = "Blender Open Movies";

/// Scraper over the fixed list of Blender open movies
///
/// Every film is a single result; the whole list is also offered as one
/// multi-episode collection with the films as episodes of season 1.
struct OpenMovieScraper {
    year: Option<i64>,
}

impl OpenMovieScraper {
    fn new(context: &ScraperContext) -> Self {
        let year = match context.options.get("year") {
            Some(OptionValue::Number(year)) => Some(*year),
            _ => None,
        };

        Self { year }
    }

    fn matches_year(&self, movie: &OpenMovie) -> bool {
        self.year.is_none_or(|year| i64::from(movie.year) == year)
    }
}

impl Scraper for OpenMovieScraper {
    fn search<'a>(
        &'a self,
        query: &str,
        limit: Option<usize>,
    ) -> Result<SearchResults<'a>, ScraperError> {
        let query = query.trim().to_lowercase();
        debug!("Searching the open movie list for '{}'", query);

        let collection = COLLECTION_TITLE
            .to_lowercase()
            .contains(&query)
            .then(|| {
                Metadata::new(COLLECTION_ID, COLLECTION_TITLE, MetadataType::Multi)
                    .with_description("Every Blender open movie, one per episode.")
            });

        let films = OPEN_MOVIES
            .iter()
            .enumerate()
            .filter(move |(_, movie)| movie.title.to_lowercase().contains(&query))
            .filter(move |(_, movie)| self.matches_year(movie))
            .map(|(index, movie)| {
                Metadata::new(index.to_string(), movie.title, MetadataType::Single)
                    .with_release_year(movie.year)
            });

        let results = collection.into_iter().chain(films);

        let results: SearchResults<'a> = match limit {
            Some(limit) => Box::new(results.take(limit)),
            None => Box::new(results),
        };

        Ok(results)
    }

    fn scrape(
        &self,
        metadata: &Metadata,
        episode: EpisodeSelector,
    ) -> Result<Option<Media>, ScraperError> {
        if metadata.id == COLLECTION_ID {
            if episode.season != 1 {
                return Ok(None);
            }

            let index = episode.episode.saturating_sub(1) as usize;
            return Ok(OPEN_MOVIES
                .get(index)
                .map(|movie| Media::multi(movie.url, COLLECTION_TITLE, episode)));
        }

        let index: usize = metadata.id.parse()?;
        Ok(OPEN_MOVIES
            .get(index)
            .map(|movie| Media::single(movie.url, movie.title, Some(movie.year))))
    }

    fn scrape_episode_count(&self, metadata: &Metadata) -> Result<EpisodeCounts, ScraperError> {
        if metadata.id == COLLECTION_ID {
            return Ok(EpisodeCounts::from([(1, OPEN_MOVIES.len() as u32)]));
        }

        Ok(EpisodeCounts::from([(1, 1)]))
    }
}

/// Hook of the `playscout-test` plugin
pub fn test_plugin_hook() -> PluginHook {
    let open_movies = factory(|context| {
        Ok(Box::new(OpenMovieScraper::new(context)) as Box<dyn Scraper>)
    });

    PluginHook {
        version: SUPPORTED_HOOK_VERSION,
        package_name: "playscout-test".to_string(),
        scrapers: vec![
            ("DEFAULT".to_string(), open_movies.clone()),
            ("open_movies".to_string(), open_movies),
        ],
        args: vec![("year".to_string(), ArgKind::Number)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::http_client::HttpClient;
    use crate::scraper::ScraperOptions;
    use std::sync::Arc;

    fn scraper(options: ScraperOptions) -> OpenMovieScraper {
        let config = Config::default();
        let context = ScraperContext {
            http_client: HttpClient::new(&config.http, true).unwrap(),
            config: Arc::new(config),
            options,
        };
        OpenMovieScraper::new(&context)
    }

    #[test]
    fn test_search_matches_titles() {
        let scraper = scraper(ScraperOptions::new());
        let titles: Vec<_> = scraper
            .search("sintel", None)
            .unwrap()
            .map(|m| m.title)
            .collect();

        assert_eq!(titles, vec!["Sintel"]);
    }

    #[test]
    fn test_year_option_filters_results() {
        let options = ScraperOptions::from([("year".to_string(), OptionValue::Number(2008))]);
        let scraper = scraper(options);
        let titles: Vec<_> = scraper.search("", None).unwrap().map(|m| m.title).collect();

        assert_eq!(titles, vec![COLLECTION_TITLE, "Big Buck Bunny"]);
    }

    #[test]
    fn test_collection_episodes() {
        let scraper = scraper(ScraperOptions::new());
        let collection = Metadata::new(COLLECTION_ID, COLLECTION_TITLE, MetadataType::Multi);

        let counts = scraper.scrape_episode_count(&collection).unwrap();
        assert_eq!(counts.get(&1), Some(&(OPEN_MOVIES.len() as u32)));

        let media = scraper
            .scrape(&collection, EpisodeSelector::new(2, 1))
            .unwrap()
            .unwrap();
        assert_eq!(media.url, OPEN_MOVIES[1].url);

        assert!(scraper
            .scrape(&collection, EpisodeSelector::new(99, 1))
            .unwrap()
            .is_none());
    }
}
