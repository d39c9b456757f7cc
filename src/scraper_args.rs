//! Scraper arguments on the command line
//!
//! Plugins declare extra arguments (`--audio-only`, `--quality 720`, ...) in
//! their hook. Those are pulled out of the query words before searching, so
//! `playscout big buck bunny --year 2008` searches for "big buck bunny" with
//! the `year` option bound to the scraper.

use crate::plugins::ArgKind;
use crate::scraper::{OptionValue, ScraperOptions};
use tracing::{debug, error};

/// Removes the plugin's declared arguments from `query` and returns them as
/// scraper options
///
/// Unknown `--args` stay part of the query and are reported with the closest
/// declared name. Text and number arguments require a value; a value that
/// doesn't convert drops the argument.
///
/// # Arguments
///
/// * `query` - The query words, modified in place
/// * `declared` - The argument names and kinds from the plugin hook
///
/// # Returns
///
/// The options picked up from the query
pub fn steal_scraper_args(query: &mut Vec<String>, declared: &[(String, ArgKind)]) -> ScraperOptions {
    let mut options = ScraperOptions::new();
    let mut remaining = Vec::with_capacity(query.len());
    let mut words = std::mem::take(query).into_iter().peekable();

    while let Some(word) = words.next() {
        let Some(raw_name) = word.strip_prefix("--") else {
            remaining.push(word);
            continue;
        };

        let name = raw_name.replace('-', "_");

        let Some((_, kind)) = declared.iter().find(|(declared_name, _)| *declared_name == name)
        else {
            match closest_arg(&name, declared) {
                Some(suggestion) => error!(
                    "Unknown arg found: {}. Did you mean: --{}",
                    word,
                    suggestion.replace('_', "-")
                ),
                None => error!("Unknown arg found: {}", word),
            }
            remaining.push(word);
            continue;
        };

        let value = match kind {
            // A flag only takes an explicit `true`/`false` after it
            ArgKind::Flag => words
                .next_if(|next| next.parse::<bool>().is_ok())
                .and_then(|raw_value| convert(&raw_value, ArgKind::Flag))
                .unwrap_or(OptionValue::Flag(true)),
            ArgKind::Text | ArgKind::Number => {
                let Some(raw_value) = words.next_if(|next| !next.starts_with("--")) else {
                    error!("Expected a value for '{}' but nothing was given.", word);
                    continue;
                };

                match convert(&raw_value, *kind) {
                    Some(value) => value,
                    None => {
                        error!(
                            "Couldn't convert '{}' for '{}' to a {:?} value.",
                            raw_value, word, kind
                        );
                        continue;
                    }
                }
            }
        };

        options.insert(name, value);
    }

    *query = remaining;
    debug!("Scraper args picked up on: {:?}", options);

    options
}

fn convert(raw: &str, kind: ArgKind) -> Option<OptionValue> {
    match kind {
        ArgKind::Flag => raw.parse().ok().map(OptionValue::Flag),
        ArgKind::Number => raw.parse().ok().map(OptionValue::Number),
        ArgKind::Text => Some(OptionValue::Text(raw.to_string())),
    }
}

fn closest_arg<'a>(name: &str, declared: &'a [(String, ArgKind)]) -> Option<&'a str> {
    declared
        .iter()
        .map(|(declared_name, _)| {
            (
                declared_name.as_str(),
                strsim::normalized_levenshtein(name, declared_name),
            )
        })
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(declared_name, _)| declared_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(query: &str) -> Vec<String> {
        query.split_whitespace().map(str::to_string).collect()
    }

    fn declared() -> Vec<(String, ArgKind)> {
        vec![
            ("audio_only".to_string(), ArgKind::Flag),
            ("quality".to_string(), ArgKind::Text),
            ("year".to_string(), ArgKind::Number),
        ]
    }

    #[test]
    fn test_declared_args_are_removed_from_query() {
        let mut query = words("big buck --year 2008 bunny --quality 720p --audio-only");
        let options = steal_scraper_args(&mut query, &declared());

        assert_eq!(query, words("big buck bunny"));
        assert_eq!(options.get("year"), Some(&OptionValue::Number(2008)));
        assert_eq!(
            options.get("quality"),
            Some(&OptionValue::Text("720p".to_string()))
        );
        assert_eq!(options.get("audio_only"), Some(&OptionValue::Flag(true)));
    }

    #[test]
    fn test_flag_does_not_swallow_query_words() {
        let mut query = words("--audio-only sintel");
        let options = steal_scraper_args(&mut query, &declared());

        assert_eq!(query, words("sintel"));
        assert_eq!(options.get("audio_only"), Some(&OptionValue::Flag(true)));

        let mut query = words("--audio-only false sintel");
        let options = steal_scraper_args(&mut query, &declared());

        assert_eq!(query, words("sintel"));
        assert_eq!(options.get("audio_only"), Some(&OptionValue::Flag(false)));
    }

    #[test]
    fn test_unknown_args_stay_in_query() {
        let mut query = words("sintel --yeer 2010");
        let options = steal_scraper_args(&mut query, &declared());

        assert_eq!(query, words("sintel --yeer 2010"));
        assert!(options.is_empty());
        assert_eq!(closest_arg("yeer", &declared()), Some("year"));
    }

    #[test]
    fn test_missing_or_invalid_values_are_dropped() {
        let mut query = words("sintel --year");
        assert!(steal_scraper_args(&mut query, &declared()).is_empty());
        assert_eq!(query, words("sintel"));

        let mut query = words("sintel --year soon");
        assert!(steal_scraper_args(&mut query, &declared()).is_empty());
        assert_eq!(query, words("sintel"));

        let mut query = words("--quality --audio-only");
        let options = steal_scraper_args(&mut query, &declared());
        assert!(query.is_empty());
        assert_eq!(options.len(), 1);
        assert!(options.contains_key("audio_only"));
    }
}
