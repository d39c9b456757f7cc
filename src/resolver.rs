//! Scraper resolution
//!
//! Turns a scraper identifier from the config or the command line into a
//! concrete scraper factory. Matching is two-tiered: a bare plugin namespace
//! always means "that plugin's default scraper", anything else has to match a
//! `{namespace}.{key}` id exactly (ignoring case).

use crate::platform::Platform;
use crate::plugins::PluginRegistry;
use crate::scraper::{ScraperFactory, ScraperOptions, same_factory};
use crate::ui::Chooser;
use std::fmt;
use tracing::debug;

/// A user defined alias for a scraper, from the `[scrapers]` config table
#[derive(Debug, Clone, PartialEq)]
pub struct ScraperOverride {
    pub alias: String,
    /// Identifier the alias stands for
    pub target: String,
    /// Options bound to the scraper when used through this alias
    pub options: ScraperOptions,
}

/// A resolved scraper, ready to be instantiated
#[derive(Clone)]
pub struct SelectedScraper {
    /// Canonical id, e.g. `yt.youtube` or `yt.LINUX.DEFAULT`
    pub id: String,
    /// Namespace of the plugin the scraper belongs to
    pub namespace: String,
    /// Catalog key, possibly a default alias
    pub key: String,
    pub factory: ScraperFactory,
    pub options: ScraperOptions,
}

impl fmt::Debug for SelectedScraper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedScraper")
            .field("id", &self.id)
            .field("namespace", &self.namespace)
            .field("key", &self.key)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// An identifier that matched nothing
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionMiss {
    /// The identifier after override substitution
    pub identifier: String,
    /// Every id that would have resolved
    pub available: Vec<String>,
    pub options: ScraperOptions,
}

impl ResolutionMiss {
    /// Available ids ranked by similarity to the identifier, best first
    pub fn ranked(&self) -> Vec<(&str, f64)> {
        let wanted = self.identifier.to_lowercase();
        let mut ranked: Vec<(&str, f64)> = self
            .available
            .iter()
            .map(|id| (id.as_str(), strsim::normalized_levenshtein(&wanted, id)))
            .collect();

        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }

    /// The most similar valid id, for a "did you mean" hint
    pub fn suggestion(&self) -> Option<&str> {
        self.ranked().first().map(|(id, _)| *id)
    }
}

/// Result of resolving a scraper identifier
#[derive(Debug, Clone)]
pub enum Resolution {
    Found(SelectedScraper),
    Miss(ResolutionMiss),
}

/// Resolves `identifier` against the loaded plugins
pub fn resolve(
    identifier: &str,
    plugins: &PluginRegistry,
    overrides: &[ScraperOverride],
    platform: Platform,
) -> Resolution {
    let mut identifier = identifier.trim().to_string();
    let mut options = ScraperOptions::new();

    if let Some(scraper_override) = overrides
        .iter()
        .find(|o| o.alias.eq_ignore_ascii_case(&identifier))
    {
        debug!(
            "Using the scraper overridden namespace '{}'...",
            scraper_override.alias
        );
        identifier = scraper_override.target.clone();
        options = scraper_override.options.clone();
    }

    // A bare namespace means the plugin's default scraper
    for plugin in plugins.plugins() {
        if !plugin.namespace.eq_ignore_ascii_case(&identifier) {
            continue;
        }

        if let Some(entry) = plugin.catalog.default_scraper(platform) {
            return Resolution::Found(SelectedScraper {
                id: format!("{}.{}", plugin.namespace, entry.key),
                namespace: plugin.namespace.clone(),
                key: entry.key.clone(),
                factory: entry.factory.clone(),
                options,
            });
        }
    }

    let wanted = identifier.to_lowercase();
    let mut available = Vec::new();

    for plugin in plugins.plugins() {
        for entry in plugin.catalog.entries() {
            let id = plugin.scraper_id(&entry.key);

            if id == wanted {
                return Resolution::Found(SelectedScraper {
                    id,
                    namespace: plugin.namespace.clone(),
                    key: entry.key.clone(),
                    factory: entry.factory.clone(),
                    options,
                });
            }

            available.push(id);
        }
    }

    Resolution::Miss(ResolutionMiss {
        identifier,
        available,
        options,
    })
}

/// Lets the user pick a plugin and then one of its scrapers
///
/// Used when neither the command line nor the config names a scraper.
pub fn select_interactively<C: Chooser + ?Sized>(
    plugins: &PluginRegistry,
    platform: Platform,
    chooser: &C,
) -> Option<SelectedScraper> {
    let plugin_labels: Vec<String> = plugins
        .plugins()
        .iter()
        .map(|p| format!("{} [{}]", p.namespace, p.module_name))
        .collect();

    let plugin = plugins
        .plugins()
        .get(chooser.choose("Select a plugin", &plugin_labels)?)?;

    let default = plugin.catalog.default_scraper(platform);
    let scrapers: Vec<_> = plugin.catalog.scrapers().collect();
    let scraper_labels: Vec<String> = scrapers
        .iter()
        .map(|entry| {
            let is_default = default.is_some_and(|d| same_factory(&d.factory, &entry.factory));

            if is_default {
                format!("{} [DEFAULT]", entry.key.to_lowercase())
            } else {
                entry.key.to_lowercase()
            }
        })
        .collect();

    let entry = *scrapers.get(chooser.choose("Select a scraper", &scraper_labels)?)?;

    Some(SelectedScraper {
        id: plugin.scraper_id(&entry.key),
        namespace: plugin.namespace.clone(),
        key: entry.key.clone(),
        factory: entry.factory.clone(),
        options: ScraperOptions::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::{PluginDescriptor, PluginHook};
    use crate::scraper::{OptionValue, factory};
    use crate::ui::tests::ScriptedChooser;

    fn stub() -> ScraperFactory {
        factory(|_| Err("stub".into()))
    }

    fn descriptor(namespace: &str, scrapers: Vec<(&str, ScraperFactory)>) -> PluginDescriptor {
        let hook = PluginHook {
            version: 2,
            package_name: format!("{}-package", namespace),
            scrapers: scrapers
                .into_iter()
                .map(|(key, factory)| (key.to_string(), factory))
                .collect(),
            args: Vec::new(),
        };
        PluginDescriptor::from_hook(namespace, &format!("{}-module", namespace), hook).unwrap()
    }

    struct Fixture {
        registry: PluginRegistry,
        alpha: ScraperFactory,
        beta: ScraperFactory,
        yt_linux: ScraperFactory,
    }

    fn fixture() -> Fixture {
        let alpha = stub();
        let beta = stub();
        let yt_default = stub();
        let yt_linux = stub();

        let demo = descriptor(
            "demo",
            vec![
                ("alpha", alpha.clone()),
                ("beta", beta.clone()),
                ("DEFAULT", alpha.clone()),
            ],
        );
        let yt = descriptor(
            "yt",
            vec![
                ("youtube", yt_default.clone()),
                ("ytdlp", yt_linux.clone()),
                ("DEFAULT", yt_default),
                ("LINUX.DEFAULT", yt_linux.clone()),
            ],
        );

        Fixture {
            registry: PluginRegistry::from_plugins(vec![demo, yt]),
            alpha,
            beta,
            yt_linux,
        }
    }

    fn found(resolution: Resolution) -> SelectedScraper {
        match resolution {
            Resolution::Found(selected) => selected,
            Resolution::Miss(miss) => panic!("expected a match, missed '{}'", miss.identifier),
        }
    }

    #[test]
    fn test_bare_namespace_resolves_default() {
        let f = fixture();
        let selected = found(resolve("demo", &f.registry, &[], Platform::Linux));

        assert_eq!(selected.id, "demo.DEFAULT");
        assert_eq!(selected.key, "DEFAULT");
        assert!(same_factory(&selected.factory, &f.alpha));
    }

    #[test]
    fn test_platform_default_is_transparent() {
        let f = fixture();
        let bare = found(resolve("YT", &f.registry, &[], Platform::Linux));
        let explicit = found(resolve("yt.LINUX.DEFAULT", &f.registry, &[], Platform::Linux));

        assert_eq!(bare.id, "yt.LINUX.DEFAULT");
        assert_eq!(explicit.id, "yt.linux.default");
        assert!(same_factory(&bare.factory, &explicit.factory));
        assert!(same_factory(&bare.factory, &f.yt_linux));

        let other_platform = found(resolve("yt", &f.registry, &[], Platform::Windows));
        assert_eq!(other_platform.id, "yt.DEFAULT");
    }

    #[test]
    fn test_exact_id_ignores_case() {
        let f = fixture();
        let selected = found(resolve("Demo.BETA", &f.registry, &[], Platform::Linux));

        assert_eq!(selected.id, "demo.beta");
        assert_eq!(selected.namespace, "demo");
        assert!(same_factory(&selected.factory, &f.beta));
    }

    #[test]
    fn test_override_is_equivalent_to_target() {
        let f = fixture();
        let options = ScraperOptions::from([("audio_only".to_string(), OptionValue::Flag(true))]);

        for target in ["demo", "demo.alpha", "demo.beta", "yt", "yt.ytdlp", "yt.DEFAULT"] {
            let overrides = vec![ScraperOverride {
                alias: "Music".to_string(),
                target: target.to_string(),
                options: options.clone(),
            }];

            let via_alias = found(resolve("music", &f.registry, &overrides, Platform::Linux));
            let direct = found(resolve(target, &f.registry, &[], Platform::Linux));

            assert_eq!(via_alias.id, direct.id);
            assert_eq!(via_alias.key, direct.key);
            assert!(same_factory(&via_alias.factory, &direct.factory));
            assert_eq!(via_alias.options, options);
            assert!(direct.options.is_empty());
        }
    }

    #[test]
    fn test_overrides_do_not_chain() {
        let f = fixture();
        let overrides = vec![
            ScraperOverride {
                alias: "first".to_string(),
                target: "second".to_string(),
                options: ScraperOptions::new(),
            },
            ScraperOverride {
                alias: "second".to_string(),
                target: "demo.beta".to_string(),
                options: ScraperOptions::new(),
            },
        ];

        let resolution = resolve("first", &f.registry, &overrides, Platform::Linux);
        assert!(matches!(resolution, Resolution::Miss(ref miss) if miss.identifier == "second"));
    }

    #[test]
    fn test_miss_lists_ids_and_suggests() {
        let f = fixture();
        let resolution = resolve("demo.betta", &f.registry, &[], Platform::Linux);

        let Resolution::Miss(miss) = resolution else {
            panic!("expected a miss");
        };

        assert!(miss.available.contains(&"demo.alpha".to_string()));
        assert!(miss.available.contains(&"yt.linux.default".to_string()));
        assert_eq!(miss.available.len(), 7);
        assert_eq!(miss.suggestion(), Some("demo.beta"));
    }

    #[test]
    fn test_miss_without_plugins() {
        let registry = PluginRegistry::default();
        let Resolution::Miss(miss) = resolve("anything", &registry, &[], Platform::Linux) else {
            panic!("expected a miss");
        };

        assert!(miss.available.is_empty());
        assert_eq!(miss.suggestion(), None);
    }

    #[test]
    fn test_interactive_selection() {
        let f = fixture();
        let chooser = ScriptedChooser::new(vec![Some(1), Some(1)]);

        let selected = select_interactively(&f.registry, Platform::Linux, &chooser).unwrap();
        assert_eq!(selected.id, "yt.ytdlp");

        let prompts = chooser.prompts();
        assert_eq!(prompts[1].1, vec!["youtube", "ytdlp [DEFAULT]"]);
    }

    #[test]
    fn test_interactive_selection_cancelled() {
        let f = fixture();
        let chooser = ScriptedChooser::new(vec![None]);

        assert!(select_interactively(&f.registry, Platform::Linux, &chooser).is_none());
    }
}
