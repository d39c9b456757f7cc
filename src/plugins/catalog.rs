//! Ordered scraper catalog of a plugin
//!
//! The catalog keeps the declaration order of the plugin hook, since that
//! order is what "the next scraper" means when falling back. Default keys
//! (`DEFAULT`, `LINUX.DEFAULT`, ...) are aliases: at construction time each
//! one is linked to the concrete key that shares its factory.

use crate::platform::Platform;
use crate::scraper::{ScraperFactory, same_factory};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

static DEFAULT_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[A-Z]+\.)?DEFAULT$").expect("valid regex"));

/// Returns true for `DEFAULT` and `{PLATFORM}.DEFAULT` keys
pub fn is_default_key(key: &str) -> bool {
    DEFAULT_KEY.is_match(key)
}

/// Reasons a plugin's scraper table is rejected at load time
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("scraper key '{0}' is declared more than once")]
    DuplicateKey(String),

    #[error("scrapers '{first}' and '{second}' share the same constructor")]
    SharedFactory { first: String, second: String },

    #[error("scraper key must not be empty")]
    EmptyKey,
}

/// Whether a catalog entry is a real scraper or a default alias
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    Concrete,
    /// A default marker. `alias_of` names the concrete key with the same
    /// factory, if the plugin declared one.
    Default { alias_of: Option<String> },
}

/// One key of the catalog
#[derive(Clone)]
pub struct CatalogEntry {
    pub key: String,
    pub factory: ScraperFactory,
    pub kind: EntryKind,
}

impl CatalogEntry {
    pub fn is_default(&self) -> bool {
        matches!(self.kind, EntryKind::Default { .. })
    }
}

impl fmt::Debug for CatalogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogEntry")
            .field("key", &self.key)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Ordered mapping from scraper key to scraper factory
#[derive(Debug, Clone)]
pub struct ScraperCatalog {
    entries: Vec<CatalogEntry>,
}

impl ScraperCatalog {
    /// Builds a catalog from the hook's `(key, factory)` pairs
    ///
    /// Rejects duplicate keys and concrete keys sharing a factory, because
    /// default aliases are linked to their target by factory identity.
    pub fn new(scrapers: Vec<(String, ScraperFactory)>) -> Result<Self, CatalogError> {
        let mut entries: Vec<CatalogEntry> = Vec::with_capacity(scrapers.len());

        for (key, factory) in scrapers {
            if key.is_empty() {
                return Err(CatalogError::EmptyKey);
            }

            if entries.iter().any(|e| e.key.eq_ignore_ascii_case(&key)) {
                return Err(CatalogError::DuplicateKey(key));
            }

            let kind = if is_default_key(&key) {
                EntryKind::Default { alias_of: None }
            } else {
                if let Some(existing) = entries
                    .iter()
                    .find(|e| !e.is_default() && same_factory(&e.factory, &factory))
                {
                    return Err(CatalogError::SharedFactory {
                        first: existing.key.clone(),
                        second: key,
                    });
                }
                EntryKind::Concrete
            };

            entries.push(CatalogEntry { key, factory, kind });
        }

        // Link every default to the concrete entry it points at
        let concrete: Vec<(String, ScraperFactory)> = entries
            .iter()
            .filter(|e| !e.is_default())
            .map(|e| (e.key.clone(), e.factory.clone()))
            .collect();

        for entry in entries.iter_mut().filter(|e| e.is_default()) {
            let alias_of = concrete
                .iter()
                .find(|(_, factory)| same_factory(factory, &entry.factory))
                .map(|(key, _)| key.clone());
            entry.kind = EntryKind::Default { alias_of };
        }

        Ok(Self { entries })
    }

    /// Every entry, default aliases included, in declaration order
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// The user facing scrapers: every entry except the default aliases
    pub fn scrapers(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter().filter(|e| !e.is_default())
    }

    /// Looks up an entry by key, ignoring case
    pub fn get(&self, key: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.key.eq_ignore_ascii_case(key))
    }

    /// The default scraper for `platform`: `{PLATFORM}.DEFAULT` wins over
    /// the plain `DEFAULT`.
    pub fn default_scraper(&self, platform: Platform) -> Option<&CatalogEntry> {
        let platform_key = format!("{}.DEFAULT", platform.catalog_prefix());
        self.get(&platform_key).or_else(|| self.get("DEFAULT"))
    }

    /// Index of `key` among the concrete scrapers
    ///
    /// A default alias maps to the position of the scraper it aliases.
    pub fn position_of(&self, key: &str) -> Option<usize> {
        let entry = self.get(key)?;

        let concrete_key = match &entry.kind {
            EntryKind::Concrete => entry.key.as_str(),
            EntryKind::Default { alias_of } => alias_of.as_deref()?,
        };

        self.scrapers()
            .position(|e| e.key.eq_ignore_ascii_case(concrete_key))
    }

    /// The concrete scrapers declared strictly after `key`
    ///
    /// Empty if `key` is the last scraper or cannot be placed in the order.
    pub fn next_after(&self, key: &str) -> Vec<&CatalogEntry> {
        match self.position_of(key) {
            Some(position) => self.scrapers().skip(position + 1).collect(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::factory;

    fn stub_factory() -> ScraperFactory {
        factory(|_| Err("never constructed".into()))
    }

    fn keys<'a>(entries: impl IntoIterator<Item = &'a CatalogEntry>) -> Vec<&'a str> {
        entries.into_iter().map(|e| e.key.as_str()).collect()
    }

    #[test]
    fn test_default_key_pattern() {
        assert!(is_default_key("DEFAULT"));
        assert!(is_default_key("LINUX.DEFAULT"));
        assert!(is_default_key("IOS.DEFAULT"));
        assert!(!is_default_key("default"));
        assert!(!is_default_key("alpha"));
        assert!(!is_default_key("linux.DEFAULT"));
        assert!(!is_default_key("A.B.DEFAULT"));
    }

    #[test]
    fn test_scrapers_exclude_defaults_and_keep_order() {
        let alpha = stub_factory();
        let catalog = ScraperCatalog::new(vec![
            ("gamma".to_string(), stub_factory()),
            ("DEFAULT".to_string(), alpha.clone()),
            ("alpha".to_string(), alpha),
            ("beta".to_string(), stub_factory()),
        ])
        .unwrap();

        assert_eq!(keys(catalog.scrapers()), vec!["gamma", "alpha", "beta"]);
        assert_eq!(catalog.entries().len(), 4);
    }

    #[test]
    fn test_default_links_to_concrete_key() {
        let beta = stub_factory();
        let catalog = ScraperCatalog::new(vec![
            ("alpha".to_string(), stub_factory()),
            ("beta".to_string(), beta.clone()),
            ("DEFAULT".to_string(), beta),
        ])
        .unwrap();

        let default = catalog.get("DEFAULT").unwrap();
        assert_eq!(
            default.kind,
            EntryKind::Default {
                alias_of: Some("beta".to_string())
            }
        );
        assert_eq!(catalog.position_of("DEFAULT"), Some(1));
        assert_eq!(catalog.position_of("beta"), Some(1));
    }

    #[test]
    fn test_platform_default_wins() {
        let alpha = stub_factory();
        let beta = stub_factory();
        let catalog = ScraperCatalog::new(vec![
            ("alpha".to_string(), alpha.clone()),
            ("beta".to_string(), beta.clone()),
            ("DEFAULT".to_string(), alpha),
            ("ANDROID.DEFAULT".to_string(), beta),
        ])
        .unwrap();

        assert_eq!(catalog.default_scraper(Platform::Android).unwrap().key, "ANDROID.DEFAULT");
        assert_eq!(catalog.default_scraper(Platform::Linux).unwrap().key, "DEFAULT");
    }

    #[test]
    fn test_no_default_declared() {
        let catalog = ScraperCatalog::new(vec![("alpha".to_string(), stub_factory())]).unwrap();
        assert!(catalog.default_scraper(Platform::Linux).is_none());
    }

    #[test]
    fn test_shared_factory_is_rejected() {
        let shared = stub_factory();
        let result = ScraperCatalog::new(vec![
            ("alpha".to_string(), shared.clone()),
            ("beta".to_string(), shared),
        ]);

        assert_eq!(
            result.unwrap_err(),
            CatalogError::SharedFactory {
                first: "alpha".to_string(),
                second: "beta".to_string()
            }
        );
    }

    #[test]
    fn test_duplicate_key_is_rejected() {
        let result = ScraperCatalog::new(vec![
            ("alpha".to_string(), stub_factory()),
            ("Alpha".to_string(), stub_factory()),
        ]);

        assert_eq!(result.unwrap_err(), CatalogError::DuplicateKey("Alpha".to_string()));
    }

    #[test]
    fn test_next_after_is_strictly_forward() {
        let a = stub_factory();
        let catalog = ScraperCatalog::new(vec![
            ("a".to_string(), a.clone()),
            ("b".to_string(), stub_factory()),
            ("c".to_string(), stub_factory()),
            ("DEFAULT".to_string(), a),
        ])
        .unwrap();

        assert_eq!(keys(catalog.next_after("a")), vec!["b", "c"]);
        assert_eq!(keys(catalog.next_after("b")), vec!["c"]);
        assert!(catalog.next_after("c").is_empty());
        assert_eq!(keys(catalog.next_after("DEFAULT")), vec!["b", "c"]);
        assert!(catalog.next_after("missing").is_empty());
    }

    #[test]
    fn test_dangling_default_has_no_position() {
        let catalog = ScraperCatalog::new(vec![
            ("alpha".to_string(), stub_factory()),
            ("DEFAULT".to_string(), stub_factory()),
        ])
        .unwrap();

        assert_eq!(
            catalog.get("DEFAULT").unwrap().kind,
            EntryKind::Default { alias_of: None }
        );
        assert_eq!(catalog.position_of("DEFAULT"), None);
        assert!(catalog.next_after("DEFAULT").is_empty());
    }
}
