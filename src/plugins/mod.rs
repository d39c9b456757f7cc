//! Plugin registry
//!
//! Plugins are looked up by module name through a [`PluginLoader`] and turned
//! into read-only [`PluginDescriptor`]s. A plugin that fails to load is logged
//! and skipped; it never prevents the remaining plugins from loading.

mod builtin;
mod catalog;

pub use builtin::test_plugin_hook;
pub use catalog::{CatalogEntry, CatalogError, EntryKind, ScraperCatalog, is_default_key};

use crate::scraper::ScraperFactory;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Plugin hook schema version this build understands
pub const SUPPORTED_HOOK_VERSION: u32 = 2;

/// Errors that prevent a single plugin from loading
#[derive(Debug, Error)]
pub enum PluginLoadError {
    /// No module with this name is installed
    #[error("Failed to import a plugin from the module '{0}'!")]
    NotFound(String),

    /// The module exists but does not expose a plugin hook
    #[error("Failed to load the plugin '{0}'! It doesn't contain a plugin hook!")]
    MissingHook(String),

    /// The hook uses a schema version we don't know
    #[error("The plugin '{module}' uses plugin hook version {version}, only version {supported} is supported")]
    UnsupportedVersion {
        module: String,
        version: u32,
        supported: u32,
    },

    /// The hook's scraper table is malformed
    #[error("The plugin '{module}' declares an invalid scraper table: {source}")]
    InvalidCatalog {
        module: String,
        source: CatalogError,
    },

    /// Another plugin already uses this namespace, ignoring case
    #[error("The namespace '{namespace}' of the plugin '{module}' is already taken by '{taken_by}'!")]
    DuplicateNamespace {
        namespace: String,
        module: String,
        taken_by: String,
    },
}

/// Type of a command line argument a plugin accepts for its scrapers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    /// `--flag`, no value
    Flag,
    /// `--name value`
    Text,
    /// `--count 3`
    Number,
}

/// What a plugin module exposes to the registry
#[derive(Clone)]
pub struct PluginHook {
    /// Schema version of the hook
    pub version: u32,
    /// Name of the distributed package, used only for display
    pub package_name: String,
    /// Scraper key to factory, in declaration order
    pub scrapers: Vec<(String, ScraperFactory)>,
    /// Scraper arguments the plugin accepts on the command line
    pub args: Vec<(String, ArgKind)>,
}

/// Loads plugin hooks by module name
///
/// The registry does not care how a module is found; a compiled-in table
/// and a dynamic library loader are equally valid implementations.
pub trait PluginLoader {
    /// Loads the hook of the module called `module_name`
    fn load(&self, module_name: &str) -> Result<PluginHook, PluginLoadError>;
}

type HookConstructor = Arc<dyn Fn() -> Option<PluginHook> + Send + Sync>;

/// Plugin loader backed by a table of plugins compiled into the binary
#[derive(Clone, Default)]
pub struct StaticPluginLoader {
    modules: HashMap<String, HookConstructor>,
}

impl StaticPluginLoader {
    /// Creates an empty loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a loader that knows the plugins shipped with playscout
    pub fn with_builtins() -> Self {
        let mut loader = Self::new();
        loader.register("playscout-test", || Some(test_plugin_hook()));
        loader
    }

    /// Registers a module. The constructor returns `None` for modules that
    /// exist but don't expose a hook.
    pub fn register<F>(&mut self, module_name: &str, hook: F)
    where
        F: Fn() -> Option<PluginHook> + Send + Sync + 'static,
    {
        self.modules
            .insert(normalize_module_name(module_name), Arc::new(hook));
    }
}

impl PluginLoader for StaticPluginLoader {
    fn load(&self, module_name: &str) -> Result<PluginHook, PluginLoadError> {
        let constructor = self
            .modules
            .get(&normalize_module_name(module_name))
            .ok_or_else(|| PluginLoadError::NotFound(module_name.to_string()))?;

        constructor().ok_or_else(|| PluginLoadError::MissingHook(module_name.to_string()))
    }
}

/// `playscout-test` and `playscout_test` name the same module
fn normalize_module_name(name: &str) -> String {
    name.trim().replace('-', "_").to_lowercase()
}

/// An installed, successfully loaded plugin
#[derive(Debug, Clone)]
pub struct PluginDescriptor {
    /// User chosen short alias, e.g. `yt`
    pub namespace: String,
    /// Module name the plugin was loaded from
    pub module_name: String,
    pub package_name: String,
    pub catalog: ScraperCatalog,
    pub args: Vec<(String, ArgKind)>,
}

impl PluginDescriptor {
    /// Validates a hook and builds the descriptor for it
    pub fn from_hook(
        namespace: &str,
        module_name: &str,
        hook: PluginHook,
    ) -> Result<Self, PluginLoadError> {
        if hook.version != SUPPORTED_HOOK_VERSION {
            return Err(PluginLoadError::UnsupportedVersion {
                module: module_name.to_string(),
                version: hook.version,
                supported: SUPPORTED_HOOK_VERSION,
            });
        }

        let catalog =
            ScraperCatalog::new(hook.scrapers).map_err(|e| PluginLoadError::InvalidCatalog {
                module: module_name.to_string(),
                source: e,
            })?;

        Ok(Self {
            namespace: namespace.to_string(),
            module_name: module_name.to_string(),
            package_name: hook.package_name,
            catalog,
            args: hook.args,
        })
    }

    /// Canonical id of a catalog key: `{namespace}.{key}` lower-cased
    pub fn scraper_id(&self, key: &str) -> String {
        format!("{}.{}", self.namespace, key).to_lowercase()
    }
}

/// Every plugin that loaded successfully, in configuration order
#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    plugins: Vec<PluginDescriptor>,
}

impl PluginRegistry {
    /// Loads every `namespace -> module name` pair, skipping broken plugins
    pub fn load_all<L: PluginLoader + ?Sized>(loader: &L, plugin_map: &[(String, String)]) -> Self {
        let mut plugins: Vec<PluginDescriptor> = Vec::with_capacity(plugin_map.len());

        for (namespace, module_name) in plugin_map {
            let descriptor = match plugins
                .iter()
                .find(|p| p.namespace.eq_ignore_ascii_case(namespace))
            {
                Some(taken) => Err(PluginLoadError::DuplicateNamespace {
                    namespace: namespace.clone(),
                    module: module_name.clone(),
                    taken_by: taken.module_name.clone(),
                }),
                None => loader
                    .load(module_name)
                    .and_then(|hook| PluginDescriptor::from_hook(namespace, module_name, hook)),
            };

            match descriptor {
                Ok(descriptor) => {
                    debug!(
                        "Loaded plugin '{}' as '{}' with {} scraper(s)",
                        module_name,
                        namespace,
                        descriptor.catalog.scrapers().count()
                    );
                    plugins.push(descriptor);
                }
                Err(e) => {
                    warn!("{} Skipping it.", e);
                }
            }
        }

        Self { plugins }
    }

    /// Builds a registry from already loaded descriptors
    pub fn from_plugins(plugins: Vec<PluginDescriptor>) -> Self {
        Self { plugins }
    }

    pub fn plugins(&self) -> &[PluginDescriptor] {
        &self.plugins
    }

    /// Finds a plugin by namespace, ignoring case
    pub fn get(&self, namespace: &str) -> Option<&PluginDescriptor> {
        self.plugins
            .iter()
            .find(|p| p.namespace.eq_ignore_ascii_case(namespace))
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::factory;

    fn hook(version: u32, keys: &[&str]) -> PluginHook {
        PluginHook {
            version,
            package_name: "stub".to_string(),
            scrapers: keys
                .iter()
                .map(|key| (key.to_string(), factory(|_| Err("stub".into()))))
                .collect(),
            args: Vec::new(),
        }
    }

    fn plugin_map(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(ns, module)| (ns.to_string(), module.to_string()))
            .collect()
    }

    #[test]
    fn test_broken_plugins_are_skipped() {
        let mut loader = StaticPluginLoader::new();
        loader.register("good-one", || Some(hook(2, &["a", "b"])));
        loader.register("no-hook", || None);
        loader.register("too-new", || Some(hook(3, &["a"])));
        loader.register("good-two", || Some(hook(2, &["c"])));

        let registry = PluginRegistry::load_all(
            &loader,
            &plugin_map(&[
                ("one", "good-one"),
                ("missing", "not-installed"),
                ("nohook", "no-hook"),
                ("new", "too-new"),
                ("two", "good-two"),
            ]),
        );

        let namespaces: Vec<_> = registry.plugins().iter().map(|p| p.namespace.as_str()).collect();
        assert_eq!(namespaces, vec!["one", "two"]);
    }

    #[test]
    fn test_namespaces_differing_in_case_are_skipped() {
        let mut loader = StaticPluginLoader::new();
        loader.register("first", || Some(hook(2, &["a", "b"])));
        loader.register("second", || Some(hook(2, &["a", "z"])));

        let registry =
            PluginRegistry::load_all(&loader, &plugin_map(&[("Demo", "first"), ("demo", "second")]));

        assert_eq!(registry.plugins().len(), 1);
        assert_eq!(registry.plugins()[0].namespace, "Demo");
        assert_eq!(registry.plugins()[0].module_name, "first");
        assert!(registry.get("DEMO").unwrap().catalog.position_of("b").is_some());
    }

    #[test]
    fn test_loader_errors() {
        let mut loader = StaticPluginLoader::new();
        loader.register("no-hook", || None);

        assert!(matches!(loader.load("nope"), Err(PluginLoadError::NotFound(_))));
        assert!(matches!(loader.load("no-hook"), Err(PluginLoadError::MissingHook(_))));
    }

    #[test]
    fn test_module_names_ignore_dash_and_underscore() {
        let mut loader = StaticPluginLoader::new();
        loader.register("playscout-demo", || Some(hook(2, &["a"])));

        assert!(loader.load("playscout_demo").is_ok());
        assert!(loader.load("PlayScout-Demo").is_ok());
    }

    #[test]
    fn test_unsupported_version_is_rejected() {
        let result = PluginDescriptor::from_hook("x", "x-module", hook(1, &["a"]));
        assert!(matches!(
            result,
            Err(PluginLoadError::UnsupportedVersion { version: 1, .. })
        ));
    }

    #[test]
    fn test_invalid_catalog_is_rejected() {
        let result = PluginDescriptor::from_hook("x", "x-module", hook(2, &["a", "a"]));
        assert!(matches!(result, Err(PluginLoadError::InvalidCatalog { .. })));
    }

    #[test]
    fn test_registry_lookup_by_namespace() {
        let mut loader = StaticPluginLoader::new();
        loader.register("demo", || Some(hook(2, &["alpha"])));
        let registry = PluginRegistry::load_all(&loader, &plugin_map(&[("Demo", "demo")]));

        let plugin = registry.get("demo").unwrap();
        assert_eq!(plugin.scraper_id("Alpha"), "demo.alpha");
        assert!(registry.get("other").is_none());
    }

    #[test]
    fn test_builtin_test_plugin_loads() {
        let loader = StaticPluginLoader::with_builtins();
        let registry =
            PluginRegistry::load_all(&loader, &plugin_map(&[("test", "playscout-test")]));

        assert_eq!(registry.plugins().len(), 1);
        assert!(registry.plugins()[0].catalog.scrapers().count() >= 1);
    }
}
