//! Name-keyed lookup of scraper constructors.
//!
//! The registry is an explicit value built once at process start and passed
//! by reference to whatever needs lookup, rather than ambient global state.
//! Sources are registered under stable names; looking one up instantiates a
//! fresh [`Scraper`] variant and touches no network.

use crate::error::HarvestError;
use crate::scrapers::{DailyStarScraper, ProthomAloScraper, Scraper};

/// Constructor for one registered source variant.
pub type ScraperCtor = Box<dyn Fn() -> Box<dyn Scraper> + Send + Sync>;

/// Maps a source name to a constructor for a conforming variant.
pub struct ScraperRegistry {
    // A vec of pairs rather than a map: enumeration order is part of the
    // contract (insertion order), and the registry stays small.
    entries: Vec<(String, ScraperCtor)>,
}

impl ScraperRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// A registry pre-loaded with the sources that ship with the crate.
    pub fn with_builtin_sources() -> Self {
        let mut registry = Self::new();
        registry.register("daily_star", || Box::new(DailyStarScraper::new()));
        registry.register("prothom_alo", || Box::new(ProthomAloScraper::new()));
        registry
    }

    /// Bind `name` to a constructor.
    ///
    /// Re-registering a name replaces the previous binding (last
    /// registration wins) and the name keeps its place in the enumeration
    /// order. Callers needing strict uniqueness check [`list_registered`]
    /// first.
    ///
    /// [`list_registered`]: ScraperRegistry::list_registered
    pub fn register(
        &mut self,
        name: impl Into<String>,
        ctor: impl Fn() -> Box<dyn Scraper> + Send + Sync + 'static,
    ) {
        let name = name.into();
        let ctor: ScraperCtor = Box::new(ctor);
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = ctor,
            None => self.entries.push((name, ctor)),
        }
    }

    /// Instantiate the variant registered under `name`.
    pub fn create(&self, name: &str) -> Result<Box<dyn Scraper>, HarvestError> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, ctor)| ctor())
            .ok_or_else(|| HarvestError::UnknownSource {
                name: name.to_string(),
                available: self.list_registered().join(", "),
            })
    }

    /// Registered source names, in registration order.
    pub fn list_registered(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }
}

impl Default for ScraperRegistry {
    fn default() -> Self {
        Self::with_builtin_sources()
    }
}
