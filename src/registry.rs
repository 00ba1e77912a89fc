//! Named set of scrapers the runner can pick from.

use std::sync::Arc;

use anyhow::Result;
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::ScoutError;
use crate::scrapers::{
    ColumbusScraper, GroveScraper, Haus25Scraper, JournalSquaredScraper, KreScraper,
    ParkAvenueScraper, ScraperTrait, WarrenAtYorkScraper,
};

/// Registered by default, in run order
pub const DEFAULT_SCRAPERS: &[&str] = &["235grand"];

/// Implemented but left out of the default set
pub const DISABLED_SCRAPERS: &[&str] = &[
    "columbus579",
    "haus25",
    "1grove",
    "warrenatyork",
    "18park",
    "journalsquared",
];

pub type ScraperMap = IndexMap<String, Arc<dyn ScraperTrait>>;

fn build_known(name: &str) -> Result<Option<Arc<dyn ScraperTrait>>> {
    let scraper: Arc<dyn ScraperTrait> = match name {
        "235grand" => Arc::new(KreScraper::grand235()),
        "18park" => Arc::new(ParkAvenueScraper),
        "1grove" => Arc::new(GroveScraper),
        "haus25" => Arc::new(Haus25Scraper::new()),
        "warrenatyork" => Arc::new(WarrenAtYorkScraper),
        "columbus579" => Arc::new(ColumbusScraper),
        "journalsquared" => Arc::new(JournalSquaredScraper::new()?),
        _ => return Ok(None),
    };
    Ok(Some(scraper))
}

#[derive(Clone)]
pub struct ScraperRegistry {
    scrapers: ScraperMap,
}

impl ScraperRegistry {
    /// Registry holding the curated default scrapers
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for name in DEFAULT_SCRAPERS {
            match build_known(name) {
                Ok(Some(scraper)) => {
                    if let Err(e) = registry.register(name, scraper) {
                        warn!("Default scraper {} rejected: {}", name, e);
                    }
                }
                Ok(None) => warn!("Default scraper {} has no implementation", name),
                Err(e) => warn!("Could not build default scraper {}: {:#}", name, e),
            }
        }
        registry
    }

    pub fn empty() -> Self {
        Self {
            scrapers: IndexMap::new(),
        }
    }

    /// Every implemented scraper, including the ones disabled by default
    pub fn with_all_known() -> Result<Self> {
        let mut registry = Self::empty();
        for name in DEFAULT_SCRAPERS.iter().chain(DISABLED_SCRAPERS) {
            if let Some(scraper) = build_known(name)? {
                registry.register(name, scraper)?;
            }
        }
        Ok(registry)
    }

    /// Add or replace a scraper under `name`.
    ///
    /// The scraper must name its building and declare at least one http(s)
    /// entry point.
    pub fn register(&mut self, name: &str, scraper: Arc<dyn ScraperTrait>) -> Result<(), ScoutError> {
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(ScoutError::InvalidScraperName(name.to_string()));
        }

        let non_conforming = |reason: &str| ScoutError::NonConformingScraper {
            name: name.to_string(),
            reason: reason.to_string(),
        };
        if scraper.source_name().trim().is_empty() {
            return Err(non_conforming("source_name() is empty"));
        }
        let entry_points = scraper.entry_points();
        if entry_points.is_empty() {
            return Err(non_conforming("entry_points() is empty"));
        }
        if let Some(bad) = entry_points
            .iter()
            .find(|url| !(url.starts_with("http://") || url.starts_with("https://")))
        {
            return Err(non_conforming(&format!("entry point '{}' is not an http(s) URL", bad)));
        }

        debug!("Registered scraper {}", name);
        self.scrapers.insert(name.to_string(), scraper);
        Ok(())
    }

    pub fn unregister(&mut self, name: &str) -> Option<Arc<dyn ScraperTrait>> {
        self.scrapers.shift_remove(name)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ScraperTrait>> {
        self.scrapers.get(name).cloned()
    }

    /// Copy of the name -> scraper mapping; changing it leaves the registry alone
    pub fn get_all(&self) -> ScraperMap {
        self.scrapers.clone()
    }

    pub fn list_names(&self) -> Vec<String> {
        self.scrapers.keys().cloned().collect()
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.scrapers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.scrapers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scrapers.is_empty()
    }
}

impl Default for ScraperRegistry {
    fn default() -> Self {
        Self::new()
    }
}
