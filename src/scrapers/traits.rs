use crate::models::UnitInfo;
use crate::scrapers::types::ScrapeContext;
use anyhow::Result;
use async_trait::async_trait;

/// Common trait for all building scrapers.
///
/// A malformed listing is logged and skipped inside the scraper. An `Err`
/// means the whole source failed (page structure changed, API down) and the
/// runner records an empty result for it.
#[async_trait]
pub trait ScraperTrait: Send + Sync {
    /// Collect every available unit from the source
    async fn scrape_units(&self, ctx: &ScrapeContext<'_>) -> Result<Vec<UnitInfo>>;

    /// Human-readable building name written into each unit
    fn source_name(&self) -> &'static str;

    /// URLs or endpoints the scraper starts from
    fn entry_points(&self) -> Vec<String>;
}
