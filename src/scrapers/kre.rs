//! Buildings on the table-card floorplan template, such as 235 Grand.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use scraper::{ElementRef, Html};
use tracing::{debug, error, info, warn};

use crate::error::ScoutError;
use crate::models::{PriceInfo, UnitInfo, UnitSet};
use crate::normalize::{clean_price, parse_availability_date, shorten_floorplan_type};
use crate::scrapers::html::{first_text, selector};
use crate::scrapers::traits::ScraperTrait;
use crate::scrapers::types::ScrapeContext;

const TABLE_WAIT: Duration = Duration::from_secs(10);

/// One floorplan page per slug, each listing rows of units
pub struct KreScraper {
    building: &'static str,
    base: &'static str,
    floorplan_slugs: &'static [&'static str],
}

impl KreScraper {
    pub fn grand235() -> Self {
        Self {
            building: "235Grand",
            base: "https://www.235grand.com",
            floorplan_slugs: &["studio", "1-bedroom---1-bathroom", "2-bedroom---2-bathroom"],
        }
    }

    fn floorplan_url(&self, slug: &str) -> String {
        format!("{}/floorplans/{}", self.base, slug)
    }

    async fn scrape_floorplan(&self, ctx: &ScrapeContext<'_>, slug: &str) -> Result<Vec<UnitInfo>> {
        ctx.fetcher.navigate(&self.floorplan_url(slug))?;
        ctx.pause().await;
        ctx.fetcher.wait_for(".table-card", TABLE_WAIT)?;
        let html = ctx.fetcher.content()?;
        parse_floorplan_page(&html, self.building, &ctx.observed_at)
    }
}

#[async_trait]
impl ScraperTrait for KreScraper {
    async fn scrape_units(&self, ctx: &ScrapeContext<'_>) -> Result<Vec<UnitInfo>> {
        let mut units = UnitSet::new();

        for slug in self.floorplan_slugs {
            info!("Fetching {} units for floorplan type: {}", self.building, slug);
            match self.scrape_floorplan(ctx, slug).await {
                Ok(found) => units.extend(found),
                Err(e) => error!("Error fetching units for floorplan {}: {:#}", slug, e),
            }
        }

        info!("Found {} units in total", units.len());
        Ok(units.into_vec())
    }

    fn source_name(&self) -> &'static str {
        self.building
    }

    fn entry_points(&self) -> Vec<String> {
        self.floorplan_slugs
            .iter()
            .map(|slug| self.floorplan_url(slug))
            .collect()
    }
}

/// Parse every unit row on a rendered floorplan page
pub fn parse_floorplan_page(html: &str, building: &str, observed_at: &str) -> Result<Vec<UnitInfo>> {
    let document = Html::parse_document(html);
    let row_selector = selector(".table-card .unit-container")?;

    let mut units = Vec::new();
    for row in document.select(&row_selector) {
        match parse_unit_row(row, building, observed_at) {
            Ok(unit) => {
                debug!("Successfully parsed unit: {}", unit.unit);
                units.push(unit);
            }
            Err(e) => warn!("Error parsing unit row: {}", e),
        }
    }
    Ok(units)
}

fn parse_unit_row(row: ElementRef<'_>, building: &str, observed_at: &str) -> Result<UnitInfo> {
    let name = first_text(row, &selector(".td-card-name")?);
    let unit = name.rsplit('#').next().unwrap_or_default().trim().to_string();
    if unit.is_empty() {
        return Err(ScoutError::unit_parse(format!("row has no unit number: '{}'", name)).into());
    }

    let rent = first_text(row, &selector(".td-card-rent")?);
    let available = first_text(row, &selector(".td-card-available")?);

    // The section heading sits next to the row inside its parent
    let heading = selector(".floorplan-section h2")?;
    let floorplan = row
        .parent()
        .and_then(ElementRef::wrap)
        .map(|parent| first_text(parent, &heading))
        .unwrap_or_default();

    Ok(UnitInfo {
        unit,
        building: building.to_string(),
        size: 0,
        available_date: parse_availability_date(strip_available_prefix(&available)),
        floorplan_type: shorten_floorplan_type(&floorplan),
        prices: vec![parse_rent(&rent, observed_at)],
        ..Default::default()
    })
}

/// "$2,450" or "$2,450 to $2,600"
fn parse_rent(text: &str, observed_at: &str) -> PriceInfo {
    let parts: Vec<String> = text.split("to").map(|p| clean_price(p.trim())).collect();
    match parts.as_slice() {
        [single] => match single.parse::<i64>() {
            Ok(price) => PriceInfo::exact(price, observed_at),
            Err(_) => PriceInfo::undetermined(text, observed_at),
        },
        [low, high, ..] => PriceInfo::range(low, high, observed_at),
        [] => PriceInfo::undetermined(text, observed_at),
    }
}

fn strip_available_prefix(text: &str) -> &str {
    let trimmed = text.trim();
    match trimmed.get(..9) {
        Some(prefix) if prefix.eq_ignore_ascii_case("available") => trimmed[9..].trim(),
        _ => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::scripted::ScriptedFetcher;
    use crate::normalize::IMMEDIATE_DATE;
    use crate::scrapers::types::Pacing;

    const TS: &str = "2025-03-01 10:00:00";

    fn page(rows: &str) -> String {
        format!(
            r#"<html><body>
            <div class="table-card">
              <div class="floorplan-group">
                <div class="floorplan-section"><h2>1 Bedroom / 1 Bathroom</h2></div>
                {rows}
              </div>
            </div>
            </body></html>"#
        )
    }

    fn row(name: &str, rent: &str, available: &str) -> String {
        format!(
            r#"<div class="unit-container">
                 <div class="td-card-name">{name}</div>
                 <div class="td-card-rent">{rent}</div>
                 <div class="td-card-available">{available}</div>
               </div>"#
        )
    }

    #[test]
    fn parses_rows_with_section_heading() {
        let html = page(&(row("Residence #1205", "$3,450", "Available 04/01/2025")
            + &row("Residence #807", "$3,100 to $3,300", "Available Now")));

        let units = parse_floorplan_page(&html, "235Grand", TS).unwrap();
        assert_eq!(units.len(), 2);

        assert_eq!(units[0].unit, "1205");
        assert_eq!(units[0].building, "235Grand");
        assert_eq!(units[0].floorplan_type, "1b1b");
        assert_eq!(units[0].available_date, "2025-04-01");
        assert_eq!(units[0].prices[0].price, Some(3450));
        assert_eq!(units[0].prices[0].date_fetched, TS);

        assert_eq!(units[1].available_date, IMMEDIATE_DATE);
        assert_eq!(units[1].prices[0].price, None);
        assert_eq!(units[1].prices[0].price_range, "3100 - 3300");
    }

    #[test]
    fn row_without_unit_number_is_skipped() {
        let html = page(&(row("", "$3,450", "Available Now") + &row("#9", "$2,000", "")));
        let units = parse_floorplan_page(&html, "235Grand", TS).unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].unit, "9");
    }

    #[test]
    fn entry_points_cover_each_floorplan() {
        let scraper = KreScraper::grand235();
        assert_eq!(
            scraper.entry_points(),
            vec![
                "https://www.235grand.com/floorplans/studio",
                "https://www.235grand.com/floorplans/1-bedroom---1-bathroom",
                "https://www.235grand.com/floorplans/2-bedroom---2-bathroom",
            ]
        );
    }

    #[tokio::test]
    async fn failed_floorplan_does_not_stop_the_others() {
        let fetcher = ScriptedFetcher::new()
            .page(
                "https://www.235grand.com/floorplans/studio",
                &page(&row("Residence #301", "$2,900", "Available Now")),
            )
            .failing("https://www.235grand.com/floorplans/1-bedroom---1-bathroom")
            .page(
                "https://www.235grand.com/floorplans/2-bedroom---2-bathroom",
                &page(&row("Residence #2201", "$5,100", "Available 06/01/2025")),
            );
        let ctx = ScrapeContext::new(&fetcher, TS).with_pacing(Pacing::none());

        let units = KreScraper::grand235().scrape_units(&ctx).await.unwrap();
        let ids: Vec<&str> = units.iter().map(|u| u.unit.as_str()).collect();
        assert_eq!(ids, vec!["301", "2201"]);
        assert!(units.iter().all(|u| u.prices[0].date_fetched == TS));

        let navigations = fetcher.calls().iter().filter(|c| c.starts_with("navigate")).count();
        assert_eq!(navigations, 3);
    }

    #[tokio::test]
    async fn missing_table_skips_that_floorplan() {
        let fetcher = ScriptedFetcher::new().missing(".table-card");
        let ctx = ScrapeContext::new(&fetcher, TS).with_pacing(Pacing::none());
        assert!(KreScraper::grand235().scrape_units(&ctx).await.unwrap().is_empty());
    }
}
