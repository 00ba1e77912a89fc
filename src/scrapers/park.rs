//! 18 Park lists units as cards grouped under floorplan sections.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::browser::PageElement;
use crate::error::ScoutError;
use crate::models::{PriceInfo, UnitInfo, UnitSet};
use crate::normalize::{clean_price, parse_availability_date, shorten_floorplan_type, IMMEDIATE_DATE};
use crate::scrapers::html::{first_text, root, selector, text_of};
use crate::scrapers::traits::ScraperTrait;
use crate::scrapers::types::ScrapeContext;

const FLOORPLANS_URL: &str = "https://www.18parkave.com/floorplans";
const CONTAINER: &str = ".floorplan-container";
const SECTION: &str = ".floorplan-section";
const BUILDING: &str = "18Park";

pub struct ParkAvenueScraper;

#[async_trait]
impl ScraperTrait for ParkAvenueScraper {
    async fn scrape_units(&self, ctx: &ScrapeContext<'_>) -> Result<Vec<UnitInfo>> {
        ctx.fetcher.navigate(FLOORPLANS_URL)?;
        ctx.pause().await;

        ctx.fetcher
            .wait_for(CONTAINER, Duration::from_secs(10))
            .context("Floorplans never loaded")?;

        let mut units = UnitSet::new();
        for section in ctx.fetcher.find_all(SECTION)? {
            match parse_section(&section, &ctx.observed_at) {
                Ok(found) => units.extend(found),
                Err(e) => warn!("Error processing floorplan section: {:#}", e),
            }
        }

        info!("Found {} units at 18 Park", units.len());
        Ok(units.into_vec())
    }

    fn source_name(&self) -> &'static str {
        BUILDING
    }

    fn entry_points(&self) -> Vec<String> {
        vec![FLOORPLANS_URL.to_string()]
    }
}

/// Every unit card in one floorplan section; bad cards are skipped
pub fn parse_section(section: &PageElement, observed_at: &str) -> Result<Vec<UnitInfo>> {
    let fragment = section.fragment();
    let scope = root(&fragment);
    let floorplan = first_text(scope, &selector(".floorplan-type")?);

    let card_selector = selector(".unit-card")?;
    let fields = CardSelectors::new()?;

    let mut units = Vec::new();
    for card in scope.select(&card_selector) {
        match fields.parse(card, &floorplan, observed_at) {
            Ok(unit) => {
                debug!("Successfully parsed unit: {}", unit.unit);
                units.push(unit);
            }
            Err(e) => warn!("Error parsing unit card: {}", e),
        }
    }
    Ok(units)
}

struct CardSelectors {
    unit: scraper::Selector,
    price: scraper::Selector,
    size: scraper::Selector,
    available: scraper::Selector,
}

impl CardSelectors {
    fn new() -> Result<Self> {
        Ok(Self {
            unit: selector(".unit-number")?,
            price: selector(".price")?,
            size: selector(".sqft")?,
            available: selector(".available-date")?,
        })
    }

    fn parse(&self, card: scraper::ElementRef<'_>, floorplan: &str, observed_at: &str) -> Result<UnitInfo, ScoutError> {
        let text = |sel: &scraper::Selector| card.select(sel).next().map(text_of).unwrap_or_default();

        let unit = text(&self.unit).replace("Unit ", "").trim().to_string();
        if unit.is_empty() {
            return Err(ScoutError::unit_parse("card has no unit number"));
        }

        let raw_price = text(&self.price);
        let price = match clean_price(raw_price.trim()).parse::<i64>() {
            Ok(price) => PriceInfo::exact(price, observed_at),
            Err(_) => PriceInfo::undetermined(raw_price.trim(), observed_at),
        };

        let raw_size = text(&self.size);
        let size = raw_size
            .to_lowercase()
            .replace("sq ft", "")
            .replace(',', "")
            .trim()
            .parse::<u32>()
            .unwrap_or(0);

        Ok(UnitInfo {
            unit,
            building: BUILDING.to_string(),
            size,
            available_date: available_date(&text(&self.available)),
            floorplan_type: shorten_floorplan_type(floorplan),
            prices: vec![price],
            ..Default::default()
        })
    }
}

/// "Available 04/01/2025" or "Available Now"
fn available_date(text: &str) -> String {
    let lower = text.to_lowercase();
    if lower.contains("now") {
        return IMMEDIATE_DATE.to_string();
    }
    parse_availability_date(lower.replace("available", "").trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::scripted::ScriptedFetcher;
    use crate::scrapers::types::Pacing;

    const TS: &str = "2025-03-01 10:00:00";

    fn card(unit: &str, price: &str, sqft: &str, available: &str) -> String {
        format!(
            r#"<div class="unit-card">
                 <span class="unit-number">{unit}</span>
                 <span class="price">{price}</span>
                 <span class="sqft">{sqft}</span>
                 <span class="available-date">{available}</span>
               </div>"#
        )
    }

    fn section(floorplan: &str, cards: &[String]) -> PageElement {
        PageElement {
            inner_html: format!(r#"<h3 class="floorplan-type">{}</h3>{}"#, floorplan, cards.concat()),
            ..Default::default()
        }
    }

    #[test]
    fn parses_unit_cards_with_size() {
        let el = section(
            "1 Bedroom / 1 Bath",
            &[
                card("Unit 1204", "$3,150", "702 sq ft", "Available 04/01/2025"),
                card("Unit 310", "Call", "1,015 sq ft", "Available Now"),
            ],
        );
        let units = parse_section(&el, TS).unwrap();
        assert_eq!(units.len(), 2);

        assert_eq!(units[0].unit, "1204");
        assert_eq!(units[0].building, "18Park");
        assert_eq!(units[0].size, 702);
        assert_eq!(units[0].floorplan_type, "1b1b");
        assert_eq!(units[0].available_date, "2025-04-01");
        assert_eq!(units[0].prices[0].price, Some(3150));

        assert_eq!(units[1].size, 1015);
        assert_eq!(units[1].available_date, IMMEDIATE_DATE);
        assert_eq!(units[1].prices[0].price, None);
        assert_eq!(units[1].prices[0].price_range, "Call");
    }

    #[test]
    fn card_without_number_is_skipped() {
        let el = section("Studio", &[card("", "$2,000", "450 sq ft", ""), card("Unit 5", "$2,100", "", "")]);
        let units = parse_section(&el, TS).unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].unit, "5");
        assert_eq!(units[0].size, 0);
        assert_eq!(units[0].floorplan_type, "studio");
    }

    #[tokio::test]
    async fn scrapes_every_section() {
        let fetcher = ScriptedFetcher::new().elements(
            SECTION,
            vec![
                section("Studio", &[card("Unit 101", "$2,400", "480 sq ft", "Available Now")]),
                section("2 Bed / 2 Bath", &[card("Unit 902", "$4,800", "1,120 sq ft", "Available 05/01/2025")]),
            ],
        );
        let ctx = ScrapeContext::new(&fetcher, TS).with_pacing(Pacing::none());

        let units = ParkAvenueScraper.scrape_units(&ctx).await.unwrap();
        assert_eq!(units.len(), 2);
        assert_eq!(units[1].unit, "902");
        assert_eq!(units[1].floorplan_type, "2b2b");
        assert_eq!(fetcher.calls()[0], format!("navigate {}", FLOORPLANS_URL));
    }

    #[tokio::test]
    async fn missing_container_fails_the_source() {
        let fetcher = ScriptedFetcher::new().missing(CONTAINER);
        let ctx = ScrapeContext::new(&fetcher, TS).with_pacing(Pacing::none());
        assert!(ParkAvenueScraper.scrape_units(&ctx).await.is_err());
    }
}
