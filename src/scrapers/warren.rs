use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{info, warn};

use crate::browser::PageElement;
use crate::error::ScoutError;
use crate::models::{PriceInfo, UnitInfo, UnitSet};
use crate::normalize::{parse_availability_date, shorten_floorplan_type};
use crate::scrapers::html::{first_attr, first_text, root, selector};
use crate::scrapers::traits::ScraperTrait;
use crate::scrapers::types::ScrapeContext;

const FLOORPLANS_URL: &str =
    "https://www.windsorcommunities.com/properties/warren-at-york-by-windsor/floorplans/";
const COOKIE_BUTTON: &str = "#onetrust-accept-btn-handler";
const UNIT_SELECTOR: &str = ".spaces__unit";

/// Warren at York scraper
pub struct WarrenAtYorkScraper;

impl WarrenAtYorkScraper {
    /// Best effort: a missing banner never stops the scrape
    async fn dismiss_cookie_banner(&self, ctx: &ScrapeContext<'_>) {
        let accepted = ctx
            .fetcher
            .wait_for(COOKIE_BUTTON, Duration::from_secs(5))
            .and_then(|_| ctx.fetcher.click(COOKIE_BUTTON, 0));
        match accepted {
            Ok(()) => ctx.pause().await,
            Err(e) => warn!("Cookie button not found or timed out: {:#}", e),
        }
    }
}

#[async_trait]
impl ScraperTrait for WarrenAtYorkScraper {
    async fn scrape_units(&self, ctx: &ScrapeContext<'_>) -> Result<Vec<UnitInfo>> {
        ctx.fetcher.navigate(FLOORPLANS_URL)?;
        ctx.pause().await;

        self.dismiss_cookie_banner(ctx).await;

        ctx.fetcher
            .wait_for(UNIT_SELECTOR, Duration::from_secs(10))
            .context("Unit list never loaded")?;

        let mut units = UnitSet::new();
        for element in ctx.fetcher.find_all(UNIT_SELECTOR)? {
            match parse_unit(&element, &ctx.observed_at) {
                Ok(unit) => units.insert(unit),
                Err(e) => warn!("Error parsing unit: {}", e),
            }
        }

        info!("Found {} units at Warren at York", units.len());
        Ok(units.into_vec())
    }

    fn source_name(&self) -> &'static str {
        "Warren at York"
    }

    fn entry_points(&self) -> Vec<String> {
        vec![FLOORPLANS_URL.to_string()]
    }
}

/// Build a unit from one `.spaces__unit` card
pub fn parse_unit(element: &PageElement, observed_at: &str) -> Result<UnitInfo, ScoutError> {
    let unit = element
        .attr("data-spaces-unit")
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ScoutError::unit_parse("card has no data-spaces-unit"))?
        .to_string();

    let fragment = element.fragment();
    let scope = root(&fragment);
    let css = |s: &str| selector(s).map_err(|e| ScoutError::unit_parse(e.to_string()));

    let raw_rent = first_attr(
        scope,
        &css(".spaces__label-price a[data-spaces-unit-price]")?,
        "data-spaces-unit-price",
    )
    .unwrap_or_default();
    let raw_available = first_text(scope, &css(".spaces__label-available-on")?);
    let raw_area = first_text(scope, &css(".spaces__plan__attributes-area")?);

    let size = raw_area
        .split_whitespace()
        .next()
        .and_then(|s| s.replace(',', "").parse::<u32>().ok())
        .unwrap_or(0);

    let price = match raw_rent.trim().parse::<f64>() {
        Ok(rent) => PriceInfo::exact(rent.round() as i64, observed_at),
        Err(_) => PriceInfo::undetermined(raw_rent.trim(), observed_at),
    };

    Ok(UnitInfo {
        unit,
        building: "Warren at York".to_string(),
        size,
        available_date: parse_availability_date(&availability_text(&raw_available)),
        floorplan_type: shorten_floorplan_type(
            element.attr("data-spaces-sort-plan-name").unwrap_or_default(),
        ),
        prices: vec![price],
        ..Default::default()
    })
}

/// "Available on Wed, March 5, 2025" -> "March 5, 2025"
fn availability_text(label: &str) -> String {
    let mut text = label.trim();
    for prefix in ["available on", "available"] {
        if let Some(head) = text.get(..prefix.len()) {
            if head.eq_ignore_ascii_case(prefix) {
                text = text[prefix.len()..].trim();
                break;
            }
        }
    }
    // Leading weekday
    if text.matches(',').count() >= 2 {
        if let Some((_, rest)) = text.split_once(',') {
            return rest.trim().to_string();
        }
    }
    text.to_string()
}
