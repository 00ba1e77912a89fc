//! Haus25 loads each floorplan's units over admin-ajax when its card is clicked.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::browser::{AjaxInterceptor, ResponseShape};
use crate::error::ScoutError;
use crate::models::{PriceInfo, UnitInfo, UnitSet};
use crate::normalize::{parse_availability_date, shorten_floorplan_type};
use crate::scrapers::traits::ScraperTrait;
use crate::scrapers::types::ScrapeContext;

const PROPERTY_URL: &str = "https://verisresidential.com/jersey-city-nj-apartments/haus25/";
const VIEW_ALL: &str = "p.prop-details-search-view-all";
const MODAL: &str = "div.wp-block-group.view-all-modal-content";
const FLOORPLAN_CARDS: &str =
    "div.wp-block-group.view-all-modal-content div[class*='display-floorplan-details']";
const AJAX_KEYWORD: &str = "admin-ajax.php";
// The availability widget renders well after load
const WIDGET_SETTLE: Duration = Duration::from_secs(10);

pub struct Haus25Scraper {
    interceptor: AjaxInterceptor,
}

impl Haus25Scraper {
    pub fn new() -> Self {
        Self {
            interceptor: AjaxInterceptor::new(
                AJAX_KEYWORD,
                ResponseShape::new(
                    &["property_title", "floorplan_name", "beds", "baths", "sqft"],
                    "query_response",
                ),
            ),
        }
    }

    pub fn with_interceptor(interceptor: AjaxInterceptor) -> Self {
        Self { interceptor }
    }

    /// Open the "view all" modal and count its floorplan cards
    async fn open_floorplans(&self, ctx: &ScrapeContext<'_>) -> Result<usize> {
        ctx.fetcher.navigate(PROPERTY_URL)?;
        ctx.pause().await;

        ctx.fetcher.evaluate("window.scrollBy(0, window.innerHeight);")?;
        ctx.pause().await;
        ctx.settle(WIDGET_SETTLE).await;

        ctx.fetcher.click(VIEW_ALL, 0).context("View all button missing")?;
        ctx.fetcher
            .wait_for(MODAL, Duration::from_secs(10))
            .context("Could not find the view-all-modal-content div")?;
        debug!("Found the view-all-modal-content div.");

        Ok(ctx.fetcher.find_all(FLOORPLAN_CARDS)?.len())
    }
}

impl Default for Haus25Scraper {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScraperTrait for Haus25Scraper {
    async fn scrape_units(&self, ctx: &ScrapeContext<'_>) -> Result<Vec<UnitInfo>> {
        let card_count = self.open_floorplans(ctx).await?;
        info!("Found {} Haus25 floorplans", card_count);

        let mut units = UnitSet::new();
        for index in 0..card_count {
            let captured = self
                .interceptor
                .capture(ctx.fetcher, || ctx.fetcher.click(FLOORPLAN_CARDS, index))
                .await;

            // Close whatever overlay the click opened before the next card
            if let Err(e) = ctx.fetcher.evaluate("document.elementFromPoint(0, 0).click();") {
                debug!("Overlay dismiss failed: {:#}", e);
            }

            match captured {
                Ok(Some(response)) => units.extend(parse_floorplan_json(&response, &ctx.observed_at)),
                Ok(None) => warn!("No availability response for floorplan {}", index),
                Err(e) => warn!("Could not open floorplan {}: {:#}", index, e),
            }
        }

        Ok(units.into_vec())
    }

    fn source_name(&self) -> &'static str {
        "Haus25"
    }

    fn entry_points(&self) -> Vec<String> {
        vec![PROPERTY_URL.to_string()]
    }
}

/// Units from one floorplan's admin-ajax payload
pub fn parse_floorplan_json(response: &Value, observed_at: &str) -> Vec<UnitInfo> {
    let Some(floorplan) = response.as_object() else {
        warn!("Floorplan response is not an object");
        return Vec::new();
    };

    let building = field_text(response, "property_title");
    let beds = field_text(response, "beds");
    let baths = field_text(response, "baths");
    let floorplan_name = field_text(response, "floorplan_name");
    let image = field_text(response, "image");
    let size = field_text(response, "sqft").parse::<u32>().unwrap_or(0);

    let floorplan_type = if beds == "0" {
        "studio".to_string()
    } else if !beds.is_empty() && !baths.is_empty() {
        shorten_floorplan_type(&format!("{} bed, {} bath", beds, baths))
    } else {
        String::new()
    };

    let Some(records) = floorplan.get("query_response").and_then(Value::as_array) else {
        return Vec::new();
    };

    records
        .iter()
        .filter_map(|record| match parse_unit_record(record, observed_at) {
            Ok((unit, available_date, price)) => Some(UnitInfo {
                unit,
                building: building.clone(),
                size,
                available_date,
                floorplan_type: floorplan_type.clone(),
                floorplan_link: image.clone(),
                floorplan_note: format!("Floorplan: {}", floorplan_name),
                prices: vec![price],
            }),
            Err(e) => {
                warn!("Error parsing unit data: {}", e);
                None
            }
        })
        .collect()
}

fn parse_unit_record(record: &Value, observed_at: &str) -> Result<(String, String, PriceInfo), ScoutError> {
    if !record.is_object() {
        return Err(ScoutError::unit_parse("unit entry is not an object"));
    }
    let unit = field_text(record, "the_title");
    if unit.is_empty() {
        return Err(ScoutError::unit_parse("unit entry has no title"));
    }

    let rent = field_text(record, "ra_rent");
    let price = match rent.parse::<f64>() {
        Ok(value) => PriceInfo::exact(value as i64, observed_at),
        Err(_) => PriceInfo::undetermined(&rent, observed_at),
    };

    let available = parse_availability_date(&field_text(record, "ra_date_available"));
    Ok((unit, available, price))
}

/// String or number field as trimmed text, empty when absent
fn field_text(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}
