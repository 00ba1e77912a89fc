//! 1 Grove publishes floorplan-level availability only, so units carry no number.

use std::sync::OnceLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use regex::Regex;
use scraper::{ElementRef, Html};
use tracing::{info, warn};

use crate::error::ScoutError;
use crate::models::{PriceInfo, UnitInfo};
use crate::normalize::{shorten_floorplan_type, IMMEDIATE_DATE};
use crate::scrapers::html::{absolute_url, first_text, selector, text_of};
use crate::scrapers::traits::ScraperTrait;
use crate::scrapers::types::ScrapeContext;

const SITE: &str = "https://onegrovejc.com";
const FLOORPLANS_URL: &str = "https://onegrovejc.com/floorplans/";
const FLOORPLANS_TAB: &str = "a[aria-controls='Floorplans']";
const CONTACT_US: &str = "Contact Us";

pub struct GroveScraper;

#[async_trait]
impl ScraperTrait for GroveScraper {
    async fn scrape_units(&self, ctx: &ScrapeContext<'_>) -> Result<Vec<UnitInfo>> {
        ctx.fetcher.navigate(FLOORPLANS_URL)?;
        ctx.pause().await;

        ctx.fetcher.click(FLOORPLANS_TAB, 0)?;
        ctx.pause().await;

        let body = ctx
            .fetcher
            .find_all("#jd-fp-body")?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("floorplan body #jd-fp-body not found"))?;

        let units = parse_floorplan_cards(&body.inner_html, &ctx.observed_at)?;
        info!("Found {} floorplans", units.len());
        Ok(units)
    }

    fn source_name(&self) -> &'static str {
        "1 Grove"
    }

    fn entry_points(&self) -> Vec<String> {
        vec![FLOORPLANS_URL.to_string()]
    }
}

/// One unit per floorplan card in the floorplan body markup
pub fn parse_floorplan_cards(html: &str, observed_at: &str) -> Result<Vec<UnitInfo>> {
    let fragment = Html::parse_fragment(html);
    let card_selector = selector(".jd-fp-floorplan-card")?;

    let mut units = Vec::new();
    for card in fragment.select(&card_selector) {
        match parse_card(card, observed_at) {
            Ok(unit) => units.push(unit),
            Err(e) => warn!("Error parsing floorplan card: {}", e),
        }
    }
    Ok(units)
}

fn parse_card(card: ElementRef<'_>, observed_at: &str) -> Result<UnitInfo> {
    let title = first_text(card, &selector(".jd-fp-card-info__title")?);

    let span_selector = selector("p.jd-fp-card-info__text span")?;
    let spans: Vec<String> = card.select(&span_selector).map(text_of).collect();
    let [bedroom, bath, size_text, ..] = spans.as_slice() else {
        return Err(ScoutError::unit_parse(format!("Not enough spans found for floorplan {}", title)).into());
    };

    let size = leading_number(size_text)
        .or_else(|| size_from_image(card))
        .filter(|size| *size > 0)
        .ok_or_else(|| ScoutError::unit_parse(format!("Could not parse size for floorplan {}", title)))?;

    let price_selector = selector(".jd-fp-strong-text")?;
    let price_text = card
        .select(&price_selector)
        .next()
        .map(text_of)
        .unwrap_or_else(|| CONTACT_US.to_string());
    let price = match parse_price(&price_text) {
        Some(price) => PriceInfo::exact(price, observed_at),
        None => PriceInfo::undetermined(&price_text, observed_at),
    };

    let floorplan_link = card
        .value()
        .attr("href")
        .filter(|href| !href.is_empty())
        .map(|href| absolute_url(SITE, href))
        .unwrap_or_default();

    let mut note_parts = vec![title.as_str(), bedroom.as_str(), bath.as_str()];
    if size_text.contains("Den") {
        note_parts.push(size_text.as_str());
    }

    Ok(UnitInfo {
        unit: String::new(),
        building: "1 Grove".to_string(),
        size,
        available_date: IMMEDIATE_DATE.to_string(),
        floorplan_type: shorten_floorplan_type(&format!("{} {}", bedroom, bath)),
        floorplan_link,
        floorplan_note: note_parts.join(" | "),
        prices: vec![price],
    })
}

fn leading_number(text: &str) -> Option<u32> {
    static NUMBER: OnceLock<Regex> = OnceLock::new();
    let number = NUMBER.get_or_init(|| Regex::new(r"(\d+)").expect("static regex"));
    number
        .captures(&text.replace(',', ""))
        .and_then(|caps| caps[1].parse().ok())
}

/// Size from the plan image's alt/title when the size span holds e.g. "Den"
fn size_from_image(card: ElementRef<'_>) -> Option<u32> {
    static SQUARE_FEET: OnceLock<Regex> = OnceLock::new();
    let square_feet =
        SQUARE_FEET.get_or_init(|| Regex::new(r"(\d+)\s*square feet").expect("static regex"));

    let img = card.select(&selector("img").ok()?).next()?;
    ["alt", "title"]
        .iter()
        .filter_map(|name| img.value().attr(name))
        .find_map(|text| {
            square_feet
                .captures(&text.replace(',', ""))
                .and_then(|caps| caps[1].parse().ok())
        })
}

/// `None` for "Contact Us" or anything without a dollar amount
fn parse_price(text: &str) -> Option<i64> {
    static AMOUNT: OnceLock<Regex> = OnceLock::new();
    if text.contains(CONTACT_US) {
        return None;
    }
    let amount = AMOUNT.get_or_init(|| Regex::new(r"\$?([\d,]+)").expect("static regex"));
    let stripped = text.replace("Base Rent", "");
    amount
        .captures(&stripped)
        .and_then(|caps| caps[1].replace(',', "").parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TS: &str = "2025-03-01 10:00:00";

    fn card(href: &str, spans: &[&str], price: Option<&str>, img: &str) -> String {
        let spans: String = spans.iter().map(|s| format!("<span>{s}</span>")).collect();
        let price = price
            .map(|p| format!(r#"<p class="jd-fp-strong-text">{p}</p>"#))
            .unwrap_or_default();
        format!(
            r#"<a class="jd-fp-floorplan-card" href="{href}">
                 {img}
                 <h3 class="jd-fp-card-info__title">A1</h3>
                 <p class="jd-fp-card-info__text">{spans}</p>
                 {price}
               </a>"#
        )
    }

    #[test]
    fn numeric_size_and_base_rent() {
        let html = card("/floorplans/a1", &["1 Bed", "1 Bath", "712 Sq. Ft."], Some("Base Rent $3,215"), "");
        let units = parse_floorplan_cards(&html, TS).unwrap();

        assert_eq!(units.len(), 1);
        let unit = &units[0];
        assert_eq!(unit.unit, "");
        assert_eq!(unit.size, 712);
        assert_eq!(unit.floorplan_type, "1b1b");
        assert_eq!(unit.available_date, IMMEDIATE_DATE);
        assert_eq!(unit.floorplan_link, "https://onegrovejc.com/floorplans/a1");
        assert_eq!(unit.floorplan_note, "A1 | 1 Bed | 1 Bath");
        assert_eq!(unit.prices[0].price, Some(3215));
        assert_eq!(unit.prices[0].price_range, "");
    }

    #[test]
    fn den_falls_back_to_image_text() {
        let img = r#"<img alt="Floorplan B2, 1,104 square feet" title="">"#;
        let html = card("", &["2 Bed", "2 Bath", "Den"], Some("From $4,050"), img);
        let units = parse_floorplan_cards(&html, TS).unwrap();

        assert_eq!(units[0].size, 1104);
        assert_eq!(units[0].floorplan_note, "A1 | 2 Bed | 2 Bath | Den");
        assert_eq!(units[0].prices[0].price, Some(4050));
    }

    #[test]
    fn contact_us_keeps_display_text() {
        let html = card("", &["Studio", "1 Bath", "480 Sq. Ft."], None, "");
        let units = parse_floorplan_cards(&html, TS).unwrap();

        assert_eq!(units[0].floorplan_type, "studio");
        assert_eq!(units[0].prices[0].price, None);
        assert_eq!(units[0].prices[0].price_range, "Contact Us");
    }

    #[test]
    fn cards_without_size_are_skipped() {
        let html = card("", &["2 Bed", "2 Bath", "Den"], None, "")
            + &card("", &["1 Bed", "1 Bath", "650"], None, "");
        let units = parse_floorplan_cards(&html, TS).unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].size, 650);
    }

    #[test]
    fn too_few_spans_are_skipped() {
        let html = card("", &["1 Bed"], None, "");
        assert!(parse_floorplan_cards(&html, TS).unwrap().is_empty());
    }
}
