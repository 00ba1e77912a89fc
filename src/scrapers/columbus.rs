//! Columbus 579: three Ironstate buildings, each with per-floorplan unit carousels.
//!
//! Unit slides render in one of two layouts. The rendered text is normally
//! four lines; some slides only make sense from their markup, which strips
//! down to five or six lines.

use anyhow::Result;
use async_trait::async_trait;
use scraper::Html;
use tracing::{debug, error, info};

use crate::browser::PageElement;
use crate::error::ScoutError;
use crate::models::{PriceInfo, UnitInfo, UnitSet};
use crate::normalize::{clean_price, parse_availability_date, shorten_floorplan_type, IMMEDIATE_DATE};
use crate::scrapers::html::{absolute_url, selector, strip_tags};
use crate::scrapers::traits::ScraperTrait;
use crate::scrapers::types::ScrapeContext;

const SITE: &str = "https://ironstate.com";
const BUILDING_URLS: &[&str] = &[
    "https://ironstate.com/property/50-columbus",
    "https://ironstate.com/property/70-columbus",
    "https://ironstate.com/property/90-columbus",
];

pub struct ColumbusScraper;

impl ColumbusScraper {
    async fn floorplan_urls(&self, ctx: &ScrapeContext<'_>, building_url: &str) -> Result<Vec<String>> {
        let url = format!("{}#floor-plans-property", building_url);
        debug!("Fetching floorplans from {}", url);

        ctx.fetcher.navigate(&url)?;
        ctx.pause().await;

        let boxes = ctx.fetcher.find_all("div.floorplans-widget__box")?;
        debug!("Found {} floorplan boxes", boxes.len());

        let mut urls = Vec::new();
        for widget in &boxes {
            urls.extend(floorplan_links(&widget.inner_html)?);
        }
        Ok(urls)
    }

    async fn units_in_floorplan(
        &self,
        ctx: &ScrapeContext<'_>,
        floorplan_url: &str,
        building: &str,
        units: &mut UnitSet,
    ) -> Result<()> {
        ctx.fetcher.navigate(&format!("{}#units", floorplan_url))?;
        ctx.pause().await;

        let slides = ctx.fetcher.find_all("article.splide__slide")?;
        debug!("Found {} unit elements", slides.len());

        for slide in &slides {
            match parse_unit_slide(slide, &ctx.observed_at) {
                Ok(mut unit) => {
                    unit.building = building.to_string();
                    debug!("Successfully parsed unit: {}", unit.unit);
                    units.insert(unit);
                }
                Err(e) => error!("Error parsing unit element: {}", e),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ScraperTrait for ColumbusScraper {
    async fn scrape_units(&self, ctx: &ScrapeContext<'_>) -> Result<Vec<UnitInfo>> {
        info!("Starting Columbus units scraping");
        let mut units = Vec::new();

        for &building_url in BUILDING_URLS {
            let building = building_url.rsplit('/').next().unwrap_or(building_url);
            info!("Processing building: {}", building);

            // Unit numbers repeat across buildings, so dedup stays within one
            let mut building_units = UnitSet::new();

            let floorplans = match self.floorplan_urls(ctx, building_url).await {
                Ok(urls) => urls,
                Err(e) => {
                    error!("Error processing building {}: {:#}", building, e);
                    continue;
                }
            };

            for floorplan_url in &floorplans {
                if let Err(e) = self
                    .units_in_floorplan(ctx, floorplan_url, building, &mut building_units)
                    .await
                {
                    error!("Error processing floorplan {}: {:#}", floorplan_url, e);
                }
            }
            units.extend(building_units.into_vec());
        }

        info!("Found {} units in total", units.len());
        Ok(units)
    }

    fn source_name(&self) -> &'static str {
        "Columbus 579"
    }

    fn entry_points(&self) -> Vec<String> {
        BUILDING_URLS.iter().map(|u| u.to_string()).collect()
    }
}

/// Floorplan page links inside one widget box
pub fn floorplan_links(box_html: &str) -> Result<Vec<String>> {
    let fragment = Html::parse_fragment(box_html);
    let link = selector("a[href]")?;
    Ok(fragment
        .select(&link)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| href.contains("/floorplan/"))
        .map(|href| absolute_url(SITE, href))
        .collect())
}

/// Which slide layout produced a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingLayout {
    FourLine,
    FiveLineMarkup,
    SixLineMarkup,
}

/// Fields of one slide before cleanup
#[derive(Debug, Clone, PartialEq)]
pub struct RawListing {
    pub availability: String,
    pub unit: String,
    pub price: String,
    pub size: String,
    pub floorplan: String,
}

/// "Available 03/15/2025" / "Unit 1205" / "$3,450 750 sq. ft. 1 Bed / 1 Bath" / trailer
fn parse_four_line(text: &str) -> Option<RawListing> {
    let lines: Vec<&str> = text.split('\n').collect();
    let [availability, unit_line, price_size_type, _] = lines.as_slice() else {
        return None;
    };
    let (price, size_type) = price_size_type.split_once(' ')?;
    let (size, floorplan) = size_type.split_once(" sq. ft. ")?;
    if floorplan.contains(" sq. ft. ") {
        return None;
    }
    let unit = unit_line.split(' ').nth(1)?;

    Some(RawListing {
        availability: availability.to_string(),
        unit: unit.to_string(),
        price: price.to_string(),
        size: size.to_string(),
        floorplan: floorplan.to_string(),
    })
}

fn parse_markup(inner_html: &str) -> Option<(ListingLayout, RawListing)> {
    let stripped = strip_tags(inner_html.trim());
    let values: Vec<&str> = stripped
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    match values.as_slice() {
        [availability_unit, price, size, floorplan, _] => {
            let lower = availability_unit.to_lowercase();
            let (availability, unit) = lower.split_once("unit")?;
            if unit.contains("unit") {
                return None;
            }
            Some((
                ListingLayout::FiveLineMarkup,
                RawListing {
                    availability: availability.trim().to_string(),
                    unit: unit.trim().to_string(),
                    price: price.to_string(),
                    size: size.to_string(),
                    floorplan: floorplan.to_string(),
                },
            ))
        }
        [availability, unit, price, size, floorplan, _] => Some((
            ListingLayout::SixLineMarkup,
            RawListing {
                availability: availability.to_string(),
                unit: unit.to_string(),
                price: price.to_string(),
                size: size.to_string(),
                floorplan: floorplan.to_string(),
            },
        )),
        _ => None,
    }
}

/// Try the rendered-text layout, then the markup layouts
pub fn read_listing(slide: &PageElement) -> Result<(ListingLayout, RawListing), ScoutError> {
    if let Some(raw) = parse_four_line(&slide.text) {
        return Ok((ListingLayout::FourLine, raw));
    }
    debug!("First format parsing failed, trying alternative format");
    parse_markup(&slide.inner_html)
        .ok_or_else(|| ScoutError::unit_parse("slide matches neither the text nor the markup layout"))
}

pub fn parse_unit_slide(slide: &PageElement, observed_at: &str) -> Result<UnitInfo, ScoutError> {
    let (layout, raw) = read_listing(slide)?;
    debug!("Parsed unit {} using {:?} layout", raw.unit, layout);

    let available_date = if raw.availability.to_lowercase().contains("now") {
        IMMEDIATE_DATE.to_string()
    } else {
        let date = raw
            .availability
            .split(' ')
            .nth(1)
            .ok_or_else(|| ScoutError::unit_parse(format!("no date in '{}'", raw.availability)))?;
        parse_availability_date(date)
    };

    let unit = raw.unit.to_lowercase().replace("unit", "").trim().to_string();
    let size_text = raw.size.to_lowercase().replace("sq. ft.", "").replace(',', "");
    let size = size_text
        .trim()
        .parse::<u32>()
        .map_err(|_| ScoutError::unit_parse(format!("bad size '{}'", raw.size)))?;
    let price = clean_price(raw.price.trim())
        .parse::<i64>()
        .map_err(|_| ScoutError::unit_parse(format!("bad price '{}'", raw.price)))?;

    Ok(UnitInfo {
        unit,
        size,
        available_date,
        floorplan_type: shorten_floorplan_type(&raw.floorplan),
        prices: vec![PriceInfo::exact(price, observed_at)],
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::scripted::ScriptedFetcher;
    use crate::scrapers::types::Pacing;

    const TS: &str = "2025-03-01 10:00:00";

    fn slide(text: &str, inner_html: &str) -> PageElement {
        PageElement {
            text: text.to_string(),
            inner_html: inner_html.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn four_line_text_layout() {
        let el = slide(
            "Available 03/15/2025\nUnit 1205\n$3,450 750 sq. ft. 1 Bed / 1 Bath\nView Details",
            "",
        );
        let (layout, _) = read_listing(&el).unwrap();
        assert_eq!(layout, ListingLayout::FourLine);

        let unit = parse_unit_slide(&el, TS).unwrap();
        assert_eq!(unit.unit, "1205");
        assert_eq!(unit.size, 750);
        assert_eq!(unit.available_date, "2025-03-15");
        assert_eq!(unit.floorplan_type, "1b1b");
        assert_eq!(unit.prices[0].price, Some(3450));
        assert_eq!(unit.building, "");
    }

    #[test]
    fn five_line_markup_layout() {
        let html = r#"
            <p>Available Now Unit 804</p>
            <p>$2,995</p>
            <p>612 sq. ft.</p>
            <p>Studio</p>
            <a>Apply</a>"#;
        let el = slide("Available Now Unit 804\n$2,995", html);

        let (layout, raw) = read_listing(&el).unwrap();
        assert_eq!(layout, ListingLayout::FiveLineMarkup);
        assert_eq!(raw.unit, "804");

        let unit = parse_unit_slide(&el, TS).unwrap();
        assert_eq!(unit.available_date, IMMEDIATE_DATE);
        assert_eq!(unit.size, 612);
        assert_eq!(unit.floorplan_type, "studio");
        assert_eq!(unit.prices[0].price, Some(2995));
    }

    #[test]
    fn six_line_markup_layout() {
        let html = r#"
            <span>Available 05/01/2025</span>
            <span>Unit 2210</span>
            <span>$4,120</span>
            <span>1,050 sq. ft.</span>
            <span>2 Bed / 2 Bath</span>
            <a>Apply</a>"#;
        let el = slide("", html);

        let unit = parse_unit_slide(&el, TS).unwrap();
        assert_eq!(unit.unit, "2210");
        assert_eq!(unit.size, 1050);
        assert_eq!(unit.available_date, "2025-05-01");
        assert_eq!(unit.floorplan_type, "2b2b");
    }

    #[test]
    fn neither_layout_is_an_error() {
        let el = slide("just one line", "<p>one</p><p>two</p>");
        assert!(matches!(read_listing(&el), Err(ScoutError::UnitParse(_))));
    }

    #[test]
    fn unparsable_price_drops_the_listing() {
        let el = slide(
            "Available Now\nUnit 3\nCall 500 sq. ft. Studio\nView",
            "",
        );
        assert!(parse_unit_slide(&el, TS).is_err());
    }

    #[test]
    fn links_are_filtered_and_absolutized() {
        let html = r#"<a href="/floorplan/a1">A1</a><a href="/contact">x</a>
                      <a href="https://ironstate.com/floorplan/b2">B2</a>"#;
        assert_eq!(
            floorplan_links(html).unwrap(),
            vec![
                "https://ironstate.com/floorplan/a1",
                "https://ironstate.com/floorplan/b2",
            ]
        );
    }

    fn widget(href: &str) -> PageElement {
        slide("", &format!(r#"<a href="{}">Floorplan</a>"#, href))
    }

    fn listing(unit: &str, price: &str) -> PageElement {
        slide(
            &format!("Available Now\nUnit {}\n{} 700 sq. ft. 1 Bed / 1 Bath\nView Details", unit, price),
            "",
        )
    }

    #[tokio::test]
    async fn units_take_their_building_from_the_url() {
        let fetcher = ScriptedFetcher::new()
            .elements_at(
                "https://ironstate.com/property/50-columbus#floor-plans-property",
                "div.floorplans-widget__box",
                vec![widget("/floorplan/a1")],
            )
            .elements_at(
                "https://ironstate.com/property/70-columbus#floor-plans-property",
                "div.floorplans-widget__box",
                vec![widget("/floorplan/b1")],
            )
            .failing("https://ironstate.com/property/90-columbus#floor-plans-property")
            .elements_at(
                "https://ironstate.com/floorplan/a1#units",
                "article.splide__slide",
                vec![listing("1205", "$3,450"), listing("1205", "$3,500"), listing("806", "$3,100")],
            )
            .elements_at(
                "https://ironstate.com/floorplan/b1#units",
                "article.splide__slide",
                vec![listing("1205", "$3,700")],
            );
        let ctx = ScrapeContext::new(&fetcher, TS).with_pacing(Pacing::none());

        let units = ColumbusScraper.scrape_units(&ctx).await.unwrap();
        let seen: Vec<(&str, &str, Option<i64>)> = units
            .iter()
            .map(|u| (u.building.as_str(), u.unit.as_str(), u.prices[0].price))
            .collect();
        assert_eq!(
            seen,
            vec![
                ("50-columbus", "1205", Some(3500)),
                ("50-columbus", "806", Some(3100)),
                ("70-columbus", "1205", Some(3700)),
            ]
        );
    }
}
