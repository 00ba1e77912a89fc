//! Journal Squared serves availability from a JSON API guarded by a token
//! that is embedded in its leasing page.

use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use scraper::Html;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::ScoutError;
use crate::models::{PriceInfo, UnitInfo, UnitSet};
use crate::normalize::{parse_availability_date, shorten_floorplan_type};
use crate::scrapers::html::selector;
use crate::scrapers::traits::ScraperTrait;
use crate::scrapers::types::ScrapeContext;

const LEASING_URL: &str = "https://www.journalsquared.com/availability";
const API_URL: &str = "https://www.journalsquared.com/api/availability";
const TOKEN_ATTEMPTS: u32 = 3;
const TOKEN_BACKOFF: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
pub struct AvailabilityResponse {
    #[serde(default)]
    pub units: Vec<ApiUnit>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiUnit {
    #[serde(default)]
    pub unit_number: String,
    #[serde(default)]
    pub sqft: Option<u32>,
    #[serde(default)]
    pub available_date: String,
    #[serde(default)]
    pub floorplan: ApiFloorplan,
    #[serde(default)]
    pub rent: ApiRent,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiFloorplan {
    #[serde(default)]
    pub name: String,
    pub beds: Option<u32>,
    pub baths: Option<f32>,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiRent {
    pub min: Option<f64>,
    pub max: Option<f64>,
    #[serde(default)]
    pub display: String,
}

pub struct JournalSquaredScraper {
    client: Client,
    leasing_url: String,
    api_url: String,
    token_backoff: Duration,
}

impl JournalSquaredScraper {
    pub fn new() -> Result<Self> {
        Self::with_urls(LEASING_URL, API_URL)
    }

    pub fn with_urls(leasing_url: &str, api_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            leasing_url: leasing_url.to_string(),
            api_url: api_url.to_string(),
            token_backoff: TOKEN_BACKOFF,
        })
    }

    /// Wait between token attempts
    pub fn with_token_backoff(mut self, backoff: Duration) -> Self {
        self.token_backoff = backoff;
        self
    }

    /// The API token, with a fixed number of attempts
    async fn fetch_token(&self) -> Result<String> {
        let mut last_error = anyhow!("no attempt made");
        for attempt in 1..=TOKEN_ATTEMPTS {
            match self.try_fetch_token().await {
                Ok(token) => return Ok(token),
                Err(e) => {
                    warn!("Token attempt {}/{} failed: {:#}", attempt, TOKEN_ATTEMPTS, e);
                    last_error = e;
                }
            }
            if attempt < TOKEN_ATTEMPTS {
                tokio::time::sleep(self.token_backoff).await;
            }
        }
        Err(last_error.context("API token unavailable"))
    }

    async fn try_fetch_token(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.leasing_url)
            .send()
            .await
            .context("Failed to fetch leasing page")?;
        if !response.status().is_success() {
            return Err(ScoutError::Api {
                url: self.leasing_url.clone(),
                status: response.status().as_u16(),
            }
            .into());
        }
        let html = response.text().await.context("Failed to read leasing page")?;
        extract_token(&html)?.ok_or_else(|| anyhow!("leasing page carries no API token"))
    }
}

#[async_trait]
impl ScraperTrait for JournalSquaredScraper {
    async fn scrape_units(&self, ctx: &ScrapeContext<'_>) -> Result<Vec<UnitInfo>> {
        let token = self.fetch_token().await?;

        debug!("Fetching URL: {}", self.api_url);
        let response = self
            .client
            .get(&self.api_url)
            .bearer_auth(token)
            .send()
            .await
            .context("Failed to fetch availability API")?;

        if !response.status().is_success() {
            warn!("Availability API returned status: {}", response.status());
            return Err(ScoutError::Api {
                url: self.api_url.clone(),
                status: response.status().as_u16(),
            }
            .into());
        }

        let payload: AvailabilityResponse = response
            .json()
            .await
            .context("Availability API returned malformed JSON")?;

        let units = convert_units(payload, &ctx.observed_at);
        info!("Found {} units at Journal Squared", units.len());
        Ok(units)
    }

    fn source_name(&self) -> &'static str {
        "Journal Squared"
    }

    fn entry_points(&self) -> Vec<String> {
        vec![self.leasing_url.clone(), self.api_url.clone()]
    }
}

/// Token from `data-api-token` or an inline `"apiToken": "..."` script value
pub fn extract_token(html: &str) -> Result<Option<String>> {
    static INLINE: OnceLock<Regex> = OnceLock::new();

    let document = Html::parse_document(html);
    let holder = selector("[data-api-token]")?;
    if let Some(token) = document
        .select(&holder)
        .filter_map(|el| el.value().attr("data-api-token"))
        .map(str::trim)
        .find(|token| !token.is_empty())
    {
        return Ok(Some(token.to_string()));
    }

    let inline =
        INLINE.get_or_init(|| Regex::new(r#""apiToken"\s*:\s*"([^"]+)""#).expect("static regex"));
    Ok(inline.captures(html).map(|caps| caps[1].to_string()))
}

pub fn convert_units(payload: AvailabilityResponse, observed_at: &str) -> Vec<UnitInfo> {
    let mut units = UnitSet::new();
    for api_unit in payload.units {
        match convert_unit(api_unit, observed_at) {
            Ok(unit) => units.insert(unit),
            Err(e) => warn!("Skipping API unit: {}", e),
        }
    }
    units.into_vec()
}

fn convert_unit(api_unit: ApiUnit, observed_at: &str) -> Result<UnitInfo, ScoutError> {
    let unit = api_unit.unit_number.trim().to_string();
    if unit.is_empty() {
        return Err(ScoutError::unit_parse("unit without a number"));
    }

    let price = match (api_unit.rent.min, api_unit.rent.max) {
        (Some(min), Some(max)) if (max - min).abs() >= 1.0 => PriceInfo::range(
            &(min.round() as i64).to_string(),
            &(max.round() as i64).to_string(),
            observed_at,
        ),
        (Some(rent), _) | (None, Some(rent)) => PriceInfo::exact(rent.round() as i64, observed_at),
        (None, None) => PriceInfo::undetermined(&api_unit.rent.display, observed_at),
    };

    let floorplan = &api_unit.floorplan;
    let floorplan_type = match (floorplan.beds, floorplan.baths) {
        (Some(0), _) => "studio".to_string(),
        (Some(beds), Some(baths)) => shorten_floorplan_type(&format!("{} bed {} bath", beds, baths)),
        _ => shorten_floorplan_type(&floorplan.name),
    };

    Ok(UnitInfo {
        unit,
        building: "Journal Squared".to_string(),
        size: api_unit.sqft.unwrap_or(0),
        available_date: parse_availability_date(&api_unit.available_date),
        floorplan_type,
        floorplan_link: floorplan.url.clone(),
        floorplan_note: floorplan.name.clone(),
        prices: vec![price],
    })
}
