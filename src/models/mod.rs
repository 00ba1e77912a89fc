use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One observed price for a unit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceInfo {
    /// Monthly rent in whole dollars, `None` when only a range or "contact us" is published
    pub price: Option<i64>,
    /// Free-text "low - high" or display text when no single price is determinable
    pub price_range: String,
    /// `YYYY-MM-DD HH:MM:SS`
    pub date_fetched: String,
}

impl PriceInfo {
    pub fn exact(price: i64, date_fetched: &str) -> Self {
        Self {
            price: Some(price),
            price_range: String::new(),
            date_fetched: date_fetched.to_string(),
        }
    }

    pub fn range(low: &str, high: &str, date_fetched: &str) -> Self {
        Self {
            price: None,
            price_range: format!("{} - {}", low, high),
            date_fetched: date_fetched.to_string(),
        }
    }

    /// Price that could not be turned into a number; the display text is kept verbatim
    pub fn undetermined(display: &str, date_fetched: &str) -> Self {
        Self {
            price: None,
            price_range: display.to_string(),
            date_fetched: date_fetched.to_string(),
        }
    }
}

/// Core availability record every scraper produces
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UnitInfo {
    pub unit: String,
    pub building: String,
    /// Square feet, 0 when unknown
    pub size: u32,
    /// Always `YYYY-MM-DD`
    pub available_date: String,
    pub floorplan_type: String,
    pub floorplan_link: String,
    pub floorplan_note: String,
    pub prices: Vec<PriceInfo>,
}

/// Per-run collection of units for one source.
///
/// Units with an id are keyed by it and a later observation replaces the
/// earlier one in place. Floorplan-level entries (empty id) are all kept.
#[derive(Debug, Default)]
pub struct UnitSet {
    keyed: IndexMap<String, UnitInfo>,
    anonymous: Vec<UnitInfo>,
}

impl UnitSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, unit: UnitInfo) {
        if unit.unit.is_empty() {
            self.anonymous.push(unit);
        } else {
            self.keyed.insert(unit.unit.clone(), unit);
        }
    }

    pub fn len(&self) -> usize {
        self.keyed.len() + self.anonymous.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_vec(self) -> Vec<UnitInfo> {
        self.keyed.into_values().chain(self.anonymous).collect()
    }
}

impl Extend<UnitInfo> for UnitSet {
    fn extend<T: IntoIterator<Item = UnitInfo>>(&mut self, iter: T) {
        for unit in iter {
            self.insert(unit);
        }
    }
}

/// Units keyed by scraper name, in the order the scrapers ran
pub type RunResults = IndexMap<String, Vec<UnitInfo>>;
