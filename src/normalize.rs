//! String normalization shared by every scraper.

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use tracing::warn;

/// Stored for "available now" and for dates that cannot be parsed.
pub const IMMEDIATE_DATE: &str = "1970-01-01";

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const IMMEDIATE_PHRASES: &[&str] = &[
    "available",
    "available now",
    "now",
    "immediate",
    "today",
    "asap",
    "available immediately",
    "move-in ready",
];

// Tried in order, first hit wins. `four_digit_year` rejects the short-year
// reading of a format so "03/15/25" falls through to the `%y` variants.
const DATE_FORMATS: &[(&str, bool)] = &[
    ("%m/%d/%Y", true),
    ("%Y-%m-%d", true),
    ("%m-%d-%Y", true),
    ("%d/%m/%Y", true),
    ("%Y/%m/%d", true),
    ("%B %d, %Y", true),
    ("%b %d, %Y", true),
    ("%m/%d/%y", false),
    ("%m-%d-%y", false),
];

/// Strip `$` and thousands separators: `"$2,450"` -> `"2450"`
pub fn clean_price(text: &str) -> String {
    text.replace([',', '$'], "")
}

/// Shorten a floorplan label to a code like `1b1b` or `studio`
pub fn shorten_floorplan_type(text: &str) -> String {
    let lower = text.to_lowercase();
    if lower.contains("studio") {
        return "studio".to_string();
    }
    // Whole words go before the bare `s` so "bedrooms" does not leave stray letters.
    lower
        .replace("bathroom", "b")
        .replace("bedroom", "b")
        .replace("bath", "b")
        .replace("bed", "b")
        .replace(['s', ' ', ',', '/'], "")
}

/// Normalize an availability string to `YYYY-MM-DD`.
///
/// Blank input, "available now" phrases and anything unparsable map to
/// [`IMMEDIATE_DATE`]. This never fails.
pub fn parse_availability_date(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return IMMEDIATE_DATE.to_string();
    }

    let lower = trimmed.to_lowercase();
    if IMMEDIATE_PHRASES.contains(&lower.as_str()) {
        return IMMEDIATE_DATE.to_string();
    }

    match parse_date(trimmed) {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => {
            warn!(
                "Could not parse date '{}', treating as immediate availability",
                trimmed
            );
            IMMEDIATE_DATE.to_string()
        }
    }
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    DATE_FORMATS.iter().find_map(|(format, four_digit_year)| {
        NaiveDate::parse_from_str(text, format)
            .ok()
            .filter(|date| !four_digit_year || date.year() >= 1000)
    })
}

pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Wall-clock `YYYY-MM-DD HH:MM:SS`, read at call time
pub fn current_timestamp() -> String {
    format_timestamp(SystemClock.now())
}

/// Source of "observed at" times, swappable in tests
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
