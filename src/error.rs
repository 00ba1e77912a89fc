use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoutError {
    /// One listing did not match the expected shape; the listing is dropped
    #[error("unit parse error: {0}")]
    UnitParse(String),

    #[error("scraper '{name}' does not satisfy the scraper contract: {reason}")]
    NonConformingScraper { name: String, reason: String },

    #[error("invalid scraper name '{0}': names must be non-empty and contain no whitespace")]
    InvalidScraperName(String),

    #[error("could not acquire a browser session after {attempts} attempts: {source}")]
    SessionAcquisition {
        attempts: u32,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to write results to {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("API request to {url} returned status {status}")]
    Api { url: String, status: u16 },
}

impl ScoutError {
    pub fn unit_parse(message: impl Into<String>) -> Self {
        Self::UnitParse(message.into())
    }
}
