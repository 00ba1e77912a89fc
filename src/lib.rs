//! Apartment availability collection from residential building websites.
//!
//! Each building gets a scraper that turns its pages into [`UnitInfo`]
//! records. The [`ScrapingRunner`] drives a set of scrapers over one browser
//! session and [`ResultsManager`] writes the outcome as JSON.

pub mod browser;
pub mod config;
pub mod error;
pub mod models;
pub mod normalize;
pub mod registry;
pub mod results;
pub mod runner;
pub mod scrapers;

pub use config::ScoutConfig;
pub use error::ScoutError;
pub use models::{PriceInfo, RunResults, UnitInfo, UnitSet};
pub use registry::ScraperRegistry;
pub use results::{NamingMode, ResultsManager};
pub use runner::ScrapingRunner;
