pub mod columbus;
pub mod grove;
pub mod haus25;
pub mod html;
pub mod journal;
pub mod kre;
pub mod park;
pub mod traits;
pub mod types;
pub mod warren;

pub use columbus::ColumbusScraper;
pub use grove::GroveScraper;
pub use haus25::Haus25Scraper;
pub use journal::JournalSquaredScraper;
pub use kre::KreScraper;
pub use park::ParkAvenueScraper;
pub use traits::ScraperTrait;
pub use types::{Pacing, ScrapeContext};
pub use warren::WarrenAtYorkScraper;
