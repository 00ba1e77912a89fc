//! Runs a set of scrapers against one shared browser session.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tracing::{error, info, warn};

use crate::browser::{PageFetcher, SessionProvider};
use crate::config::ScoutConfig;
use crate::error::ScoutError;
use crate::models::RunResults;
use crate::normalize::{format_timestamp, Clock, SystemClock};
use crate::registry::ScraperRegistry;
use crate::results::ResultsManager;
use crate::scrapers::{Pacing, ScrapeContext, ScraperTrait};

const MAX_SESSION_BACKOFF: Duration = Duration::from_secs(8);

pub struct ScrapingRunner {
    registry: ScraperRegistry,
    provider: Arc<dyn SessionProvider>,
    results: ResultsManager,
    clock: Arc<dyn Clock>,
    pacing: Pacing,
    session_retries: u32,
    session_backoff: Duration,
}

impl ScrapingRunner {
    pub fn new(registry: ScraperRegistry, provider: Arc<dyn SessionProvider>, config: &ScoutConfig) -> Self {
        Self {
            registry,
            provider,
            results: ResultsManager::new(&config.output_dir).with_naming(config.naming),
            clock: Arc::new(SystemClock),
            pacing: Pacing::default(),
            session_retries: config.session_retries.max(1),
            session_backoff: config.session_backoff,
        }
    }

    /// Use `clock` for observed-at times and result file names
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.results = self.results.with_clock(Arc::clone(&clock));
        self.clock = clock;
        self
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn registry(&self) -> &ScraperRegistry {
        &self.registry
    }

    pub fn results(&self) -> &ResultsManager {
        &self.results
    }

    pub fn list_available_scrapers(&self) -> Vec<String> {
        self.registry.list_names()
    }

    /// Run the named scrapers (all registered ones for `None`).
    ///
    /// Unknown names are skipped with a warning. A failing scraper shows up
    /// as an empty list; only failing to get a browser session aborts the run.
    pub async fn run(&self, names: Option<&[String]>) -> Result<RunResults, ScoutError> {
        let selected = self.select(names);
        let mut results = RunResults::new();

        if selected.is_empty() {
            warn!("No valid scrapers to run");
            return Ok(results);
        }

        let session = self.acquire_session().await?;

        for (name, scraper) in &selected {
            let observed_at = format_timestamp(self.clock.now());
            let ctx = ScrapeContext::new(session.as_ref(), observed_at).with_pacing(self.pacing);

            info!("Running scraper: {}", name);
            let outcome = AssertUnwindSafe(scraper.scrape_units(&ctx)).catch_unwind().await;
            let units = match outcome {
                Ok(Ok(units)) => {
                    info!("{} found {} units", name, units.len());
                    units
                }
                Ok(Err(e)) => {
                    error!("Scraper {} failed: {:#}", name, e);
                    Vec::new()
                }
                Err(panic) => {
                    error!("Scraper {} panicked: {}", name, panic_message(panic.as_ref()));
                    Vec::new()
                }
            };
            results.insert(name.clone(), units);
        }

        drop(session);
        info!("Browser session closed");

        for (name, units) in &results {
            info!("{}: {} units", name, units.len());
        }
        Ok(results)
    }

    /// Run, then write the results with the default file name
    pub async fn run_and_save(&self, names: Option<&[String]>) -> Result<(RunResults, PathBuf), ScoutError> {
        let results = self.run(names).await?;
        let path = self.results.save(&results, None).await?;
        Ok((results, path))
    }

    fn select(&self, names: Option<&[String]>) -> Vec<(String, Arc<dyn ScraperTrait>)> {
        let all = self.registry.get_all();
        let Some(requested) = names else {
            return all.into_iter().collect();
        };

        for name in requested {
            if !all.contains_key(name) {
                warn!("Unknown scraper '{}', skipping", name);
            }
        }

        all.into_iter()
            .filter(|(name, _)| requested.contains(name))
            .collect()
    }

    async fn acquire_session(&self) -> Result<Box<dyn PageFetcher>, ScoutError> {
        let mut delay = self.session_backoff;
        let mut attempt = 1;

        loop {
            match self.provider.acquire() {
                Ok(session) => {
                    info!("Browser session ready");
                    return Ok(session);
                }
                Err(e) if attempt >= self.session_retries => {
                    error!("Could not start browser session after {} attempts: {:#}", attempt, e);
                    return Err(ScoutError::SessionAcquisition {
                        attempts: attempt,
                        source: e.into(),
                    });
                }
                Err(e) => {
                    warn!(
                        "Browser session attempt {}/{} failed: {:#}. Retrying in {:?}",
                        attempt, self.session_retries, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(MAX_SESSION_BACKOFF);
                    attempt += 1;
                }
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
