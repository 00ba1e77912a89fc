use std::time::Duration;

use rand::Rng;

use crate::browser::PageFetcher;

/// Randomized wait between page actions
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    pub base: Duration,
    pub jitter: Duration,
}

impl Pacing {
    pub fn none() -> Self {
        Self {
            base: Duration::ZERO,
            jitter: Duration::ZERO,
        }
    }

    pub fn delay(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.base;
        }
        let extra = rand::thread_rng().gen_range(0..=self.jitter.as_millis() as u64);
        self.base + Duration::from_millis(extra)
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(200),
            jitter: Duration::from_millis(1000),
        }
    }
}

/// Everything one scraper invocation gets from the runner
pub struct ScrapeContext<'a> {
    pub fetcher: &'a dyn PageFetcher,
    /// `date_fetched` for every price observed during this invocation
    pub observed_at: String,
    pub pacing: Pacing,
}

impl<'a> ScrapeContext<'a> {
    pub fn new(fetcher: &'a dyn PageFetcher, observed_at: impl Into<String>) -> Self {
        Self {
            fetcher,
            observed_at: observed_at.into(),
            pacing: Pacing::default(),
        }
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub async fn pause(&self) {
        let delay = self.pacing.delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    /// Wait that scales with pacing, for pages that load content late
    pub async fn settle(&self, duration: Duration) {
        if !self.pacing.base.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_stays_within_bounds() {
        let pacing = Pacing::default();
        for _ in 0..50 {
            let delay = pacing.delay();
            assert!(delay >= pacing.base);
            assert!(delay <= pacing.base + pacing.jitter);
        }
    }

    #[test]
    fn no_pacing_means_no_delay() {
        assert!(Pacing::none().delay().is_zero());
    }
}
