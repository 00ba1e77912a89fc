use std::path::PathBuf;
use std::time::Duration;

use crate::results::NamingMode;

#[derive(Debug, Clone)]
pub struct ScoutConfig {
    pub output_dir: PathBuf,
    pub headless: bool,
    /// Per-page load/element timeout for the browser session
    pub page_timeout: Duration,
    /// Attempts at launching the browser before the run is abandoned
    pub session_retries: u32,
    pub session_backoff: Duration,
    pub naming: NamingMode,
    /// Response bodies are only captured for URLs containing one of these
    pub capture_url_keywords: Vec<String>,
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("results"),
            headless: true,
            page_timeout: Duration::from_secs(30),
            session_retries: 3,
            session_backoff: Duration::from_secs(1),
            naming: NamingMode::Standard,
            capture_url_keywords: vec!["admin-ajax.php".to_string()],
        }
    }
}

impl ScoutConfig {
    /// Defaults overridden by `LEASE_SCOUT_*` environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("LEASE_SCOUT_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        if let Ok(headless) = std::env::var("LEASE_SCOUT_HEADLESS") {
            config.headless = !matches!(headless.to_lowercase().as_str(), "0" | "false" | "no");
        }
        if let Some(retries) = env_number("LEASE_SCOUT_SESSION_RETRIES") {
            config.session_retries = retries.max(1) as u32;
        }
        if let Some(secs) = env_number("LEASE_SCOUT_PAGE_TIMEOUT_SECS") {
            config.page_timeout = Duration::from_secs(secs);
        }

        config
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_naming(mut self, naming: NamingMode) -> Self {
        self.naming = naming;
        self
    }

    pub fn with_session_retries(mut self, retries: u32, backoff: Duration) -> Self {
        self.session_retries = retries.max(1);
        self.session_backoff = backoff;
        self
    }
}

fn env_number(key: &str) -> Option<u64> {
    std::env::var(key).ok()?.trim().parse().ok()
}
