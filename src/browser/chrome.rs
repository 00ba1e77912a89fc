use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use headless_chrome::{Browser, Element, LaunchOptions, Tab};
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::browser::fetcher::{NetworkEntry, PageElement, PageFetcher, SessionProvider};
use crate::config::ScoutConfig;

/// Page fetcher backed by a headless Chrome tab
pub struct ChromeSession {
    // Held so the Chrome process lives as long as the session
    _browser: Browser,
    tab: Arc<Tab>,
    network_log: Arc<Mutex<Vec<NetworkEntry>>>,
}

impl ChromeSession {
    /// Launch Chrome and open the working tab
    pub fn launch(headless: bool, page_timeout: Duration, capture_url_keywords: &[String]) -> Result<Self> {
        info!("Launching {} Chrome...", if headless { "headless" } else { "visible" });

        let options = LaunchOptions::default_builder()
            .headless(headless)
            .sandbox(false)
            .idle_browser_timeout(page_timeout * 4)
            .build()
            .context("Failed to build launch options")?;

        let browser = Browser::new(options).context("Failed to launch Chrome browser")?;
        let tab = browser.new_tab().context("Failed to open browser tab")?;
        tab.set_default_timeout(page_timeout);

        let network_log = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&network_log);
        let keywords = capture_url_keywords.to_vec();
        tab.register_response_handling(
            "network-log",
            Box::new(move |params, fetch_body| {
                let url = params.response.url.clone();
                if !is_watched(&url, &keywords) {
                    return;
                }
                let body = match fetch_body() {
                    Ok(body) => Some(body.body),
                    Err(e) => {
                        debug!("Could not read body for {}: {}", url, e);
                        None
                    }
                };
                log.lock().push(NetworkEntry {
                    url,
                    status: params.response.status as u16,
                    body,
                });
            }),
        )
        .context("Failed to enable network logging")?;

        Ok(Self {
            _browser: browser,
            tab,
            network_log,
        })
    }

    fn snapshot(element: &Element<'_>) -> Result<PageElement> {
        let text = element.get_inner_text()?;
        let inner_html = element
            .call_js_fn("function() { return this.innerHTML; }", vec![], false)?
            .value
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();

        // CDP returns attributes as a flat [name, value, name, value, ...] list
        let attributes = element
            .get_attributes()?
            .unwrap_or_default()
            .chunks(2)
            .filter_map(|pair| match pair {
                [name, value] => Some((name.clone(), value.clone())),
                _ => None,
            })
            .collect::<HashMap<_, _>>();

        Ok(PageElement {
            text,
            inner_html,
            attributes,
        })
    }
}

impl PageFetcher for ChromeSession {
    fn navigate(&self, url: &str) -> Result<()> {
        debug!("Navigating to {}", url);
        self.tab
            .navigate_to(url)
            .with_context(|| format!("Failed to navigate to {}", url))?;
        self.tab
            .wait_until_navigated()
            .with_context(|| format!("Timed out loading {}", url))?;
        Ok(())
    }

    fn wait_for(&self, selector: &str, timeout: Duration) -> Result<()> {
        self.tab
            .wait_for_element_with_custom_timeout(selector, timeout)
            .with_context(|| format!("'{}' did not appear within {:?}", selector, timeout))?;
        Ok(())
    }

    fn find_all(&self, selector: &str) -> Result<Vec<PageElement>> {
        // A selector with no matches is an empty page section, not a failure
        let elements = match self.tab.find_elements(selector) {
            Ok(elements) => elements,
            Err(e) => {
                debug!("No elements for '{}': {}", selector, e);
                return Ok(Vec::new());
            }
        };
        elements.iter().map(Self::snapshot).collect()
    }

    fn click(&self, selector: &str, index: usize) -> Result<()> {
        let elements = self
            .tab
            .find_elements(selector)
            .with_context(|| format!("Nothing to click for '{}'", selector))?;
        let element = elements
            .get(index)
            .ok_or_else(|| anyhow!("'{}' has no element at index {}", selector, index))?;
        element.click()?;
        Ok(())
    }

    fn content(&self) -> Result<String> {
        self.tab.get_content().context("Could not read page HTML")
    }

    fn evaluate(&self, script: &str) -> Result<Value> {
        let result = self.tab.evaluate(script, false)?;
        Ok(result.value.unwrap_or(Value::Null))
    }

    fn drain_network_log(&self) -> Vec<NetworkEntry> {
        std::mem::take(&mut *self.network_log.lock())
    }
}

/// Only responses from URLs containing a capture keyword are logged
fn is_watched(url: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| url.contains(k.as_str()))
}

/// Launches one [`ChromeSession`] per acquisition
pub struct ChromeSessionProvider {
    headless: bool,
    page_timeout: Duration,
    capture_url_keywords: Vec<String>,
}

impl ChromeSessionProvider {
    pub fn from_config(config: &ScoutConfig) -> Self {
        Self {
            headless: config.headless,
            page_timeout: config.page_timeout,
            capture_url_keywords: config.capture_url_keywords.clone(),
        }
    }
}

impl SessionProvider for ChromeSessionProvider {
    fn acquire(&self) -> Result<Box<dyn PageFetcher>> {
        match ChromeSession::launch(self.headless, self.page_timeout, &self.capture_url_keywords) {
            Ok(session) => Ok(Box::new(session)),
            Err(e) => {
                warn!("Chrome launch failed: {:#}", e);
                Err(e)
            }
        }
    }
}
