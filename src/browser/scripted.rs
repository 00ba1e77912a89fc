//! In-memory `PageFetcher` for driving scrapers in tests.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use anyhow::{anyhow, Result};
use parking_lot::Mutex;
use serde_json::Value;

use crate::browser::fetcher::{NetworkEntry, PageElement, PageFetcher};

/// Serves canned pages and elements; records every call it receives.
///
/// Elements registered with `elements_at` only match while that URL is
/// loaded and take precedence over ones registered with `elements`.
#[derive(Default)]
pub struct ScriptedFetcher {
    current: Mutex<String>,
    pages: HashMap<String, String>,
    elements: HashMap<String, Vec<PageElement>>,
    scoped_elements: HashMap<(String, String), Vec<PageElement>>,
    missing: HashSet<String>,
    failing_urls: HashSet<String>,
    click_responses: HashMap<(String, usize), Vec<NetworkEntry>>,
    pending: Mutex<Vec<NetworkEntry>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub fn elements(mut self, selector: &str, elements: Vec<PageElement>) -> Self {
        self.elements.insert(selector.to_string(), elements);
        self
    }

    pub fn elements_at(mut self, url: &str, selector: &str, elements: Vec<PageElement>) -> Self {
        self.scoped_elements
            .insert((url.to_string(), selector.to_string()), elements);
        self
    }

    /// `wait_for` and `click` on `selector` fail
    pub fn missing(mut self, selector: &str) -> Self {
        self.missing.insert(selector.to_string());
        self
    }

    pub fn failing(mut self, url: &str) -> Self {
        self.failing_urls.insert(url.to_string());
        self
    }

    /// Network entries that show up after clicking `selector` at `index`
    pub fn on_click(mut self, selector: &str, index: usize, entries: Vec<NetworkEntry>) -> Self {
        self.click_responses
            .insert((selector.to_string(), index), entries);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }
}

impl PageFetcher for ScriptedFetcher {
    fn navigate(&self, url: &str) -> Result<()> {
        self.record(format!("navigate {}", url));
        if self.failing_urls.contains(url) {
            return Err(anyhow!("net::ERR_CONNECTION_RESET at {}", url));
        }
        *self.current.lock() = url.to_string();
        Ok(())
    }

    fn wait_for(&self, selector: &str, timeout: Duration) -> Result<()> {
        self.record(format!("wait {}", selector));
        if self.missing.contains(selector) {
            return Err(anyhow!("'{}' did not appear within {:?}", selector, timeout));
        }
        Ok(())
    }

    fn find_all(&self, selector: &str) -> Result<Vec<PageElement>> {
        let url = self.current.lock().clone();
        let found = self
            .scoped_elements
            .get(&(url, selector.to_string()))
            .or_else(|| self.elements.get(selector))
            .cloned()
            .unwrap_or_default();
        Ok(found)
    }

    fn click(&self, selector: &str, index: usize) -> Result<()> {
        self.record(format!("click {} {}", selector, index));
        if self.missing.contains(selector) {
            return Err(anyhow!("nothing to click for '{}'", selector));
        }
        if let Some(entries) = self.click_responses.get(&(selector.to_string(), index)) {
            self.pending.lock().extend(entries.iter().cloned());
        }
        Ok(())
    }

    fn content(&self) -> Result<String> {
        let url = self.current.lock().clone();
        self.pages
            .get(&url)
            .cloned()
            .ok_or_else(|| anyhow!("no page scripted for {}", url))
    }

    fn evaluate(&self, script: &str) -> Result<Value> {
        self.record(format!("evaluate {}", script));
        Ok(Value::Null)
    }

    fn drain_network_log(&self) -> Vec<NetworkEntry> {
        std::mem::take(&mut *self.pending.lock())
    }
}
