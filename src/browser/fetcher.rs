use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use scraper::Html;

/// Snapshot of one element on the rendered page
#[derive(Debug, Clone, Default)]
pub struct PageElement {
    /// Rendered text (`innerText`), lines separated by `\n`
    pub text: String,
    pub inner_html: String,
    pub attributes: HashMap<String, String>,
}

impl PageElement {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Parse the element's children for selector lookups
    pub fn fragment(&self) -> Html {
        Html::parse_fragment(&self.inner_html)
    }
}

/// One response observed on the page's network
#[derive(Debug, Clone)]
pub struct NetworkEntry {
    pub url: String,
    pub status: u16,
    /// `None` when the browser could not hand over the body
    pub body: Option<String>,
}

/// Browser capability the scrapers drive.
///
/// Calls block until the browser answers or its own timeout fires. One
/// session serves one navigation at a time.
pub trait PageFetcher: Send + Sync {
    fn navigate(&self, url: &str) -> Result<()>;

    /// Wait until `selector` matches something on the page
    fn wait_for(&self, selector: &str, timeout: Duration) -> Result<()>;

    fn find_all(&self, selector: &str) -> Result<Vec<PageElement>>;

    /// Click the `index`-th element matching `selector`
    fn click(&self, selector: &str, index: usize) -> Result<()>;

    /// Full HTML of the current document
    fn content(&self) -> Result<String>;

    fn evaluate(&self, script: &str) -> Result<serde_json::Value>;

    /// Responses seen since the previous drain; the log is emptied
    fn drain_network_log(&self) -> Vec<NetworkEntry>;
}

/// Hands out the one browser session a run uses. Dropping the session releases it.
pub trait SessionProvider: Send + Sync {
    fn acquire(&self) -> Result<Box<dyn PageFetcher>>;
}
