//! Small helpers over `scraper` shared by the HTML-based scrapers.

use anyhow::{anyhow, Result};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;

pub fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector '{}': {:?}", css, e))
}

/// Trimmed text of the first match under `scope`, empty if none
pub fn first_text(scope: ElementRef<'_>, css: &Selector) -> String {
    scope
        .select(css)
        .next()
        .map(text_of)
        .unwrap_or_default()
}

pub fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

pub fn first_attr(scope: ElementRef<'_>, css: &Selector, name: &str) -> Option<String> {
    scope
        .select(css)
        .next()
        .and_then(|el| el.value().attr(name))
        .map(str::to_string)
}

/// Drop markup, keeping the text and its line breaks
pub fn strip_tags(html: &str) -> String {
    static TAG: OnceLock<Regex> = OnceLock::new();
    let tag = TAG.get_or_init(|| Regex::new(r"<[^>]+>").expect("static regex"));
    tag.replace_all(html, "").into_owned()
}

pub fn root(document: &Html) -> ElementRef<'_> {
    document.root_element()
}

/// Join a possibly relative link onto `base`
pub fn absolute_url(base: &str, href: &str) -> String {
    if href.starts_with("http") {
        href.to_string()
    } else if href.starts_with('/') {
        format!("{}{}", base.trim_end_matches('/'), href)
    } else {
        format!("{}/{}", base.trim_end_matches('/'), href)
    }
}
