//! Capturing an AJAX response that a page action triggers.
//!
//! The page is clicked, then the session's network log is polled for a
//! response whose URL contains a keyword. Polling is bounded by a round
//! count; reaching it is the only way to give up.

use std::time::Duration;

use anyhow::Result;
use serde_json::Value;
use tracing::{debug, warn};

use crate::browser::fetcher::{NetworkEntry, PageFetcher};

#[derive(Debug, Clone, PartialEq)]
pub enum InterceptState {
    Polling { round: u32 },
    Found(Value),
    Exhausted,
}

/// What a useful response looks like, for picking among several in one window
#[derive(Debug, Clone)]
pub struct ResponseShape {
    pub expected_fields: Vec<String>,
    /// Field holding the array of nested records
    pub records_field: String,
}

impl ResponseShape {
    pub fn new(expected_fields: &[&str], records_field: &str) -> Self {
        Self {
            expected_fields: expected_fields.iter().map(|f| f.to_string()).collect(),
            records_field: records_field.to_string(),
        }
    }

    /// Bare acknowledgements score 0, expected fields add 10, each record adds 100
    pub fn score(&self, response: &Value) -> u64 {
        let Some(object) = response.as_object() else {
            return match response.as_array() {
                Some(items) => items.len() as u64,
                None => 0,
            };
        };

        let field_hits = self
            .expected_fields
            .iter()
            .filter(|field| object.contains_key(field.as_str()))
            .count() as u64;

        let records = object
            .get(&self.records_field)
            .and_then(Value::as_array)
            .map_or(0, |items| items.len() as u64);

        field_hits * 10 + records * 100
    }
}

#[derive(Debug, Clone)]
pub struct AjaxInterceptor {
    pub url_keyword: String,
    pub max_rounds: u32,
    pub interval: Duration,
    pub shape: ResponseShape,
}

impl AjaxInterceptor {
    pub fn new(url_keyword: &str, shape: ResponseShape) -> Self {
        Self {
            url_keyword: url_keyword.to_string(),
            max_rounds: 10,
            interval: Duration::from_millis(500),
            shape,
        }
    }

    pub fn with_polling(mut self, max_rounds: u32, interval: Duration) -> Self {
        self.max_rounds = max_rounds;
        self.interval = interval;
        self
    }

    /// Run `trigger` and wait for the best matching JSON response
    pub async fn capture<F>(&self, fetcher: &dyn PageFetcher, trigger: F) -> Result<Option<Value>>
    where
        F: FnOnce() -> Result<()>,
    {
        // Entries from earlier actions must not be mistaken for this one
        let stale = fetcher.drain_network_log();
        debug!("Discarded {} stale network entries", stale.len());

        trigger()?;

        let mut state = InterceptState::Polling { round: 0 };
        loop {
            state = match state {
                InterceptState::Polling { round } if round >= self.max_rounds => {
                    InterceptState::Exhausted
                }
                InterceptState::Polling { round } => {
                    match self.best_response(fetcher.drain_network_log()) {
                        Some(value) => InterceptState::Found(value),
                        None => {
                            tokio::time::sleep(self.interval).await;
                            InterceptState::Polling { round: round + 1 }
                        }
                    }
                }
                InterceptState::Found(value) => return Ok(Some(value)),
                InterceptState::Exhausted => {
                    warn!(
                        "No '{}' response after {} rounds",
                        self.url_keyword, self.max_rounds
                    );
                    return Ok(None);
                }
            };
        }
    }

    fn best_response(&self, entries: Vec<NetworkEntry>) -> Option<Value> {
        entries
            .into_iter()
            .filter(|entry| entry.url.contains(&self.url_keyword))
            .filter_map(|entry| {
                let body = entry.body?;
                match serde_json::from_str::<Value>(&body) {
                    Ok(value) => Some(value),
                    Err(e) => {
                        warn!("Response from {} is not JSON: {}", entry.url, e);
                        None
                    }
                }
            })
            .max_by_key(|value| self.shape.score(value))
    }
}
