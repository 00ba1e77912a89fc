//! Writing run results to timestamped JSON files and reading them back.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{error, info};

use crate::error::ScoutError;
use crate::models::RunResults;
use crate::normalize::{Clock, SystemClock};

/// File naming convention for result snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NamingMode {
    /// `results_YYYYMMDD_HHMMSS.json`
    #[default]
    Standard,
    /// `daily-results_YYYY-MM-DD_HH-MM-SS.json`
    Daily,
}

impl NamingMode {
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Standard => "results_",
            Self::Daily => "daily-results_",
        }
    }

    fn timestamp_format(self) -> &'static str {
        match self {
            Self::Standard => "%Y%m%d_%H%M%S",
            Self::Daily => "%Y-%m-%d_%H-%M-%S",
        }
    }
}

pub struct ResultsManager {
    output_dir: PathBuf,
    naming: NamingMode,
    clock: Arc<dyn Clock>,
}

impl ResultsManager {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            naming: NamingMode::Standard,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_naming(mut self, naming: NamingMode) -> Self {
        self.naming = naming;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn default_filename(&self) -> String {
        let stamp = self.clock.now().format(self.naming.timestamp_format());
        format!("{}{}.json", self.naming.prefix(), stamp)
    }

    /// Write `results` as pretty JSON and return the file path.
    ///
    /// A failed write is logged and returned; the run has nothing to show without it.
    pub async fn save(&self, results: &RunResults, filename: Option<&str>) -> Result<PathBuf, ScoutError> {
        let filename = filename.map_or_else(|| self.default_filename(), str::to_string);
        let output_path = self.output_dir.join(filename);

        let persistence = |source: std::io::Error| {
            error!("Could not save results to {}: {}", output_path.display(), source);
            ScoutError::Persistence {
                path: output_path.clone(),
                source,
            }
        };

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(persistence)?;

        let json = serde_json::to_string_pretty(&serialize_results(results))
            .map_err(|e| persistence(e.into()))?;
        tokio::fs::write(&output_path, json)
            .await
            .map_err(persistence)?;

        info!("Results saved to {}", output_path.display());
        Ok(output_path)
    }

    /// Parse a previously saved file from the output directory
    pub fn load(&self, filename: &str) -> Result<Value> {
        let path = self.output_dir.join(filename);
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("{} is not valid JSON", path.display()))
    }

    /// Result files in the output directory following the active naming mode
    pub fn list_results(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.output_dir) else {
            return Vec::new();
        };

        let prefix = self.naming.prefix();
        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.starts_with(prefix) && name.ends_with(".json"))
            .collect();
        names.sort();
        names
    }
}

/// JSON projection of a run: source name -> array of unit objects, in run order.
///
/// Keys starting with `_` are internal and never written.
pub fn serialize_results(results: &RunResults) -> IndexMap<String, Vec<Value>> {
    results
        .iter()
        .map(|(source, units)| {
            let units = units
                .iter()
                .filter_map(|unit| serde_json::to_value(unit).ok())
                .map(strip_private)
                .collect();
            (source.clone(), units)
        })
        .collect()
}

fn strip_private(value: Value) -> Value {
    match value {
        Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .filter(|(key, _)| !key.starts_with('_'))
                .map(|(key, value)| (key, strip_private(value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_private).collect()),
        other => other,
    }
}
