//! Load-once dataset fetching.
//!
//! The medals table, the country-code map and the event hierarchy are read
//! concurrently. Aggregation never starts before the load has completed; until
//! then the dataset is [`LoadState::Pending`] and every query answers empty.

use super::hierarchy::{build_hierarchy, EventNode};
use super::ingest::{ingest_csv, ingest_json, IngestResult, RowError};
use crate::models::MedalRecord;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Where the static input files live.
#[derive(Debug, Clone)]
pub struct DatasetPaths {
    /// Medals table (`.csv` or `.json`).
    pub medals: PathBuf,
    /// JSON object mapping country code to full name.
    pub country_codes: Option<PathBuf>,
    /// JSON event hierarchy; derived from the records when absent.
    pub hierarchy: Option<PathBuf>,
}

impl From<&crate::config::DataConfig> for DatasetPaths {
    fn from(config: &crate::config::DataConfig) -> Self {
        Self {
            medals: PathBuf::from(&config.medals),
            country_codes: config.country_codes.as_ref().map(PathBuf::from),
            hierarchy: config.hierarchy.as_ref().map(PathBuf::from),
        }
    }
}

/// Everything the aggregator works on, loaded once.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<MedalRecord>,
    pub country_names: HashMap<String, String>,
    pub hierarchy: EventNode,
    /// Rows dropped during ingestion.
    pub skipped: Vec<(usize, RowError)>,
}

impl Dataset {
    /// Assemble a dataset from already-parsed parts.
    pub fn new(
        records: Vec<MedalRecord>,
        mut country_names: HashMap<String, String>,
        hierarchy: Option<EventNode>,
    ) -> Self {
        // Fill names the code map lacks from the records themselves.
        for record in &records {
            if let Some(ref name) = record.country {
                country_names
                    .entry(record.country_code.clone())
                    .or_insert_with(|| name.clone());
            }
        }

        let hierarchy = hierarchy.unwrap_or_else(|| build_hierarchy(&records));

        Self {
            records,
            country_names,
            hierarchy,
            skipped: Vec::new(),
        }
    }

    /// Full name for a country code, falling back to the code itself.
    pub fn country_name<'a>(&'a self, code: &'a str) -> &'a str {
        self.country_names
            .get(code)
            .map(String::as_str)
            .unwrap_or(code)
    }

    pub fn is_known_country(&self, code: &str) -> bool {
        self.country_names.contains_key(code) || self.records.iter().any(|r| r.country_code == code)
    }
}

/// Dataset availability as seen by consumers.
#[derive(Debug, Clone, Default)]
pub enum LoadState {
    /// Not fetched yet; every query answers empty.
    #[default]
    Pending,
    Loaded(Arc<Dataset>),
}

impl LoadState {
    pub fn dataset(&self) -> Option<&Dataset> {
        match self {
            LoadState::Pending => None,
            LoadState::Loaded(dataset) => Some(dataset),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadState::Loaded(_))
    }
}

/// Read and parse every input file.
pub async fn load_dataset(paths: &DatasetPaths) -> Result<Dataset> {
    info!("Loading medals from: {}", paths.medals.display());

    let (ingested, country_names, hierarchy) = futures::try_join!(
        load_medals(&paths.medals),
        load_country_codes(paths.country_codes.as_deref()),
        load_hierarchy(paths.hierarchy.as_deref()),
    )?;

    if !ingested.skipped.is_empty() {
        warn!(
            "Skipped {} malformed medal rows in {}",
            ingested.skipped.len(),
            paths.medals.display()
        );
    }

    let mut dataset = Dataset::new(ingested.records, country_names, hierarchy);
    dataset.skipped = ingested.skipped;

    info!(
        "Loaded {} medal records for {} countries",
        dataset.records.len(),
        dataset.country_names.len()
    );
    Ok(dataset)
}

/// [`load_dataset`] with a spinner on stderr.
pub async fn load_with_progress(paths: &DatasetPaths, show_progress: bool) -> Result<LoadState> {
    let spinner = if show_progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(format!("Loading {}", paths.medals.display()));
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let result = load_dataset(paths).await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    Ok(LoadState::Loaded(Arc::new(result?)))
}

async fn load_medals(path: &Path) -> Result<IngestResult> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read medals file: {}", path.display()))?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        ingest_json(&data)
            .with_context(|| format!("Failed to parse medals file: {}", path.display()))
    } else {
        Ok(ingest_csv(&data))
    }
}

/// A missing or unreadable code map is not fatal; names fall back to codes.
async fn load_country_codes(path: Option<&Path>) -> Result<HashMap<String, String>> {
    let Some(path) = path else {
        return Ok(HashMap::new());
    };

    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) => {
            warn!("Country codes unavailable ({}): {}", path.display(), e);
            return Ok(HashMap::new());
        }
    };

    match serde_json::from_str::<HashMap<String, String>>(&content) {
        Ok(map) => {
            debug!("Loaded {} country names", map.len());
            Ok(map)
        }
        Err(e) => {
            warn!("Ignoring malformed country codes file {}: {}", path.display(), e);
            Ok(HashMap::new())
        }
    }
}

async fn load_hierarchy(path: Option<&Path>) -> Result<Option<EventNode>> {
    let Some(path) = path else {
        return Ok(None);
    };

    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read event hierarchy: {}", path.display()))?;
    let root: EventNode = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse event hierarchy: {}", path.display()))?;

    debug!("Loaded event hierarchy with {} disciplines", root.children.len());
    Ok(Some(root))
}
