//! Shared "load" pipeline used by both the `show` command and the TUI.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! validate range -> pick source -> fetch or generate (through the cache) -> merge
//!
//! The front-ends then only decide how to present a `LoadState`.

use chrono::NaiveDate;
use log::{debug, info};

use crate::data::cache::{DataCache, SeriesKey};
use crate::data::fred::{SeriesFetch, SeriesFetcher};
use crate::data::synthetic;
use crate::domain::{DataSource, DateRange, SeriesId, SeriesTable};

pub const MISSING_KEY_WARNING: &str = "FRED API key not provided. Using synthetic data for demonstration.";
pub const NO_DATA_MESSAGE: &str = "Could not load data. Check the configuration or try again.";

/// Everything one interaction asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardRequest {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub source: DataSource,
    pub api_key: Option<String>,
}

impl DashboardRequest {
    fn key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }
}

/// Source in effect after applying the missing-key policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceDecision {
    pub source: DataSource,
    /// FRED was requested but there is no key to call it with.
    pub fell_back: bool,
}

/// Source preselected for the user: FRED when a key is configured.
pub fn default_source(key_present: bool) -> DataSource {
    if key_present {
        DataSource::Fred
    } else {
        DataSource::Synthetic
    }
}

/// FRED without a key is redirected to synthetic data; everything else passes through.
pub fn resolve_source(requested: DataSource, key_present: bool) -> SourceDecision {
    match (requested, key_present) {
        (DataSource::Fred, false) => SourceDecision {
            source: DataSource::Synthetic,
            fell_back: true,
        },
        (source, _) => SourceDecision {
            source,
            fell_back: false,
        },
    }
}

/// A table ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedData {
    pub table: SeriesTable,
    pub range: DateRange,
    pub source: DataSource,
    pub warnings: Vec<String>,
}

/// Result of one interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    /// Nothing requested yet.
    Idle,
    /// Rejected before any fetch (e.g. start after end).
    Invalid(String),
    /// Every attempt came back empty.
    Empty { warnings: Vec<String> },
    Ready(LoadedData),
}

impl LoadState {
    pub fn loaded(&self) -> Option<&LoadedData> {
        match self {
            LoadState::Ready(data) => Some(data),
            _ => None,
        }
    }

    pub fn warnings(&self) -> &[String] {
        match self {
            LoadState::Ready(data) => &data.warnings,
            LoadState::Empty { warnings } => warnings,
            LoadState::Idle | LoadState::Invalid(_) => &[],
        }
    }
}

/// Owns the fetcher and the cache across interactions.
pub struct Dashboard<F> {
    fetcher: F,
    cache: DataCache,
}

impl<F: SeriesFetcher> Dashboard<F> {
    pub fn new(fetcher: F) -> Self {
        Self::with_cache(fetcher, DataCache::default())
    }

    pub fn with_cache(fetcher: F, cache: DataCache) -> Self {
        Self { fetcher, cache }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn cache(&self) -> &DataCache {
        &self.cache
    }

    /// Forget every cached result so the next load goes to the source again.
    pub fn refresh(&mut self) {
        self.cache.clear();
    }

    /// Run one interaction: validate, pick the source, load and merge.
    pub fn load(&mut self, request: &DashboardRequest) -> LoadState {
        let range = match DateRange::new(request.start, request.end) {
            Ok(range) => range,
            Err(err) => return LoadState::Invalid(err.message().to_string()),
        };

        let api_key = request.key();
        let decision = resolve_source(request.source, api_key.is_some());
        let mut warnings = Vec::new();
        if decision.fell_back {
            info!("no FRED API key, falling back to synthetic data");
            warnings.push(MISSING_KEY_WARNING.to_string());
        }

        let table = match decision.source {
            DataSource::Fred => self.load_remote(&range, api_key, &mut warnings),
            DataSource::Synthetic => self.load_synthetic(&range),
        };

        if table.is_empty() {
            return LoadState::Empty { warnings };
        }

        LoadState::Ready(LoadedData {
            table,
            range,
            source: decision.source,
            warnings,
        })
    }

    fn load_remote(&mut self, range: &DateRange, api_key: Option<&str>, warnings: &mut Vec<String>) -> SeriesTable {
        let mut columns = Vec::with_capacity(SeriesId::ALL.len());
        for series in SeriesId::ALL {
            let fetch = self.fetch_cached(series, range, api_key);
            if let Some(warning) = fetch.warning {
                warnings.push(warning);
            }
            if !fetch.observations.is_empty() {
                columns.push((series.display_name(), fetch.observations));
            }
        }
        SeriesTable::merge_columns(columns)
    }

    fn load_synthetic(&mut self, range: &DateRange) -> SeriesTable {
        self.cache
            .synthetic
            .get_or_insert_with(*range, || synthetic::generate(range))
    }

    fn fetch_cached(&mut self, series: SeriesId, range: &DateRange, api_key: Option<&str>) -> SeriesFetch {
        let key = SeriesKey {
            series,
            range: *range,
            api_key: api_key.map(str::to_string),
        };
        if let Some(hit) = self.cache.series.get(&key) {
            debug!("cache hit for {}", series.fred_id());
            return hit;
        }

        let fetch = self.fetcher.fetch_series(series, range, api_key);
        // Soft failures are retried on the next interaction.
        if fetch.warning.is_none() {
            self.cache.series.insert(key, fetch.clone());
        }
        fetch
    }
}
