//! Environment configuration: `.env` loading and API key resolution.

use crate::error::AppError;

/// Environment variables checked for the FRED API key, in priority order.
pub const API_KEY_VARS: [&str; 2] = ["API_FRED", "FRED_API_KEY"];

/// Where the API key in effect came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// `.env` file or process environment.
    Environment,
    /// `--api-key` flag or typed into the TUI.
    Manual,
    Missing,
}

impl KeySource {
    pub fn describe(self) -> &'static str {
        match self {
            KeySource::Environment => "FRED API key loaded from environment",
            KeySource::Manual => "FRED API key entered manually",
            KeySource::Missing => "FRED API key not found (set API_FRED in .env)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKeyConfig {
    pub key: Option<String>,
    pub source: KeySource,
}

impl ApiKeyConfig {
    pub fn missing() -> Self {
        Self {
            key: None,
            source: KeySource::Missing,
        }
    }

    pub fn is_present(&self) -> bool {
        self.key.is_some()
    }

    /// Replace the key with one typed by the user. A blank entry clears it.
    pub fn set_manual(&mut self, raw: &str) {
        match normalize_key(raw) {
            Some(key) => {
                self.key = Some(key);
                self.source = KeySource::Manual;
            }
            None => *self = Self::missing(),
        }
    }
}

/// Load `.env` (if any) and resolve the API key from the flag or environment.
pub fn load_api_key(flag: Option<&str>) -> ApiKeyConfig {
    dotenvy::dotenv().ok();
    resolve_api_key(flag, |name| std::env::var(name).ok())
}

/// Resolve the key: an explicit flag wins, then the environment variables.
pub fn resolve_api_key(flag: Option<&str>, lookup: impl Fn(&str) -> Option<String>) -> ApiKeyConfig {
    if let Some(key) = flag.and_then(normalize_key) {
        return ApiKeyConfig {
            key: Some(key),
            source: KeySource::Manual,
        };
    }

    API_KEY_VARS
        .iter()
        .find_map(|name| lookup(name).as_deref().and_then(normalize_key))
        .map(|key| ApiKeyConfig {
            key: Some(key),
            source: KeySource::Environment,
        })
        .unwrap_or_else(ApiKeyConfig::missing)
}

/// Blank keys count as absent.
pub fn normalize_key(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

const MAX_PLOT_WIDTH: usize = 1000;
const MAX_PLOT_HEIGHT: usize = 500;

/// Parse plot dimensions from flags, rejecting degenerate or oversized grids.
pub fn plot_size(width: usize, height: usize) -> Result<(usize, usize), AppError> {
    if width < 10 || height < 5 {
        return Err(AppError::input(format!(
            "Plot size {width}x{height} is too small (minimum 10x5)."
        )));
    }
    if width > MAX_PLOT_WIDTH || height > MAX_PLOT_HEIGHT {
        return Err(AppError::input(format!(
            "Plot size {width}x{height} is too large (maximum {MAX_PLOT_WIDTH}x{MAX_PLOT_HEIGHT})."
        )));
    }
    Ok((width, height))
}
