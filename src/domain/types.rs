//! Shared domain types.
//!
//! These types are intentionally small and `Clone` so they can be:
//!
//! - used as cache keys and cached values
//! - passed between the fetch/merge pipeline and the display layers

use chrono::NaiveDate;
use clap::ValueEnum;

use crate::error::AppError;

/// Default start of the requested window.
pub fn default_start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1990, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Earliest date the date inputs accept.
pub fn min_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1980, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// One of the two tracked FRED series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SeriesId {
    /// Delinquency rate on credit card loans, all commercial banks.
    Delinquency,
    /// Charge-off rate on credit card loans, all commercial banks.
    ChargeOff,
}

impl SeriesId {
    /// Request order. Also the column order of every `SeriesTable` we build.
    pub const ALL: [SeriesId; 2] = [SeriesId::Delinquency, SeriesId::ChargeOff];

    /// FRED series id.
    pub fn fred_id(self) -> &'static str {
        match self {
            SeriesId::Delinquency => "DRCCLACBS",
            SeriesId::ChargeOff => "CORCCACBS",
        }
    }

    /// Column name used in tables, charts and reports.
    pub fn display_name(self) -> &'static str {
        match self {
            SeriesId::Delinquency => "Delinquency Rate (%)",
            SeriesId::ChargeOff => "Charge-Off Rate (%)",
        }
    }
}

/// Where the table comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum DataSource {
    /// Live observations from the FRED API.
    Fred,
    /// Seeded synthetic data (demo mode, no network).
    Synthetic,
}

impl DataSource {
    pub fn display_name(self) -> &'static str {
        match self {
            DataSource::Fred => "FRED API",
            DataSource::Synthetic => "Synthetic data (demo)",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            DataSource::Fred => DataSource::Synthetic,
            DataSource::Synthetic => DataSource::Fred,
        }
    }
}

/// Inclusive calendar date range with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, AppError> {
        if start > end {
            return Err(AppError::input(
                "The start date must be on or before the end date.",
            ));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} → {}", self.start, self.end)
    }
}

/// A single dated value. `None` means the upstream value was missing or unparsable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

impl Observation {
    pub fn new(date: NaiveDate, value: Option<f64>) -> Self {
        Self { date, value }
    }
}

/// Parse a `YYYY-MM-DD` date (CLI flags and TUI inputs).
pub fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|e| AppError::input(format!("Invalid date '{trimmed}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn date_range_rejects_start_after_end() {
        let err = DateRange::new(ymd(2020, 3, 1), ymd(2020, 1, 1)).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
        assert!(err.message().contains("start date"));
    }

    #[test]
    fn date_range_allows_single_day() {
        let range = DateRange::new(ymd(2020, 1, 1), ymd(2020, 1, 1)).unwrap();
        assert!(range.contains(ymd(2020, 1, 1)));
        assert!(!range.contains(ymd(2020, 1, 2)));
    }

    #[test]
    fn parse_date_trims_and_reports_bad_input() {
        assert_eq!(parse_date(" 2021-06-30 ").unwrap(), ymd(2021, 6, 30));
        assert!(parse_date("2021/06/30").is_err());
    }

    #[test]
    fn series_ids_match_fred_codes() {
        assert_eq!(SeriesId::Delinquency.fred_id(), "DRCCLACBS");
        assert_eq!(SeriesId::ChargeOff.fred_id(), "CORCCACBS");
        assert_eq!(DataSource::Fred.toggle(), DataSource::Synthetic);
    }
}
