//! Reporting utilities: statistics, trend and formatted terminal output.

pub mod format;
pub mod stats;

pub use format::*;
pub use stats::*;

use chrono::NaiveDate;

use crate::app::pipeline::LoadedData;

/// Rows shown in the "recent data" table.
pub const RECENT_ROWS: usize = 12;

/// Everything the display layers derive from a loaded table.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportView {
    pub summaries: Vec<ColumnSummary>,
    pub trend: Vec<TrendLine>,
    pub recent: Vec<(NaiveDate, Vec<Option<f64>>)>,
}

impl ReportView {
    pub fn build(data: &LoadedData) -> Self {
        Self {
            summaries: summarize(&data.table),
            trend: trend(&data.table),
            recent: recent_rows(&data.table, RECENT_ROWS),
        }
    }

    pub fn render(&self, data: &LoadedData) -> String {
        format_report(data, &self.summaries, &self.trend, &self.recent)
    }
}
