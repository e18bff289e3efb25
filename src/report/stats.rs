//! Descriptive statistics and trend comparison over a `SeriesTable`.

use chrono::NaiveDate;

use crate::domain::SeriesTable;

/// Rows in each trend window (one year of monthly data).
pub const TREND_WINDOW: usize = 12;

/// Current / mean / max / min of one column, ignoring missing cells.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub name: String,
    /// Last non-missing value.
    pub current: f64,
    pub mean: f64,
    pub max: f64,
    pub min: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    Up,
    Down,
    Flat,
}

impl TrendDirection {
    pub fn from_change(change: f64) -> Self {
        if change > 0.0 {
            TrendDirection::Up
        } else if change < 0.0 {
            TrendDirection::Down
        } else {
            TrendDirection::Flat
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            TrendDirection::Up => "↑",
            TrendDirection::Down => "↓",
            TrendDirection::Flat => "→",
        }
    }
}

/// Trailing-window mean versus the window before it.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendLine {
    pub name: String,
    pub recent_mean: f64,
    pub previous_mean: f64,
    pub change: f64,
    pub direction: TrendDirection,
}

/// Summaries for every column that has at least one value.
pub fn summarize(table: &SeriesTable) -> Vec<ColumnSummary> {
    table
        .columns()
        .iter()
        .enumerate()
        .filter_map(|(idx, name)| {
            let values: Vec<f64> = table.column(idx).into_iter().filter_map(|(_, v)| v).collect();
            summarize_values(name, &values)
        })
        .collect()
}

fn summarize_values(name: &str, values: &[f64]) -> Option<ColumnSummary> {
    let current = *values.last()?;
    let mean = mean(values)?;
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    Some(ColumnSummary {
        name: name.to_string(),
        current,
        mean,
        max,
        min,
        count: values.len(),
    })
}

/// Compare the last `TREND_WINDOW` rows with the window before them.
///
/// Needs at least one full window. With fewer than two full windows the
/// comparison falls back to the first `TREND_WINDOW` rows (which overlap the
/// recent window). Columns with no values in either window are skipped.
pub fn trend(table: &SeriesTable) -> Vec<TrendLine> {
    let n = table.len();
    if n < TREND_WINDOW {
        return Vec::new();
    }

    let recent = n - TREND_WINDOW..n;
    let previous = if n >= 2 * TREND_WINDOW {
        n - 2 * TREND_WINDOW..n - TREND_WINDOW
    } else {
        0..TREND_WINDOW
    };

    table
        .columns()
        .iter()
        .enumerate()
        .filter_map(|(idx, name)| {
            let column = table.column(idx);
            let window_mean = |range: std::ops::Range<usize>| {
                let values: Vec<f64> = column[range].iter().filter_map(|(_, v)| *v).collect();
                mean(&values)
            };
            let recent_mean = window_mean(recent.clone())?;
            let previous_mean = window_mean(previous.clone())?;
            let change = recent_mean - previous_mean;
            Some(TrendLine {
                name: name.clone(),
                recent_mean,
                previous_mean,
                change,
                direction: TrendDirection::from_change(change),
            })
        })
        .collect()
}

/// The last `n` rows, newest first.
pub fn recent_rows(table: &SeriesTable, n: usize) -> Vec<(NaiveDate, Vec<Option<f64>>)> {
    table
        .rows()
        .rev()
        .take(n)
        .map(|(date, values)| (date, values.to_vec()))
        .collect()
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Observation;

    fn month(i: u32) -> NaiveDate {
        let year = 2000 + (i / 12) as i32;
        NaiveDate::from_ymd_opt(year, i % 12 + 1, 1).unwrap()
    }

    fn table_from(values: &[Option<f64>]) -> SeriesTable {
        let obs = values
            .iter()
            .enumerate()
            .map(|(i, v)| Observation::new(month(i as u32), *v))
            .collect();
        SeriesTable::merge_columns([("A", obs)])
    }

    #[test]
    fn summary_ignores_missing_values() {
        let table = table_from(&[Some(1.0), None, Some(4.0), Some(2.0), None]);
        let summary = summarize(&table);
        assert_eq!(summary.len(), 1);
        let s = &summary[0];
        assert_eq!(s.name, "A");
        assert_eq!(s.current, 2.0);
        assert!((s.mean - 7.0 / 3.0).abs() < 1e-12);
        assert_eq!(s.max, 4.0);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.count, 3);
    }

    #[test]
    fn all_missing_column_has_no_summary() {
        let table = table_from(&[None, None]);
        assert!(summarize(&table).is_empty());
    }

    #[test]
    fn trend_needs_a_full_window() {
        let table = table_from(&vec![Some(1.0); 11]);
        assert!(trend(&table).is_empty());
    }

    #[test]
    fn trend_compares_consecutive_windows() {
        // 24 rows: first 12 at 1.0, last 12 at 3.0 -> change +2.
        let mut values = vec![Some(1.0); 12];
        values.extend(vec![Some(3.0); 12]);
        let lines = trend(&table_from(&values));
        assert_eq!(lines.len(), 1);
        assert!((lines[0].change - 2.0).abs() < 1e-12);
        assert_eq!(lines[0].direction, TrendDirection::Up);
    }

    #[test]
    fn trend_uses_previous_twelve_when_longer() {
        // 30 rows: rows 0..6 are noise, 6..18 at 5.0, 18..30 at 4.0.
        let mut values = vec![Some(100.0); 6];
        values.extend(vec![Some(5.0); 12]);
        values.extend(vec![Some(4.0); 12]);
        let lines = trend(&table_from(&values));
        assert!((lines[0].previous_mean - 5.0).abs() < 1e-12);
        assert!((lines[0].change + 1.0).abs() < 1e-12);
        assert_eq!(lines[0].direction, TrendDirection::Down);
    }

    #[test]
    fn short_history_falls_back_to_first_window() {
        // 18 rows: previous = rows 0..12, recent = rows 6..18.
        let mut values = vec![Some(1.0); 6];
        values.extend(vec![Some(3.0); 12]);
        let lines = trend(&table_from(&values));
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].previous_mean, 2.0);
        assert_eq!(lines[0].recent_mean, 3.0);
        assert_eq!(lines[0].change, 1.0);
        assert_eq!(lines[0].direction, TrendDirection::Up);
    }

    #[test]
    fn recent_rows_are_newest_first() {
        let table = table_from(&[Some(1.0), Some(2.0), Some(3.0)]);
        let rows = recent_rows(&table, 2);
        assert_eq!(rows, vec![(month(2), vec![Some(3.0)]), (month(1), vec![Some(2.0)])]);
    }
}
