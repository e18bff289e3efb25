//! Date-indexed table of series columns.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::Observation;

/// One column per series, one row per date.
///
/// Rows are keyed by date (ascending). Every row has exactly one cell per
/// column; `None` marks a missing value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SeriesTable {
    columns: Vec<String>,
    rows: BTreeMap<NaiveDate, Vec<Option<f64>>>,
}

impl SeriesTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: BTreeMap::new(),
        }
    }

    /// Outer-join named columns on date.
    ///
    /// A date present in only some columns yields `None` in the others; no row
    /// is dropped. Column order follows the iterator order.
    pub fn merge_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<Observation>)>,
        S: Into<String>,
    {
        let (names, series): (Vec<String>, Vec<Vec<Observation>>) = columns
            .into_iter()
            .map(|(name, obs)| (name.into(), obs))
            .unzip();

        let width = names.len();
        let mut rows: BTreeMap<NaiveDate, Vec<Option<f64>>> = BTreeMap::new();
        for (idx, observations) in series.into_iter().enumerate() {
            for obs in observations {
                let row = rows.entry(obs.date).or_insert_with(|| vec![None; width]);
                row[idx] = obs.value;
            }
        }

        Self {
            columns: names,
            rows,
        }
    }

    /// Insert (or replace) a row. Short rows are padded with `None`.
    pub fn insert_row(&mut self, date: NaiveDate, mut values: Vec<Option<f64>>) {
        values.resize(self.columns.len(), None);
        self.rows.insert(date, values);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// A table with no rows or no columns has nothing to display.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    /// Rows in ascending date order.
    pub fn rows(&self) -> impl DoubleEndedIterator<Item = (NaiveDate, &[Option<f64>])> + '_ {
        self.rows.iter().map(|(d, v)| (*d, v.as_slice()))
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.keys().copied().collect()
    }

    /// All cells of one column in date order (including missing ones).
    pub fn column(&self, idx: usize) -> Vec<(NaiveDate, Option<f64>)> {
        self.rows
            .iter()
            .map(|(d, v)| (*d, v.get(idx).copied().flatten()))
            .collect()
    }

    pub fn get(&self, date: NaiveDate, idx: usize) -> Option<f64> {
        self.rows.get(&date).and_then(|v| v.get(idx).copied().flatten())
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.keys().next().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.keys().next_back().copied()
    }
}
