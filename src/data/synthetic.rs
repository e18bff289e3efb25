//! Seeded synthetic delinquency / charge-off data for demo mode.
//!
//! The generator is fully deterministic: the RNG seed is fixed, so the same
//! date range always produces the same table. That is what makes the output
//! safe to cache and easy to test.

use chrono::{Datelike, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::StandardNormal;

use crate::domain::{DateRange, SeriesId, SeriesTable};

const SEED: u64 = 42;

const DELINQUENCY_BASE: f64 = 3.5;
const DELINQUENCY_SIGMA: f64 = 1.5;
const CHARGE_OFF_BASE: f64 = 4.2;
const CHARGE_OFF_SIGMA: f64 = 1.8;

/// Years of the financial crisis and the added (delinquency, charge-off) levels.
const CRISIS_YEARS: std::ops::RangeInclusive<i32> = 2008..=2010;
const CRISIS_BUMP: (f64, f64) = (2.5, 3.0);
const PANDEMIC_YEAR: i32 = 2020;
const PANDEMIC_BUMP: (f64, f64) = (1.5, 2.0);

/// Lowest value either column may take.
pub const VALUE_FLOOR: f64 = 0.5;

/// Raw generator state before it becomes a table.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticDraws {
    pub dates: Vec<NaiveDate>,
    pub delinquency: Vec<f64>,
    pub charge_off: Vec<f64>,
}

/// Build the two-column synthetic table for `range`.
pub fn generate(range: &DateRange) -> SeriesTable {
    let mut draws = baseline_draws(range);
    apply_stress(&mut draws);
    apply_floor(&mut draws);
    into_table(draws)
}

/// Month-end dates with base level plus Gaussian noise.
///
/// All delinquency draws are taken before any charge-off draw.
pub fn baseline_draws(range: &DateRange) -> SyntheticDraws {
    let dates = month_ends(range);
    let mut rng = StdRng::seed_from_u64(SEED);

    let delinquency = dates
        .iter()
        .map(|_| DELINQUENCY_BASE + DELINQUENCY_SIGMA * rng.sample::<f64, _>(StandardNormal))
        .collect();
    let charge_off = dates
        .iter()
        .map(|_| CHARGE_OFF_BASE + CHARGE_OFF_SIGMA * rng.sample::<f64, _>(StandardNormal))
        .collect();

    SyntheticDraws {
        dates,
        delinquency,
        charge_off,
    }
}

/// Raise both columns during the 2008-2010 crisis and in 2020.
pub fn apply_stress(draws: &mut SyntheticDraws) {
    for (i, date) in draws.dates.iter().enumerate() {
        let (d, c) = stress_bump(date.year());
        draws.delinquency[i] += d;
        draws.charge_off[i] += c;
    }
}

/// Clamp both columns to `VALUE_FLOOR`.
pub fn apply_floor(draws: &mut SyntheticDraws) {
    for v in draws.delinquency.iter_mut().chain(draws.charge_off.iter_mut()) {
        *v = v.max(VALUE_FLOOR);
    }
}

/// Additive (delinquency, charge-off) adjustment for a calendar year.
pub fn stress_bump(year: i32) -> (f64, f64) {
    if CRISIS_YEARS.contains(&year) {
        CRISIS_BUMP
    } else if year == PANDEMIC_YEAR {
        PANDEMIC_BUMP
    } else {
        (0.0, 0.0)
    }
}

/// Every calendar month-end inside the (inclusive) range.
pub fn month_ends(range: &DateRange) -> Vec<NaiveDate> {
    let mut out = Vec::new();
    let (mut year, mut month) = (range.start().year(), range.start().month());
    while let Some(end) = month_end(year, month) {
        if end > range.end() {
            break;
        }
        if end >= range.start() {
            out.push(end);
        }
        (year, month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    }
    out
}

fn month_end(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1).and_then(|d| d.pred_opt())
}

fn into_table(draws: SyntheticDraws) -> SeriesTable {
    let columns = SeriesId::ALL.iter().map(|s| s.display_name().to_string()).collect();
    let mut table = SeriesTable::new(columns);
    for ((date, d), c) in draws.dates.into_iter().zip(draws.delinquency).zip(draws.charge_off) {
        table.insert_row(date, vec![Some(d), Some(c)]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: (i32, u32, u32), end: (i32, u32, u32)) -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
        )
        .unwrap()
    }

    fn bits(table: &SeriesTable) -> Vec<(NaiveDate, Vec<Option<u64>>)> {
        table
            .rows()
            .map(|(d, row)| (d, row.iter().map(|v| v.map(f64::to_bits)).collect()))
            .collect()
    }

    #[test]
    fn generate_is_bit_identical_across_calls() {
        let r = range((1990, 1, 1), (2024, 6, 30));
        assert_eq!(bits(&generate(&r)), bits(&generate(&r)));
    }

    #[test]
    fn month_ends_are_inclusive_and_monthly() {
        let dates = month_ends(&range((2020, 1, 15), (2020, 4, 30)));
        let expected: Vec<NaiveDate> = [(2020, 1, 31), (2020, 2, 29), (2020, 3, 31), (2020, 4, 30)]
            .iter()
            .map(|&(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
            .collect();
        assert_eq!(dates, expected);

        let across_year = month_ends(&range((2019, 12, 31), (2020, 1, 31)));
        assert_eq!(across_year.len(), 2);
    }

    #[test]
    fn range_without_a_month_end_is_empty() {
        let table = generate(&range((2020, 1, 2), (2020, 1, 30)));
        assert!(table.is_empty());
        assert_eq!(table.columns().len(), 2);
    }

    #[test]
    fn values_never_drop_below_floor() {
        let table = generate(&range((1980, 1, 1), (2030, 12, 31)));
        assert_eq!(table.len(), 51 * 12);
        for (_, row) in table.rows() {
            for v in row {
                let v = v.expect("synthetic rows have no gaps");
                assert!(v >= VALUE_FLOOR, "value {v} below floor");
            }
        }
    }

    #[test]
    fn stress_windows_shift_the_baseline() {
        let r = range((2006, 1, 1), (2022, 12, 31));
        let raw = baseline_draws(&r);
        let table = generate(&r);

        let mut checked_crisis = 0;
        let mut checked_pandemic = 0;
        for (i, date) in raw.dates.iter().enumerate() {
            let (bump_d, bump_c) = stress_bump(date.year());
            let want_d = (raw.delinquency[i] + bump_d).max(VALUE_FLOOR);
            let want_c = (raw.charge_off[i] + bump_c).max(VALUE_FLOOR);
            assert_eq!(table.get(*date, 0), Some(want_d));
            assert_eq!(table.get(*date, 1), Some(want_c));

            match date.year() {
                2008..=2010 => {
                    assert_eq!((bump_d, bump_c), (2.5, 3.0));
                    checked_crisis += 1;
                }
                2020 => {
                    assert_eq!((bump_d, bump_c), (1.5, 2.0));
                    checked_pandemic += 1;
                }
                _ => assert_eq!((bump_d, bump_c), (0.0, 0.0)),
            }
        }
        assert_eq!(checked_crisis, 36);
        assert_eq!(checked_pandemic, 12);
    }

    #[test]
    fn columns_follow_series_order() {
        let table = generate(&range((2021, 1, 1), (2021, 12, 31)));
        assert_eq!(
            table.columns(),
            &[
                SeriesId::Delinquency.display_name().to_string(),
                SeriesId::ChargeOff.display_name().to_string(),
            ]
        );
    }
}
