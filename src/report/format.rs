//! Formatted terminal output for a loaded table.
//!
//! We keep formatting code in one place so the pipeline stays free of
//! presentation details and output changes stay localized.

use chrono::NaiveDate;

use crate::app::pipeline::LoadedData;
use crate::report::stats::{ColumnSummary, TrendLine, TREND_WINDOW};

/// Full text report: header, statistics, trend and recent rows.
pub fn format_report(data: &LoadedData, summaries: &[ColumnSummary], trend: &[TrendLine], recent: &[(NaiveDate, Vec<Option<f64>>)]) -> String {
    let mut out = String::new();

    out.push_str("=== ccr - US Credit Card Rates ===\n");
    out.push_str(&format!("Source: {}\n", data.source.display_name()));
    out.push_str(&format!("Range: {}\n", data.range));
    if let (Some(first), Some(last)) = (data.table.first_date(), data.table.last_date()) {
        out.push_str(&format!("Rows: n={} | dates=[{first}, {last}]\n", data.table.len()));
    }
    for warning in &data.warnings {
        out.push_str(&format!("warning: {warning}\n"));
    }

    out.push_str("\nPeriod statistics:\n");
    out.push_str(&format_summary(summaries));

    out.push_str(&format!("\nTrend (last {TREND_WINDOW} rows vs previous {TREND_WINDOW}):\n"));
    out.push_str(&format_trend(trend));

    out.push_str("\nRecent data:\n");
    out.push_str(&format_recent_table(data.table.columns(), recent));

    out
}

pub fn format_summary(summaries: &[ColumnSummary]) -> String {
    if summaries.is_empty() {
        return "(no values)\n".to_string();
    }

    let mut out = String::new();
    out.push_str(&format!(
        "{:<24} {:>9} {:>9} {:>9} {:>9}\n",
        "metric", "current", "mean", "max", "min"
    ));
    for s in summaries {
        out.push_str(&format!(
            "{:<24} {:>9} {:>9} {:>9} {:>9}\n",
            truncate(&s.name, 24),
            fmt_pct(s.current),
            fmt_pct(s.mean),
            fmt_pct(s.max),
            fmt_pct(s.min),
        ));
    }
    out
}

pub fn format_trend(lines: &[TrendLine]) -> String {
    if lines.is_empty() {
        return format!("(needs at least {TREND_WINDOW} rows)\n");
    }

    let mut out = String::new();
    for line in lines {
        out.push_str(&format!(
            "{} {}: {:+.2}% change over the last {TREND_WINDOW} months\n",
            line.direction.arrow(),
            line.name,
            line.change
        ));
    }
    out
}

/// Table of dated rows; values as `x.xx%`, missing as `-`.
pub fn format_recent_table(columns: &[String], rows: &[(NaiveDate, Vec<Option<f64>>)]) -> String {
    let mut out = String::new();

    let mut header = format!("{:<10}", "date");
    let mut rule = format!("{:-<10}", "");
    for c in columns {
        header.push_str(&format!(" {:>22}", truncate(c, 22)));
        rule.push_str(&format!(" {:-<22}", ""));
    }
    out.push_str(header.trim_end());
    out.push('\n');
    out.push_str(rule.trim_end());
    out.push('\n');

    for (date, values) in rows {
        let mut line = format!("{date}");
        for v in values {
            let cell = v.map(fmt_pct).unwrap_or_else(|| "-".to_string());
            line.push_str(&format!(" {cell:>22}"));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out
}

pub fn fmt_pct(v: f64) -> String {
    format!("{v:.2}%")
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::stats::TrendDirection;

    #[test]
    fn recent_table_marks_missing_cells() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        let columns = vec!["A".to_string(), "B".to_string()];
        let txt = format_recent_table(&columns, &[(date, vec![Some(3.456), None])]);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("date"));
        assert!(lines[2].starts_with("2024-03-31"));
        assert!(lines[2].contains("3.46%"));
        assert!(lines[2].ends_with('-'));
    }

    #[test]
    fn trend_lines_show_signed_change() {
        let line = TrendLine {
            name: "A".to_string(),
            recent_mean: 3.0,
            previous_mean: 3.5,
            change: -0.5,
            direction: TrendDirection::Down,
        };
        assert_eq!(format_trend(&[line]), "↓ A: -0.50% change over the last 12 months\n");
        assert_eq!(format_trend(&[]), "(needs at least 12 rows)\n");
    }

    #[test]
    fn truncate_marks_cut_names() {
        assert_eq!(truncate("abcdef", 4), "abc.");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
