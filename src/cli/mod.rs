//! Command-line parsing for the credit card rates dashboard.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the fetch/merge pipeline.

use clap::{Parser, Subcommand};

use crate::domain::DataSource;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "ccr", version, about = "US credit card delinquency and charge-off rates (FRED)")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print statistics, trend, recent rows and a plot, then exit.
    Show(ShowArgs),
    /// Launch the interactive TUI.
    ///
    /// This uses the same load pipeline as `ccr show`, but renders results
    /// in a terminal UI using Ratatui.
    Tui(DashboardArgs),
}

/// Options shared by every front-end.
#[derive(Debug, Parser, Clone)]
pub struct DashboardArgs {
    /// First date of the window (YYYY-MM-DD).
    #[arg(long, value_name = "DATE")]
    pub start: Option<String>,

    /// Last date of the window (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_name = "DATE")]
    pub end: Option<String>,

    /// Data source. Defaults to `fred` when an API key is configured, else `synthetic`.
    #[arg(long, value_enum)]
    pub source: Option<DataSource>,

    /// FRED API key (overrides API_FRED from the environment / .env).
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,
}

/// Options for the one-shot report.
#[derive(Debug, Parser, Clone)]
pub struct ShowArgs {
    #[command(flatten)]
    pub dashboard: DashboardArgs,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}
