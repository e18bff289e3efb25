//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - resolves configuration (.env, API key, date window)
//! - runs the load pipeline
//! - prints the report or hands over to the TUI

use chrono::{Local, NaiveDate};
use clap::Parser;
use log::info;

use crate::cli::{Command, DashboardArgs, ShowArgs};
use crate::config::{load_api_key, plot_size, ApiKeyConfig};
use crate::data::FredClient;
use crate::domain::{default_start_date, min_date, parse_date};
use crate::error::AppError;
use crate::report::ReportView;

pub mod pipeline;

use pipeline::{default_source, Dashboard, DashboardRequest, LoadState, NO_DATA_MESSAGE};

/// Entry point for the `ccr` binary.
pub fn run() -> Result<(), AppError> {
    // We want `ccr` and `ccr --start 2000-01-01` to behave like `ccr tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Show(args) => {
            init_logging("warn");
            handle_show(args)
        }
        Command::Tui(args) => {
            // Anything on stderr would tear the alternate screen.
            init_logging("off");
            handle_tui(args)
        }
    }
}

/// Initialize `env_logger`; `RUST_LOG` overrides `default_filter`.
pub fn init_logging(default_filter: &str) {
    let env = env_logger::Env::default().default_filter_or(default_filter);
    let _ = env_logger::Builder::from_env(env).format_timestamp(None).try_init();
}

fn handle_show(args: ShowArgs) -> Result<(), AppError> {
    let api_key = load_api_key(args.dashboard.api_key.as_deref());
    info!("{}", api_key.source.describe());

    let today = Local::now().date_naive();
    let request = dashboard_request_from_args(&args.dashboard, &api_key, today)?;
    let plot = if args.no_plot {
        None
    } else {
        Some(plot_size(args.width, args.height)?)
    };

    let mut dashboard = Dashboard::new(FredClient::new()?);
    match dashboard.load(&request) {
        LoadState::Ready(data) => {
            let view = ReportView::build(&data);
            println!("{}", view.render(&data));
            if let Some((width, height)) = plot {
                println!("{}", crate::plot::render_ascii_plot(&data.table, width, height));
            }
            Ok(())
        }
        LoadState::Invalid(message) => Err(AppError::input(message)),
        LoadState::Empty { warnings } => {
            for warning in warnings {
                eprintln!("warning: {warning}");
            }
            Err(AppError::runtime(NO_DATA_MESSAGE))
        }
        LoadState::Idle => Ok(()),
    }
}

fn handle_tui(args: DashboardArgs) -> Result<(), AppError> {
    let api_key = load_api_key(args.api_key.as_deref());
    let today = Local::now().date_naive();
    let request = dashboard_request_from_args(&args, &api_key, today)?;
    crate::tui::run(request, api_key, today)
}

/// Build the initial request from flags, applying the date and source defaults.
///
/// Dates must fall inside `[min_date(), today]`. Ordering (start <= end) is
/// left to the pipeline so it reports through `LoadState::Invalid`.
pub fn dashboard_request_from_args(
    args: &DashboardArgs,
    api_key: &ApiKeyConfig,
    today: NaiveDate,
) -> Result<DashboardRequest, AppError> {
    let start = match &args.start {
        Some(raw) => parse_date(raw)?,
        None => default_start_date(),
    };
    let end = match &args.end {
        Some(raw) => parse_date(raw)?,
        None => today,
    };
    check_date_bounds("start", start, today)?;
    check_date_bounds("end", end, today)?;

    Ok(DashboardRequest {
        start,
        end,
        source: args.source.unwrap_or_else(|| default_source(api_key.is_present())),
        api_key: api_key.key.clone(),
    })
}

/// Reject dates outside the selectable window.
pub fn check_date_bounds(label: &str, date: NaiveDate, today: NaiveDate) -> Result<(), AppError> {
    let min = min_date();
    if date < min || date > today {
        return Err(AppError::input(format!(
            "The {label} date {date} must be between {min} and {today}."
        )));
    }
    Ok(())
}

/// Rewrite argv so `ccr` defaults to `ccr tui`.
///
/// Rules:
/// - `ccr`                      -> `ccr tui`
/// - `ccr --start 2000-01-01`   -> `ccr tui --start 2000-01-01`
/// - `ccr --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "show" | "tui");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    argv
}
