//! `cc-rates` library crate.
//!
//! The binary (`ccr`) is a thin wrapper around this library so that:
//!
//! - the load pipeline is testable without spawning processes or a network
//! - the report and the TUI share one source of data and statistics

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod plot;
pub mod report;
pub mod tui;
