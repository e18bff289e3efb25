//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the tracked series and data-source enums (`SeriesId`, `DataSource`)
//! - validated date ranges and observations (`DateRange`, `Observation`)
//! - the merged, date-aligned table (`SeriesTable`)

pub mod table;
pub mod types;

pub use table::*;
pub use types::*;
