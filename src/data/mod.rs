//! Data acquisition: FRED client, synthetic fallback and the TTL cache.

pub mod cache;
pub mod fred;
pub mod synthetic;

pub use cache::{DataCache, SeriesKey, TtlCache};
pub use fred::{FredClient, SeriesFetch, SeriesFetcher};
