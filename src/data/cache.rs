//! In-memory, time-to-live memoization for fetched and generated data.
//!
//! Each cached function gets its own typed `TtlCache`, keyed by that
//! function's arguments. Together they form the `(function, arguments)` key
//! space held by `DataCache`.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use log::debug;

use crate::data::fred::SeriesFetch;
use crate::domain::{DateRange, SeriesId, SeriesTable};

/// How long a cached result stays valid.
pub const DEFAULT_TTL: Duration = Duration::from_secs(6 * 60 * 60);

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// A map whose entries expire a fixed duration after insertion.
///
/// Expired entries are dropped on lookup of their key and swept on every
/// insert. The `*_at` variants take an explicit "now" so expiry can be
/// exercised without sleeping.
#[derive(Debug, Clone)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: HashMap<K, Entry<V>>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&mut self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    pub fn get_at(&mut self, key: &K, now: Instant) -> Option<V> {
        let fresh = self.entries.get(key).map(|e| now < e.expires_at)?;
        if fresh {
            self.entries.get(key).map(|e| e.value.clone())
        } else {
            self.entries.remove(key);
            None
        }
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.insert_at(key, value, Instant::now());
    }

    pub fn insert_at(&mut self, key: K, value: V, now: Instant) {
        self.entries.retain(|_, e| now < e.expires_at);
        let expires_at = now + self.ttl;
        self.entries.insert(key, Entry { value, expires_at });
    }

    /// Return the cached value, or compute, store and return it.
    pub fn get_or_insert_with(&mut self, key: K, compute: impl FnOnce() -> V) -> V {
        let now = Instant::now();
        if let Some(hit) = self.get_at(&key, now) {
            return hit;
        }
        let value = compute();
        self.insert_at(key, value.clone(), now);
        value
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of stored entries (expired ones included until the next sweep).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Arguments of one remote series fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesKey {
    pub series: SeriesId,
    pub range: DateRange,
    pub api_key: Option<String>,
}

/// All memoized data for the dashboard.
#[derive(Debug, Clone)]
pub struct DataCache {
    pub series: TtlCache<SeriesKey, SeriesFetch>,
    pub synthetic: TtlCache<DateRange, SeriesTable>,
}

impl DataCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            series: TtlCache::new(ttl),
            synthetic: TtlCache::new(ttl),
        }
    }

    /// Drop everything ("refresh now").
    pub fn clear(&mut self) {
        debug!(
            "clearing cache ({} series, {} synthetic)",
            self.series.len(),
            self.synthetic.len()
        );
        self.series.clear();
        self.synthetic.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty() && self.synthetic.is_empty()
    }
}

impl Default for DataCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_live_until_ttl() {
        let mut cache: TtlCache<&str, u32> = TtlCache::new(Duration::from_secs(60));
        let t0 = Instant::now();
        cache.insert_at("k", 7, t0);

        assert_eq!(cache.get_at(&"k", t0), Some(7));
        assert_eq!(cache.get_at(&"k", t0 + Duration::from_secs(59)), Some(7));
        assert_eq!(cache.get_at(&"k", t0 + Duration::from_secs(60)), None);
        // Expired entry was evicted by the lookup.
        assert!(cache.is_empty());
    }

    #[test]
    fn insert_sweeps_expired_entries_of_other_keys() {
        let ttl = Duration::from_secs(60);
        let mut cache: TtlCache<u32, u32> = TtlCache::new(ttl);
        let t0 = Instant::now();
        for i in 0..100u32 {
            cache.insert_at(i, i, t0 + ttl * 2 * i);
        }
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_at(&99, t0 + ttl * 198), Some(99));

        // Entries still inside their lifetime survive the sweep.
        cache.insert_at(100, 100, t0 + ttl * 198 + Duration::from_secs(30));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn keys_are_independent() {
        let mut cache: TtlCache<(u8, u8), &str> = TtlCache::new(DEFAULT_TTL);
        cache.insert((1, 2), "a");
        cache.insert((2, 1), "b");
        assert_eq!(cache.get(&(1, 2)), Some("a"));
        assert_eq!(cache.get(&(2, 1)), Some("b"));
        assert_eq!(cache.get(&(1, 1)), None);
    }

    #[test]
    fn get_or_insert_with_computes_once() {
        let mut cache: TtlCache<u8, u32> = TtlCache::new(DEFAULT_TTL);
        let mut calls = 0;
        let a = cache.get_or_insert_with(1, || {
            calls += 1;
            10
        });
        let b = cache.get_or_insert_with(1, || {
            calls += 1;
            20
        });
        assert_eq!((a, b, calls), (10, 10, 1));
    }

    #[test]
    fn clear_drops_both_caches() {
        let mut cache = DataCache::default();
        let range = DateRange::new(
            chrono::NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            chrono::NaiveDate::from_ymd_opt(2020, 12, 31).unwrap(),
        )
        .unwrap();
        cache.synthetic.insert(range, SeriesTable::default());
        cache.series.insert(
            SeriesKey {
                series: SeriesId::ChargeOff,
                range,
                api_key: None,
            },
            SeriesFetch::default(),
        );
        assert!(!cache.is_empty());
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.series.ttl(), DEFAULT_TTL);
    }
}
