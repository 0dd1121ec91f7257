//! In-process TTL cache.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use stockfeed_types::Table;
use tokio::time::Instant;
use tracing::warn;

use crate::Fingerprint;

#[derive(Debug)]
struct Entry {
    table: Arc<Table>,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Thread-safe map from fingerprint to table with per-entry expiry.
///
/// Expiry uses the tokio clock, so paused-time tests can advance past a TTL
/// without sleeping. Expired entries are dropped lazily on lookup or by
/// [`MemoryCache::purge_expired`].
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<Fingerprint, Entry>>,
}

impl MemoryCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Fingerprint, Entry>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!("memory cache mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Returns the live table for a fingerprint.
    #[must_use]
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<Arc<Table>> {
        let now = Instant::now();
        let mut entries = self.lock();
        match entries.get(fingerprint) {
            Some(entry) if entry.is_live(now) => Some(Arc::clone(&entry.table)),
            Some(_) => {
                entries.remove(fingerprint);
                None
            }
            None => None,
        }
    }

    /// Stores a table that expires after `ttl`.
    ///
    /// A zero TTL removes any existing entry instead.
    pub fn insert(&self, fingerprint: Fingerprint, table: Arc<Table>, ttl: Duration) {
        let mut entries = self.lock();
        if ttl.is_zero() {
            entries.remove(&fingerprint);
            return;
        }
        let expires_at = Instant::now() + ttl;
        entries.insert(fingerprint, Entry { table, expires_at });
    }

    /// Returns the time left before an entry expires.
    #[must_use]
    pub fn remaining_ttl(&self, fingerprint: &Fingerprint) -> Option<Duration> {
        let now = Instant::now();
        self.lock()
            .get(fingerprint)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.expires_at - now)
    }

    /// Removes one entry, returning whether it was present.
    pub fn remove(&self, fingerprint: &Fingerprint) -> bool {
        self.lock().remove(fingerprint).is_some()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Removes expired entries, returning how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        before - entries.len()
    }

    /// Returns the number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.lock().values().filter(|e| e.is_live(now)).count()
    }

    /// Returns true if no live entry exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockfeed_types::{Column, ColumnType, DataKind, Value};

    fn table(value: f64) -> Arc<Table> {
        Arc::new(
            Table::new(
                vec![Column::new("close", ColumnType::Float)],
                vec![vec![Value::Float(value)]],
                None,
            )
            .unwrap(),
        )
    }

    fn fp(n: u8) -> Fingerprint {
        Fingerprint::from_parts(DataKind::PriceHistory, &[n])
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = MemoryCache::new();
        cache.insert(fp(1), table(1.0), Duration::from_secs(60));

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(cache.get(&fp(1)).unwrap().len(), 1);
        assert_eq!(cache.remaining_ttl(&fp(1)), Some(Duration::from_secs(1)));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get(&fp(1)).is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let cache = MemoryCache::new();
        cache.insert(fp(1), table(1.0), Duration::from_secs(10));
        cache.insert(fp(2), table(2.0), Duration::from_secs(100));

        tokio::time::advance(Duration::from_secs(20)).await;
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&fp(2)).is_some());
    }

    #[test]
    fn test_remove_and_clear() {
        let cache = MemoryCache::new();
        cache.insert(fp(1), table(1.0), Duration::from_secs(10));
        cache.insert(fp(2), table(2.0), Duration::from_secs(10));

        assert!(cache.remove(&fp(1)));
        assert!(!cache.remove(&fp(1)));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_ttl_is_not_stored() {
        let cache = MemoryCache::new();
        cache.insert(fp(1), table(1.0), Duration::from_secs(10));
        cache.insert(fp(1), table(2.0), Duration::ZERO);
        assert!(cache.get(&fp(1)).is_none());
    }
}
