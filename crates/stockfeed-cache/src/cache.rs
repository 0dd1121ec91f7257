//! Two-level cache: memory in front of an optional disk store.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use stockfeed_config::CacheSettings;
use stockfeed_types::{Result, Table};
use tracing::debug;

use crate::{DiskStore, Fingerprint, MemoryCache};

/// Fingerprint-addressed table cache with TTL expiry.
///
/// Lookups and stores hand out independent copies, so callers may mutate a
/// returned table without affecting later hits. There is no size bound;
/// entries leave only by expiry or explicit invalidation.
#[derive(Debug)]
pub struct Cache {
    memory: MemoryCache,
    disk: Option<DiskStore>,
    ttl: Duration,
    enabled: bool,
}

impl Cache {
    /// Creates a memory-only cache with a default TTL.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            memory: MemoryCache::new(),
            disk: None,
            ttl,
            enabled: true,
        }
    }

    /// Creates a cache that never holds anything.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new(Duration::ZERO)
        }
    }

    /// Mirrors entries to a disk store.
    #[must_use]
    pub fn with_disk(mut self, store: DiskStore) -> Self {
        self.disk = Some(store);
        self
    }

    /// Builds the cache described by settings.
    ///
    /// # Errors
    ///
    /// Returns an error if persistence is enabled and the cache directory
    /// cannot be created.
    pub fn from_settings(settings: &CacheSettings) -> Result<Self> {
        if !settings.enabled {
            return Ok(Self::disabled());
        }
        let cache = Self::new(settings.ttl());
        if !settings.persist {
            return Ok(cache);
        }
        let store = match &settings.dir {
            Some(dir) => DiskStore::new(dir)?,
            None => DiskStore::with_default_dir()?,
        };
        Ok(cache.with_disk(store))
    }

    /// Returns the default TTL for new entries.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns false for a cache built with [`Cache::disabled`].
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the disk store, if persistence is on.
    #[must_use]
    pub const fn disk(&self) -> Option<&DiskStore> {
        self.disk.as_ref()
    }

    /// Returns a copy of the live table for a fingerprint.
    ///
    /// Memory is checked first; a disk hit is promoted into memory for the
    /// rest of its lifetime.
    #[must_use]
    pub fn lookup(&self, fingerprint: &Fingerprint) -> Option<Table> {
        if !self.enabled {
            return None;
        }
        if let Some(table) = self.memory.get(fingerprint) {
            debug!(%fingerprint, "memory cache hit");
            return Some(Table::clone(&table));
        }

        let entry = self.disk.as_ref()?.load(fingerprint)?;
        let remaining = entry.remaining(Utc::now())?;
        debug!(%fingerprint, ?remaining, "disk cache hit");
        let table = Arc::new(entry.table);
        self.memory.insert(*fingerprint, Arc::clone(&table), remaining);
        Some(Table::clone(&table))
    }

    /// Stores a copy of a table that expires after `ttl`.
    ///
    /// # Errors
    ///
    /// Returns an error if the disk store cannot be written. The memory
    /// entry is kept either way.
    pub fn store(&self, fingerprint: Fingerprint, table: &Table, ttl: Duration) -> Result<()> {
        if !self.enabled || ttl.is_zero() {
            return Ok(());
        }
        self.memory.insert(fingerprint, Arc::new(table.clone()), ttl);
        debug!(%fingerprint, rows = table.len(), ?ttl, "cached table");
        match &self.disk {
            Some(store) => store.save(&fingerprint, table, ttl),
            None => Ok(()),
        }
    }

    /// Drops one entry from every level, returning whether it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the disk file cannot be deleted.
    pub fn invalidate(&self, fingerprint: &Fingerprint) -> Result<bool> {
        let in_memory = self.memory.remove(fingerprint);
        let on_disk = match &self.disk {
            Some(store) => store.remove(fingerprint)?,
            None => false,
        };
        Ok(in_memory || on_disk)
    }

    /// Drops every entry from every level.
    ///
    /// # Errors
    ///
    /// Returns an error if disk files cannot be deleted.
    pub fn clear(&self) -> Result<()> {
        self.memory.clear();
        if let Some(store) = &self.disk {
            store.clear()?;
        }
        Ok(())
    }

    /// Drops expired entries from every level, returning how many went.
    ///
    /// # Errors
    ///
    /// Returns an error if the disk store cannot be listed.
    pub fn purge_expired(&self) -> Result<usize> {
        let mut removed = self.memory.purge_expired();
        if let Some(store) = &self.disk {
            removed += store.purge_expired()?;
        }
        Ok(removed)
    }

    /// Returns the number of live in-memory entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    /// Returns true if memory holds no live entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }
}
