//! Per-fingerprint request de-duplication.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::warn;

use crate::Fingerprint;

/// Held by the one caller allowed to go upstream for a fingerprint.
///
/// Dropping the guard lets the next waiter in.
#[derive(Debug)]
pub struct FlightGuard {
    _guard: OwnedMutexGuard<()>,
}

/// Keyed async locks, one per fingerprint with callers in flight.
///
/// Locks are created on demand and forgotten once no caller holds or awaits
/// them.
#[derive(Debug, Default)]
pub struct SingleFlight {
    locks: Mutex<HashMap<Fingerprint, Weak<AsyncMutex<()>>>>,
}

impl SingleFlight {
    /// Creates an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_table(&self) -> MutexGuard<'_, HashMap<Fingerprint, Weak<AsyncMutex<()>>>> {
        self.locks.lock().unwrap_or_else(|poisoned| {
            warn!("single-flight mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Waits until no other caller holds the lock for `fingerprint`.
    pub async fn acquire(&self, fingerprint: Fingerprint) -> FlightGuard {
        let lock = {
            let mut locks = self.lock_table();
            locks.retain(|_, weak| weak.strong_count() > 0);
            if let Some(existing) = locks.get(&fingerprint).and_then(Weak::upgrade) {
                existing
            } else {
                let fresh = Arc::new(AsyncMutex::new(()));
                locks.insert(fingerprint, Arc::downgrade(&fresh));
                fresh
            }
        };
        FlightGuard {
            _guard: lock.lock_owned().await,
        }
    }

    /// Returns the number of fingerprints with callers in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.lock_table()
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}
