//! Per-key async mutual exclusion.
//!
//! Holders of the same key run one at a time; different keys never contend.
//! An entry lives in the map only while someone holds or awaits its lock.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`.
    ///
    /// Dropping the returned future before it resolves still releases the
    /// entry.
    pub async fn lock(&self, key: &str) -> KeyedGuard<'_> {
        let mutex = self
            .locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        // Declared before the await so it drops after the pending acquire.
        let registration = Registration {
            locks: &self.locks,
            key: key.to_string(),
        };
        let guard = mutex.lock_owned().await;
        KeyedGuard {
            _guard: guard,
            _registration: registration,
        }
    }

    /// Number of keys currently held or awaited.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Releases the key on drop.
pub struct KeyedGuard<'a> {
    // Field order matters: the mutex is released before the entry is checked.
    _guard: OwnedMutexGuard<()>,
    _registration: Registration<'a>,
}

/// Removes the map entry once the last holder or waiter is gone.
struct Registration<'a> {
    locks: &'a DashMap<String, Arc<Mutex<()>>>,
    key: String,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        // Only the map's own reference left means nobody else is waiting.
        self.locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
