use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::models::DetectionKey;

/// Per-(vessel, port) async locks serializing the read-modify-write on a
/// detection. Keys that are never contended never wait on each other.
pub struct KeyedLocks {
    locks: DashMap<DetectionKey, Arc<Mutex<()>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    pub async fn lock(&self, key: &DetectionKey) -> KeyGuard<'_> {
        let mutex = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        // map shard lock is released before awaiting the key's mutex
        let guard = mutex.lock_owned().await;

        KeyGuard {
            owner: self,
            key: key.clone(),
            guard: Some(guard),
        }
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    fn release(&self, key: &DetectionKey) {
        // Only the map and the releasing guard hold the Arc: nobody is waiting.
        self.locks
            .remove_if(key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

impl Default for KeyedLocks {
    fn default() -> Self {
        Self::new()
    }
}

/// Held for the duration of one create-or-update or close sequence.
pub struct KeyGuard<'a> {
    owner: &'a KeyedLocks,
    key: DetectionKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl KeyGuard<'_> {
    pub fn key(&self) -> &DetectionKey {
        &self.key
    }
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        // drop the mutex guard first so its Arc reference is gone
        self.guard.take();
        self.owner.release(&self.key);
    }
}
