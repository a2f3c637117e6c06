/// Per-key async mutual exclusion
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Slot = Arc<AsyncMutex<()>>;

/// A set of async mutexes created on demand, one per key.
///
/// Slots are dropped again once nobody holds or waits on them.
#[derive(Default)]
pub struct KeyedLock {
    slots: Mutex<HashMap<String, Slot>>,
}

impl KeyedLock {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Wait until `key` is free and hold it until the guard drops
    pub async fn lock(&self, key: &str) -> KeyedGuard<'_> {
        let slot = Arc::clone(self.slots().entry(key.to_string()).or_default());
        let guard = slot.lock_owned().await;

        KeyedGuard {
            owner: self,
            key: key.to_string(),
            guard: Some(guard),
        }
    }

    /// Number of keys currently held or waited on
    pub fn active_keys(&self) -> usize {
        self.slots().len()
    }
}

pub struct KeyedGuard<'a> {
    owner: &'a KeyedLock,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl KeyedGuard<'_> {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for KeyedGuard<'_> {
    fn drop(&mut self) {
        // Release first so the slot's only remaining reference is the map's
        drop(self.guard.take());

        let mut slots = self.owner.slots();
        if slots
            .get(&self.key)
            .map_or(false, |slot| Arc::strong_count(slot) == 1)
        {
            slots.remove(&self.key);
        }
    }
}
