//! Per-identifier mutual exclusion.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use tokio::sync::OwnedMutexGuard;

/// A set of async mutexes keyed by entity identifier.
///
/// Work on the same identifier is serialized; different identifiers proceed in
/// parallel. Entries whose lock is no longer held or awaited are pruned on the
/// next acquisition.
#[derive(Clone, Default)]
pub struct KeyedLocks {
    inner: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl KeyedLocks {
    /// Waits for exclusive access to `key`.
    pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut map = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

            map.retain(|_, m| Arc::strong_count(m) > 1);

            map.entry(key.to_string()).or_default().clone()
        };

        mutex.lock_owned().await
    }

    /// Number of keys currently tracked.
    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }
}
